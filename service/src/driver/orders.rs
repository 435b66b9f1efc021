// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Operations on orders.

use crate::db;
use crate::driver::{Driver, map_db_error, order_not_found, user_not_found};
use crate::model::{Order, OrderId, Price, ProductName, UserId};
use apibench_core::driver::{DriverResult, log_business_event};
use serde_json::json;

impl Driver {
    /// Gets all existing orders.
    pub(crate) async fn get_orders(self) -> DriverResult<Vec<Order>> {
        let orders = db::get_orders(&mut self.db.ex().await?).await?;
        Ok(orders)
    }

    /// Gets the order identified by `id`.
    pub(crate) async fn get_order(self, id: OrderId) -> DriverResult<Order> {
        db::get_order(&mut self.db.ex().await?, id)
            .await
            .map_err(|e| map_db_error(e, || order_not_found(id)))
    }

    /// Gets all orders placed by the user `user_id`, which must exist.
    pub(crate) async fn get_orders_by_user(self, user_id: UserId) -> DriverResult<Vec<Order>> {
        let mut tx = self.db.begin().await?;
        db::get_user(tx.ex(), user_id)
            .await
            .map_err(|e| map_db_error(e, || user_not_found(user_id)))?;
        let orders = db::get_orders_by_user(tx.ex(), user_id).await?;
        tx.commit().await?;
        Ok(orders)
    }

    /// Creates a new order for the user `user_id` from an untrusted `product_name` and the
    /// textual representation of its `price`.
    pub(crate) async fn create_order(
        self,
        user_id: UserId,
        product_name: String,
        price: &str,
    ) -> DriverResult<Order> {
        let mut tx = self.db.begin().await?;
        db::get_user(tx.ex(), user_id)
            .await
            .map_err(|e| map_db_error(e, || user_not_found(user_id)))?;

        let price = Price::parse(price)?;
        let product_name = ProductName::new(product_name)?;

        let now = self.clock.now_utc();
        let order = db::create_order(tx.ex(), user_id, product_name, price, now)
            .await
            .map_err(|e| map_db_error(e, || user_not_found(user_id)))?;
        tx.commit().await?;

        log_business_event(
            "created",
            "order",
            order.id().as_i32(),
            json!({
                "user_id": user_id.as_i32(),
                "product_name": order.product_name().as_str(),
                "price": order.price().to_string(),
            }),
        );
        Ok(order)
    }

    /// Deletes the order identified by `id`.
    pub(crate) async fn delete_order(self, id: OrderId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        let order =
            db::get_order(tx.ex(), id).await.map_err(|e| map_db_error(e, || order_not_found(id)))?;
        db::delete_order(tx.ex(), id).await.map_err(|e| map_db_error(e, || order_not_found(id)))?;
        tx.commit().await?;

        log_business_event(
            "deleted",
            "order",
            id.as_i32(),
            json!({
                "user_id": order.user_id().as_i32(),
                "product_name": order.product_name().as_str(),
            }),
        );
        Ok(())
    }
}
