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

//! Test utilities for the gRPC services.

use crate::db;
use crate::db::testutils::setup_sqlite;
use crate::driver::Driver;
use crate::model::*;
use apibench_core::clocks::Clock;
use apibench_core::clocks::testutils::MonotonicClock;
use apibench_core::db::Db;
use apibench_core::model::EmailAddress;
use std::sync::Arc;
use time::macros::datetime;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the services, for direct access to it.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver to back the services under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver against an in-memory database.
    pub(crate) async fn setup() -> Self {
        let db = setup_sqlite().await;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new(100000));
        let driver = Driver::new(db.clone(), clock);
        Self { db, driver }
    }

    /// Obtains a copy of the driver to instantiate a service.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Inserts a user directly into the database.
    pub(crate) async fn create_user(&self, name: &str, email: &str) -> User {
        db::create_user(
            &mut self.db.ex().await.unwrap(),
            UserName::new(name).unwrap(),
            EmailAddress::from(email),
            datetime!(2023-11-14 22:13:20 UTC),
        )
        .await
        .unwrap()
    }

    /// Inserts an order for `user` directly into the database.
    pub(crate) async fn create_order(&self, user: &User, product_name: &str, price: &str) -> Order {
        db::create_order(
            &mut self.db.ex().await.unwrap(),
            *user.id(),
            ProductName::new(product_name).unwrap(),
            Price::parse(price).unwrap(),
            datetime!(2023-11-15 10:00:00 UTC),
        )
        .await
        .unwrap()
    }

    /// Gets the identifiers of all users directly from the database.
    pub(crate) async fn user_ids(&self) -> Vec<i32> {
        let users = db::get_users(&mut self.db.ex().await.unwrap()).await.unwrap();
        users.into_iter().map(|u| u.id().as_i32()).collect()
    }

    /// Gets all orders directly from the database.
    pub(crate) async fn get_orders(&self) -> Vec<Order> {
        db::get_orders(&mut self.db.ex().await.unwrap()).await.unwrap()
    }
}
