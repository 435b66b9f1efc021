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

//! Root of the GraphQL mutations.

use crate::driver::Driver;
use crate::graphql::driver_error;
use crate::graphql::types::{OrderInput, OrderObject, UserInput, UserObject};
use crate::model::{OrderId, UserId};
use apibench_core::driver::DriverError;
use async_graphql::{Context, Object, Result};

/// Root mutation object.
pub(crate) struct Mutation;

#[Object]
impl Mutation {
    /// Creates a new user.
    async fn create_user(&self, ctx: &Context<'_>, input: UserInput) -> Result<UserObject> {
        let driver = ctx.data::<Driver>()?.clone();
        let user = driver.create_user(input.name, input.email).await.map_err(driver_error)?;
        Ok(UserObject(user))
    }

    /// Deletes a user and all of its orders.  Returns false if the user does not exist.
    async fn delete_user(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let driver = ctx.data::<Driver>()?.clone();
        match driver.delete_user(UserId::from(id)).await {
            Ok(()) => Ok(true),
            Err(DriverError::NotFound(_)) => Ok(false),
            Err(e) => Err(driver_error(e)),
        }
    }

    /// Creates a new order for an existing user.
    async fn create_order(&self, ctx: &Context<'_>, input: OrderInput) -> Result<OrderObject> {
        let driver = ctx.data::<Driver>()?.clone();
        let order = driver
            .create_order(UserId::from(input.user_id), input.product_name, &input.price.0)
            .await
            .map_err(driver_error)?;
        Ok(OrderObject(order))
    }

    /// Deletes an order.  Returns false if the order does not exist.
    async fn delete_order(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let driver = ctx.data::<Driver>()?.clone();
        match driver.delete_order(OrderId::from(id)).await {
            Ok(()) => Ok(true),
            Err(DriverError::NotFound(_)) => Ok(false),
            Err(e) => Err(driver_error(e)),
        }
    }
}
