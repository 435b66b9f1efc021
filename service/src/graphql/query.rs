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

//! Root of the GraphQL queries.

use crate::driver::Driver;
use crate::graphql::driver_error;
use crate::graphql::types::{OrderObject, UserObject};
use crate::model::{OrderId, UserId};
use apibench_core::driver::DriverError;
use async_graphql::{Context, Object, Result};

/// Root query object.
pub(crate) struct Query;

#[Object]
impl Query {
    /// Lists all users.
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let driver = ctx.data::<Driver>()?.clone();
        let users = driver.get_users().await.map_err(driver_error)?;
        Ok(users.into_iter().map(UserObject).collect())
    }

    /// Gets one user by its identifier, or nothing if it does not exist.
    async fn user(&self, ctx: &Context<'_>, id: i32) -> Result<Option<UserObject>> {
        let driver = ctx.data::<Driver>()?.clone();
        match driver.get_user(UserId::from(id)).await {
            Ok(user) => Ok(Some(UserObject(user))),
            Err(DriverError::NotFound(_)) => Ok(None),
            Err(e) => Err(driver_error(e)),
        }
    }

    /// Lists all orders.
    async fn orders(&self, ctx: &Context<'_>) -> Result<Vec<OrderObject>> {
        let driver = ctx.data::<Driver>()?.clone();
        let orders = driver.get_orders().await.map_err(driver_error)?;
        Ok(orders.into_iter().map(OrderObject).collect())
    }

    /// Gets one order by its identifier, or nothing if it does not exist.
    async fn order(&self, ctx: &Context<'_>, id: i32) -> Result<Option<OrderObject>> {
        let driver = ctx.data::<Driver>()?.clone();
        match driver.get_order(OrderId::from(id)).await {
            Ok(order) => Ok(Some(OrderObject(order))),
            Err(DriverError::NotFound(_)) => Ok(None),
            Err(e) => Err(driver_error(e)),
        }
    }

    /// Lists the orders placed by an existing user.
    async fn orders_by_user(&self, ctx: &Context<'_>, user_id: i32) -> Result<Vec<OrderObject>> {
        let driver = ctx.data::<Driver>()?.clone();
        let orders = driver.get_orders_by_user(UserId::from(user_id)).await.map_err(driver_error)?;
        Ok(orders.into_iter().map(OrderObject).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::graphql::testutils::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_users() {
        let context = TestContext::setup().await;

        assert_eq!(json!({"users": []}), context.query_ok("{ users { id } }").await);

        let alice = context.create_user("Alice", "alice@example.com").await;
        let bob = context.create_user("Bob", "bob@example.com").await;

        assert_eq!(
            json!({"users": [
                {
                    "id": alice.id().as_i32(),
                    "name": "Alice",
                    "email": "alice@example.com",
                    "createdAt": "2023-11-14T22:13:20Z",
                },
                {
                    "id": bob.id().as_i32(),
                    "name": "Bob",
                    "email": "bob@example.com",
                    "createdAt": "2023-11-14T22:13:20Z",
                },
            ]}),
            context.query_ok("{ users { id name email createdAt } }").await
        );
    }

    #[tokio::test]
    async fn test_user() {
        let context = TestContext::setup().await;

        let alice = context.create_user("Alice", "alice@example.com").await;

        let query = format!("{{ user(id: {}) {{ name email }} }}", alice.id());
        assert_eq!(
            json!({"user": {"name": "Alice", "email": "alice@example.com"}}),
            context.query_ok(&query).await
        );
    }

    #[tokio::test]
    async fn test_user_missing_is_null() {
        let context = TestContext::setup().await;

        assert_eq!(json!({"user": null}), context.query_ok("{ user(id: 5) { name } }").await);
    }

    #[tokio::test]
    async fn test_orders() {
        let context = TestContext::setup().await;

        let alice = context.create_user("Alice", "alice@example.com").await;
        let order = context.create_order(&alice, "Laptop", "1299.99").await;

        assert_eq!(
            json!({"orders": [{
                "id": order.id().as_i32(),
                "userId": alice.id().as_i32(),
                "productName": "Laptop",
                "price": "1299.99",
                "createdAt": "2023-11-15T10:00:00Z",
            }]}),
            context.query_ok("{ orders { id userId productName price createdAt } }").await
        );
    }

    #[tokio::test]
    async fn test_order() {
        let context = TestContext::setup().await;

        let alice = context.create_user("Alice", "alice@example.com").await;
        let order = context.create_order(&alice, "Cable", "0.5").await;

        let query = format!("{{ order(id: {}) {{ productName price }} }}", order.id());
        assert_eq!(
            json!({"order": {"productName": "Cable", "price": "0.50"}}),
            context.query_ok(&query).await
        );
        assert_eq!(json!({"order": null}), context.query_ok("{ order(id: 999) { id } }").await);
    }

    #[tokio::test]
    async fn test_orders_by_user() {
        let context = TestContext::setup().await;

        let alice = context.create_user("Alice", "alice@example.com").await;
        let bob = context.create_user("Bob", "bob@example.com").await;
        let order1 = context.create_order(&alice, "Laptop", "1299.99").await;
        context.create_order(&bob, "Mouse", "25").await;

        let query = format!("{{ ordersByUser(userId: {}) {{ id }} }}", alice.id());
        assert_eq!(
            json!({"ordersByUser": [{"id": order1.id().as_i32()}]}),
            context.query_ok(&query).await
        );
    }

    #[tokio::test]
    async fn test_orders_by_user_unknown_user() {
        let context = TestContext::setup().await;

        context
            .query_error(
                "{ ordersByUser(userId: 42) { id } }",
                "NOT_FOUND",
                "User with ID 42 not found",
            )
            .await;
    }
}
