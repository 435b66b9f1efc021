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

//! API to delete a user and all of its orders.

use crate::driver::Driver;
use crate::model::UserId;
use crate::rest::MessageResponse;
use apibench_core::rest::{EmptyBody, PathParams, RestError};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    PathParams(user_id): PathParams<UserId>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    driver.delete_user(user_id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use apibench_core::rest::testutils::*;
    use axum::http;

    fn route(user_id: i32) -> (http::Method, String) {
        (http::Method::DELETE, format!("/users/{}", user_id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let alice = context.create_user("Alice", "alice@example.com").await;
        let bob = context.create_user("Bob", "bob@example.com").await;
        context.create_order(&alice, "Laptop", "1299.99").await;
        let order = context.create_order(&bob, "Mouse", "25").await;

        let response = OneShotBuilder::new(context.app(), route(alice.id().as_i32()))
            .send_empty()
            .await
            .expect_json::<MessageResponse>()
            .await;
        assert_eq!("User deleted successfully", response.message);

        assert_eq!(vec![bob], context.get_users().await);
        assert_eq!(vec![order], context.get_orders().await);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(9))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("User with ID 9 not found")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(1));
}
