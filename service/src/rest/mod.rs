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

//! Entry point to the REST server.

use crate::driver::Driver;
use apibench_core::rest::log_requests;
use axum::Router;
use serde::{Deserialize, Serialize};

mod order_delete;
mod order_get;
mod orders_get;
mod orders_post;
mod root_get;
#[cfg(test)]
mod testutils;
mod user_delete;
mod user_get;
mod user_orders_get;
mod users_get;
mod users_post;

/// Body of responses that only carry a human-readable message.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct MessageResponse {
    /// The message to return to the caller.
    pub(crate) message: String,
}

impl MessageResponse {
    /// Creates a new response carrying `message`.
    pub(crate) fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;

    let users = get(users_get::handler).post(users_post::handler);
    let orders = get(orders_get::handler).post(orders_post::handler);
    Router::new()
        .route("/", get(root_get::handler))
        .route("/users", users.clone())
        .route("/users/", users)
        .route("/users/:user_id", get(user_get::handler).delete(user_delete::handler))
        .route("/orders", orders.clone())
        .route("/orders/", orders)
        .route("/orders/user/:user_id", get(user_orders_get::handler))
        .route("/orders/:order_id", get(order_get::handler).delete(order_delete::handler))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(driver)
}
