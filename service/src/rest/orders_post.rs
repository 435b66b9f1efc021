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

//! API to create a new order.

use crate::driver::Driver;
use crate::model::{UserId, deserialize_price_text};
use apibench_core::rest::{JsonBody, RestError};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;

/// Message sent to the server to create an order.
#[derive(Deserialize)]
pub(crate) struct CreateOrderRequest {
    /// Identifier of the user placing the order.
    user_id: UserId,

    /// Name of the product being bought.
    product_name: String,

    /// Price of the product, as given by the client in either numeric or textual form.
    #[serde(deserialize_with = "deserialize_price_text")]
    price: String,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<impl IntoResponse, RestError> {
    let order = driver.create_order(request.user_id, request.product_name, &request.price).await?;
    Ok(Json(order))
}
