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

//! API to create a new user.

use crate::driver::Driver;
use apibench_core::rest::{JsonBody, RestError};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

/// Message sent to the server to create a user.
#[derive(Deserialize, Serialize)]
pub(crate) struct CreateUserRequest {
    /// Full name of the new user.
    name: String,

    /// Email address of the new user.
    email: String,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, RestError> {
    let user = driver.create_user(request.name, request.email).await?;
    Ok(Json(user))
}
