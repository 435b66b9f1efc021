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

//! Entry point to the GraphQL server.

use crate::driver::Driver;
use apibench_core::driver::DriverError;
use apibench_core::rest::{EmptyBody, JsonBody, RequestId, log_requests};
use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptySubscription, ErrorExtensions, Schema};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::{Extension, Json, Router};
use log::{info, warn};
use serde_json::json;

mod mutation;
use mutation::Mutation;
mod query;
use query::Query;
#[cfg(test)]
mod testutils;
mod types;

/// Path under which the GraphQL endpoint is served.
const GRAPHQL_PATH: &str = "/graphql";

/// The complete GraphQL schema.
pub(crate) type ApiSchema = Schema<Query, Mutation, EmptySubscription>;

/// Creates the GraphQL schema backed by `driver`.
pub(crate) fn schema(driver: Driver) -> ApiSchema {
    Schema::build(Query, Mutation, EmptySubscription).data(driver).finish()
}

/// Converts a business logic error into a GraphQL error with a machine-readable `code`.
pub(crate) fn driver_error(e: DriverError) -> async_graphql::Error {
    let code = match e {
        DriverError::AlreadyExists(_) => "ALREADY_EXISTS",
        DriverError::BackendError(_) => "INTERNAL",
        DriverError::InvalidInput(_) => "INVALID_INPUT",
        DriverError::NotFound(_) => "NOT_FOUND",
    };
    async_graphql::Error::new(e.to_string()).extend_with(|_, ext| ext.set("code", code))
}

/// Handler for the root of the server, which describes the service.
async fn root_get(_: EmptyBody) -> impl IntoResponse {
    Json(json!({
        "message": "GraphQL API for comparative analysis of API technologies. \
            Go to /graphql to access the GraphQL playground",
    }))
}

/// Handler that serves the interactive GraphiQL IDE.
async fn graphiql_get(_: EmptyBody) -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// Handler that executes one GraphQL request.
async fn graphql_post(
    State(schema): State<ApiSchema>,
    Extension(request_id): Extension<RequestId>,
    JsonBody(request): JsonBody<async_graphql::Request>,
) -> impl IntoResponse {
    let operation = request.operation_name.clone().unwrap_or_else(|| "unnamed".to_owned());
    info!(
        request_id = request_id.0.as_str(),
        operation = operation.as_str();
        "Incoming GraphQL request: {}", operation
    );

    let response = schema.execute(request).await;
    if response.is_err() {
        let errors =
            response.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ");
        warn!(
            request_id = request_id.0.as_str(),
            operation = operation.as_str();
            "GraphQL errors: {}", errors
        );
    }
    Json(response)
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(root_get))
        .route(GRAPHQL_PATH, get(graphiql_get).post(graphql_post))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(schema(driver))
}
