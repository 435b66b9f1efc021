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

//! Generic code for REST handlers.
//!
//! All services should implement an `app` function in this module that returns the `Router` for the
//! application.
//!
//! Every API should be put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This
//! may seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API should define a `route` method that
//! returns the HTTP method and the API path under test.  All integration tests within the module
//! then rely on `route` to obtain this information, ensuring that they all test the desired API.
//!
//! It is also useful for the tests in this layer to define a `TestContext` in a `testutils` module
//! that allows interacting with the database layer directly, using simplified types.

use crate::driver::DriverError;
use crate::model::ModelError;
use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;
use uuid::Uuid;

/// Name of the header that carries the identifier assigned to every request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Indicates that the request conflicts with the existing state, such as when trying to
    /// create an entity that already exists.
    #[error("{0}")]
    Conflict(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that the request could not be decoded, such as a malformed JSON payload or an
    /// unparseable path parameter.  Carries the status code chosen by the failed extractor.
    #[error("{1}")]
    MalformedRequest(http::StatusCode, String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = match self {
            RestError::Conflict(_) => http::StatusCode::CONFLICT,
            RestError::InternalError(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => http::StatusCode::BAD_REQUEST,
            RestError::MalformedRequest(status, _) => status,
            RestError::NotFound(_) => http::StatusCode::NOT_FOUND,
            RestError::PayloadNotEmpty => http::StatusCode::PAYLOAD_TOO_LARGE,
        };

        let response = ErrorResponse { message: self.to_string() };

        (status, Json(response)).into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Textual representation of the error message.
    pub message: String,
}

/// A JSON request body extractor that reports malformed payloads as `ErrorResponse`s.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(e) => Err(RestError::MalformedRequest(e.status(), e.body_text())),
        }
    }
}

/// A path parameters extractor that reports unparseable values as `ErrorResponse`s.
pub struct PathParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParams(value)),
            Err(e) => Err(RestError::MalformedRequest(e.status(), e.body_text())),
        }
    }
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that we
/// don't care about.  This future-proofs the service.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Identifier assigned to a request by `log_requests`, available to handlers as an extension.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Middleware that assigns an identifier to every request and logs its start and completion.
///
/// The identifier is stored in the request extensions as a `RequestId` and is returned to the
/// client in the `REQUEST_ID_HEADER` response header.  The address of the client is only known
/// when the server is started with `into_make_service_with_connect_info::<SocketAddr>`.
pub async fn log_requests(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let client = match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.to_string(),
        None => "unknown".to_owned(),
    };
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().unwrap_or("").to_owned();

    info!(
        request_id = request_id.as_str(),
        method = method.as_str(),
        path = path.as_str(),
        query = query.as_str(),
        client = client.as_str();
        "Request started: {} {} from {}", method, path, client
    );

    req.extensions_mut().insert(RequestId(request_id.clone()));
    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let status = response.status();
    if status.is_server_error() {
        warn!(
            request_id = request_id.as_str(),
            status_code = status.as_u16(),
            elapsed_ms = elapsed_ms;
            "Request failed: {} {} -> {}", method, path, status
        );
    } else {
        info!(
            request_id = request_id.as_str(),
            status_code = status.as_u16(),
            elapsed_ms = elapsed_ms;
            "Request completed: {} {} -> {}", method, path, status
        );
    }

    match HeaderValue::from_str(&request_id) {
        Ok(value) => {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Err(e) => warn!("Cannot attach request id {} to response: {}", request_id, e),
    }
    response
}

/// Common test code for the REST server.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::http::{self, HeaderName};
    use tower::util::ServiceExt;

    /// Maximum body size for testing purposes.
    const MAX_BODY_SIZE: usize = 64 * 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: axum::http::request::Builder,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            let request = self.builder.body(axum::body::Body::empty()).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a text payload.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
                .body(axum::body::Body::from(text.into()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }
    }

    /// Type alias for the complex type returned by the `oneshot` function.
    type HttpResponse = hyper::Response<axum::body::Body>;

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: HttpResponse,

        /// Expected HTTP status code in the response above.
        exp_status: http::StatusCode,
    }

    impl From<HttpResponse> for ResponseChecker {
        fn from(response: HttpResponse) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Sets the expected exit HTTP status to `status`.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Performs common validation operations on the response.
        pub fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Finishes checking the response and expects its body to be an `ErrorResponse` that
        /// matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let response: ErrorResponse = match serde_json::from_slice(&body) {
                Ok(response) => response,
                Err(e) => {
                    let body = String::from_utf8(body.to_vec()).unwrap();
                    panic!("Invalid error response due to {}; content was {}", e, body);
                }
            };
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&response.message),
                "Response content '{:?}' does not match re '{}'",
                response,
                exp_re
            );
        }

        /// Finishes checking the response and expects it to contain a valid JSON object of
        /// type `T`.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            serde_json::from_slice::<T>(&body).unwrap()
        }

        /// Finishes checking the response and expects its body to be valid UTF-8 and to match
        /// `exp_re`.
        pub async fn expect_text(self, exp_re: &str) {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(
                !body.contains("\"message\":"),
                "Use expect_error to validate errors wrapped in an ErrorResponse"
            );
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(re.is_match(&body), "Body content '{}' does not match re '{}'", body, exp_re);
        }

        /// Finishes checking the response and returns the response itself for out of band
        /// validation of properties not supported by the `ResponseChecker`.
        pub async fn take_response(self) -> HttpResponse {
            self.verify();

            self.response
        }
    }

    /// Generates a test to verify that an API that expects JSON fails when it gets something else.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                    .expect_error("Content-Type")
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("expected ident")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates a test to verify that an API that does not expect a payload fails as necessary.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("should not be here")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::routing::get;
    use tower::util::ServiceExt;

    /// Handler that echoes back the request id assigned by the middleware.
    async fn echo_request_id(Extension(request_id): Extension<RequestId>) -> String {
        request_id.0
    }

    /// Handler that always fails with an error of the given kind.
    async fn fail() -> RestResult<()> {
        Err(DriverError::AlreadyExists("User with email='a@example.com' already exists".to_owned())
            .into())
    }

    /// Payload accepted by `greet`.
    #[derive(Deserialize)]
    struct GreetRequest {
        /// Name of the entity to greet.
        name: String,
    }

    /// Handler that exercises the payload and path extractors.
    async fn greet(
        PathParams(count): PathParams<u8>,
        JsonBody(request): JsonBody<GreetRequest>,
    ) -> String {
        format!("{} {}", count, request.name)
    }

    /// Builds a router with the handlers above wrapped in the logging middleware.
    fn app() -> Router {
        Router::new()
            .route("/echo", get(echo_request_id))
            .route("/fail", get(fail))
            .route("/greet/:count", axum::routing::post(greet))
            .layer(axum::middleware::from_fn(log_requests))
    }

    /// Sends `body` with a JSON content type to `uri` and returns the status and error message.
    async fn post_json(uri: &str, body: &'static str) -> (http::StatusCode, String) {
        let request = Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        match serde_json::from_slice::<ErrorResponse>(&body) {
            Ok(response) => (status, response.message),
            Err(_) => (status, String::from_utf8(body.to_vec()).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_extractors_ok() {
        assert_eq!(
            (http::StatusCode::OK, "3 Alice".to_owned()),
            post_json("/greet/3", r#"{"name": "Alice"}"#).await
        );
    }

    #[tokio::test]
    async fn test_json_body_errors_are_error_responses() {
        let (status, message) = post_json("/greet/3", "not json").await;
        assert_eq!(http::StatusCode::BAD_REQUEST, status);
        assert!(message.contains("expected ident"), "Unexpected message: {}", message);

        let (status, message) = post_json("/greet/3", "{}").await;
        assert_eq!(http::StatusCode::UNPROCESSABLE_ENTITY, status);
        assert!(message.contains("missing field `name`"), "Unexpected message: {}", message);
    }

    #[tokio::test]
    async fn test_json_body_requires_content_type() {
        let request = Request::builder()
            .method(http::Method::POST)
            .uri("/greet/3")
            .body(Body::from(r#"{"name": "Alice"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(http::StatusCode::UNSUPPORTED_MEDIA_TYPE, response.status());
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(response.message.contains("Content-Type"));
    }

    #[tokio::test]
    async fn test_path_params_errors_are_error_responses() {
        let (status, message) = post_json("/greet/many", r#"{"name": "Alice"}"#).await;
        assert_eq!(http::StatusCode::BAD_REQUEST, status);
        assert!(message.contains("Cannot parse"), "Unexpected message: {}", message);
    }

    #[tokio::test]
    async fn test_log_requests_sets_request_id() {
        crate::driver::testutils::setup_logging();

        let request = Request::builder().uri("/echo?a=b").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(http::StatusCode::OK, response.status());

        let header =
            response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_owned();
        assert!(Uuid::parse_str(&header).is_ok());

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(header.as_bytes(), body.as_ref());
    }

    /// Sends a request to `/echo` and returns the key/value pairs of the record that logged its
    /// start.
    async fn request_started_kvs(connect_info: Option<SocketAddr>) -> Vec<(String, String)> {
        crate::driver::testutils::setup_logging();
        crate::driver::testutils::take_records();

        let mut request = Request::builder().uri("/echo").body(Body::empty()).unwrap();
        if let Some(addr) = connect_info {
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(http::StatusCode::OK, response.status());

        let mut records = crate::driver::testutils::take_records()
            .into_iter()
            .filter(|r| r.message.starts_with("Request started: GET /echo"))
            .collect::<Vec<_>>();
        assert_eq!(1, records.len());
        records.remove(0).kvs
    }

    #[tokio::test]
    async fn test_log_requests_logs_client_address() {
        let kvs = request_started_kvs(Some(SocketAddr::from(([127, 0, 0, 1], 4567)))).await;
        assert!(kvs.contains(&("client".to_owned(), "127.0.0.1:4567".to_owned())), "{:?}", kvs);
        assert!(kvs.contains(&("method".to_owned(), "GET".to_owned())), "{:?}", kvs);
        assert!(kvs.contains(&("path".to_owned(), "/echo".to_owned())), "{:?}", kvs);
    }

    #[tokio::test]
    async fn test_log_requests_unknown_client_address() {
        let kvs = request_started_kvs(None).await;
        assert!(kvs.contains(&("client".to_owned(), "unknown".to_owned())), "{:?}", kvs);
    }

    #[tokio::test]
    async fn test_log_requests_unique_ids() {
        let mut ids = vec![];
        for _ in 0..2 {
            let request = Request::builder().uri("/echo").body(Body::empty()).unwrap();
            let response = app().oneshot(request).await.unwrap();
            ids.push(response.headers().get(REQUEST_ID_HEADER).unwrap().clone());
        }
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn test_rest_error_into_response() {
        let request = Request::builder().uri("/fail").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(http::StatusCode::CONFLICT, response.status());
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!("User with email='a@example.com' already exists", response.message);
    }

    #[test]
    fn test_rest_error_from_driver_error() {
        assert_eq!(
            RestError::NotFound("User with ID 3 not found".to_owned()),
            DriverError::NotFound("User with ID 3 not found".to_owned()).into()
        );
        assert_eq!(
            RestError::InvalidRequest("bad".to_owned()),
            DriverError::InvalidInput("bad".to_owned()).into()
        );
        assert_eq!(
            RestError::InternalError("boom".to_owned()),
            DriverError::BackendError("boom".to_owned()).into()
        );
    }

    #[test]
    fn test_malformed_request_keeps_status() {
        let error =
            RestError::MalformedRequest(http::StatusCode::UNPROCESSABLE_ENTITY, "x".to_owned());
        assert_eq!("x", error.to_string());
        assert_eq!(http::StatusCode::UNPROCESSABLE_ENTITY, error.into_response().status());
    }
}
