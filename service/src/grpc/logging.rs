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

//! Request logging for the gRPC server.

use apibench_core::rest::REQUEST_ID_HEADER;
use futures::future::BoxFuture;
use http::HeaderValue;
use log::{info, warn};
use std::task::{Context, Poll};
use std::time::Instant;
use tonic::Code;
use tonic::transport::server::TcpConnectInfo;
use tower::{Layer, Service};
use uuid::Uuid;

/// Layer that wraps every gRPC call with `LoggingService`.
#[derive(Clone)]
pub(crate) struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService { inner }
    }
}

/// Service that assigns an identifier to every call and logs its start and completion.
#[derive(Clone)]
pub(crate) struct LoggingService<S> {
    /// The wrapped service.
    inner: S,
}

/// Extracts the status code of a call from the response headers.
///
/// Successful calls carry their status in the trailers, which are not available here, so a
/// missing status means the call succeeded.
fn response_code<B>(response: &http::Response<B>) -> Code {
    match response.headers().get("grpc-status") {
        Some(value) => Code::from_bytes(value.as_bytes()),
        None => Code::Ok,
    }
}

/// Returns the address of the peer that sent `req`, if known.
fn client_address<B>(req: &http::Request<B>) -> String {
    match req.extensions().get::<TcpConnectInfo>().and_then(TcpConnectInfo::remote_addr) {
        Some(addr) => addr.to_string(),
        None => "unknown".to_owned(),
    }
}

impl<S, B, ResBody> Service<http::Request<B>> for LoggingService<S>
where
    S: Service<http::Request<B>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        // The clone may not be ready, so keep the service that was polled for this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let method = req.uri().path().to_owned();
            let client = client_address(&req);
            info!(
                request_id = request_id.as_str(),
                method = method.as_str(),
                client = client.as_str();
                "gRPC request started: {} from {}", method, client
            );

            let start = Instant::now();
            let mut response = inner.call(req).await?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            let code = response_code(&response);
            match code {
                Code::Internal | Code::Unknown | Code::DataLoss | Code::Unavailable => warn!(
                    request_id = request_id.as_str(),
                    status_code = code as i32,
                    elapsed_ms = elapsed_ms;
                    "gRPC request failed: {} -> {:?}", method, code
                ),
                _ => info!(
                    request_id = request_id.as_str(),
                    status_code = code as i32,
                    elapsed_ms = elapsed_ms;
                    "gRPC request completed: {} -> {:?}", method, code
                ),
            }

            match HeaderValue::from_str(&request_id) {
                Ok(value) => {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Err(e) => warn!("Cannot attach request id {} to response: {}", request_id, e),
            }
            Ok(response)
        })
    }
}
