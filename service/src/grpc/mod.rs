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

//! Entry point to the gRPC server.

use crate::driver::Driver;
use crate::model::{Order, User};
use apibench_core::driver::DriverError;
use std::error::Error;
use std::future::Future;
use std::net::SocketAddr;
use time::OffsetDateTime;
use tonic::Status;
use tonic::transport::Server;

mod logging;
use logging::LoggingLayer;
mod orders;
use orders::OrderServiceImpl;
#[cfg(test)]
mod testutils;
mod users;
use users::UserServiceImpl;

/// Types generated from the protobuf definitions.
pub(crate) mod proto {
    #![allow(clippy::missing_docs_in_private_items, missing_docs, unused_qualifications)]

    tonic::include_proto!("usersorders");

    /// Encoded descriptors of all the services, for server reflection.
    pub(crate) const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("usersorders_descriptor");
}

use proto::order_service_server::OrderServiceServer;
use proto::user_service_server::UserServiceServer;

/// Converts a business logic error into a gRPC status.
pub(crate) fn driver_error_to_status(e: DriverError) -> Status {
    match e {
        DriverError::AlreadyExists(msg) => Status::already_exists(msg),
        DriverError::BackendError(msg) => Status::internal(msg),
        DriverError::InvalidInput(msg) => Status::invalid_argument(msg),
        DriverError::NotFound(msg) => Status::not_found(msg),
    }
}

/// Converts a timestamp into its protobuf representation.
fn timestamp_to_proto(ts: OffsetDateTime) -> prost_types::Timestamp {
    prost_types::Timestamp { seconds: ts.unix_timestamp(), nanos: ts.nanosecond() as i32 }
}

impl From<User> for proto::User {
    fn from(user: User) -> Self {
        proto::User {
            id: user.id().as_i32(),
            name: user.name().as_str().to_owned(),
            email: user.email().as_str().to_owned(),
            created_at: Some(timestamp_to_proto(*user.created_at())),
        }
    }
}

impl From<Order> for proto::Order {
    fn from(order: Order) -> Self {
        proto::Order {
            id: order.id().as_i32(),
            user_id: order.user_id().as_i32(),
            product_name: order.product_name().as_str().to_owned(),
            price: order.price().as_f64(),
            created_at: Some(timestamp_to_proto(*order.created_at())),
        }
    }
}

/// Serves the gRPC services backed by `driver` on `bind_addr` until `shutdown` completes.
///
/// Next to the application services, this exposes the standard health checking and server
/// reflection services.
pub(crate) async fn serve<F>(
    bind_addr: SocketAddr,
    driver: Driver,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = ()>,
{
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter.set_serving::<UserServiceServer<UserServiceImpl>>().await;
    health_reporter.set_serving::<OrderServiceServer<OrderServiceImpl>>().await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .layer(LoggingLayer)
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(UserServiceServer::new(UserServiceImpl::new(driver.clone())))
        .add_service(OrderServiceServer::new(OrderServiceImpl::new(driver)))
        .serve_with_shutdown(bind_addr, shutdown)
        .await?;
    Ok(())
}
