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

//! Users and orders service that exposes the same data through REST, GraphQL and gRPC.
//!
//! All transports share the same business logic and persistence layers so that they behave
//! identically and only differ in how requests and responses are encoded.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use apibench_core::clocks::{Clock, SystemClock};
use apibench_core::db::Db;
#[cfg(feature = "postgres")]
use apibench_core::db::postgres::{PostgresDb, PostgresOptions};
use apibench_core::env::get_optional_var;
use log::info;
#[cfg(feature = "postgres")]
use log::warn;
use std::error::Error;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

pub mod db;
pub(crate) mod driver;
use driver::Driver;
mod graphql;
mod grpc;
pub(crate) mod model;
mod rest;

/// Creates the business logic layer on top of `db` using the system clock.
fn new_driver(db: Arc<dyn Db + Send + Sync>) -> Driver {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock::default());
    Driver::new(db, clock)
}

/// Serves `app` over HTTP on `bind_addr` until `shutdown` completes.
async fn serve_http<F>(
    bind_addr: SocketAddr,
    app: axum::Router,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Instantiates all resources to serve the REST API on `bind_addr` until `shutdown` completes.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose
/// many crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve_rest<F>(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = rest::app(new_driver(db));
    serve_http(bind_addr.into(), app, shutdown).await
}

/// Instantiates all resources to serve the GraphQL API on `bind_addr` until `shutdown`
/// completes.
pub async fn serve_graphql<F>(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = graphql::app(new_driver(db));
    serve_http(bind_addr.into(), app, shutdown).await
}

/// Instantiates all resources to serve the gRPC API on `bind_addr` until `shutdown` completes.
pub async fn serve_grpc<F>(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_addr = bind_addr.into();
    info!("Listening on {}", bind_addr);
    grpc::serve(bind_addr, new_driver(db), shutdown).await
}

/// The transports through which the service can be exposed, one per binary.
#[derive(Clone, Copy, Debug)]
pub enum Transport {
    /// JSON over HTTP.
    Rest,

    /// GraphQL over HTTP.
    GraphQl,

    /// gRPC over HTTP/2.
    Grpc,
}

impl Transport {
    /// Returns the prefix of the environment variables that configure this transport.
    fn env_prefix(self) -> &'static str {
        match self {
            Transport::Rest => "REST_API",
            Transport::GraphQl => "GRAPHQL_API",
            Transport::Grpc => "GRPC_API",
        }
    }

    /// Returns the port to listen on when none is configured.
    fn default_port(self) -> u16 {
        match self {
            Transport::Rest => 8000,
            Transport::GraphQl => 8001,
            Transport::Grpc => 50051,
        }
    }

    /// Computes the address to listen on from the `<prefix>_PORT` environment variable.
    ///
    /// The server always binds to all interfaces.
    fn bind_addr(self) -> Result<SocketAddr, String> {
        let port = get_optional_var::<u16>(self.env_prefix(), "PORT")?;
        Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port.unwrap_or(self.default_port()))))
    }
}

/// Waits until the user asks the server to stop.
#[cfg(feature = "postgres")]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Cannot wait for the shutdown signal: {}", e);
            futures::future::pending::<()>().await
        }
    }
}

/// Connects to the PostgreSQL database configured via `POSTGRES_*` variables and serves
/// `transport` on it until the user asks the server to stop.
///
/// The database schema is created if it does not exist yet, and the connection pool is closed
/// once the server has stopped.
#[cfg(feature = "postgres")]
pub async fn run(transport: Transport) -> Result<(), Box<dyn Error>> {
    let bind_addr = transport.bind_addr()?;

    let db_opts = PostgresOptions::from_env("POSTGRES")?;
    let db: Arc<dyn Db + Send + Sync> = Arc::new(PostgresDb::connect(db_opts)?);
    db::init_schema(&mut db.ex().await?).await?;

    let result = match transport {
        Transport::Rest => serve_rest(bind_addr, db.clone(), shutdown_signal()).await,
        Transport::GraphQl => serve_graphql(bind_addr, db.clone(), shutdown_signal()).await,
        Transport::Grpc => serve_grpc(bind_addr, db.clone(), shutdown_signal()).await,
    };
    db.close().await;
    result
}
