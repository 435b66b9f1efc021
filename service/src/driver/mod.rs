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

//! Business logic for the service.

use crate::model::{OrderId, UserId};
use apibench_core::clocks::Clock;
use apibench_core::db::{Db, DbError};
use apibench_core::driver::DriverError;
use std::sync::Arc;

mod orders;
#[cfg(test)]
pub(crate) mod testutils;
mod users;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the creation time of new entities.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(db: Arc<dyn Db + Send + Sync>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { db, clock }
    }
}

/// Constructs the error returned when the user `id` does not exist.
pub(crate) fn user_not_found(id: UserId) -> DriverError {
    DriverError::NotFound(format!("User with ID {} not found", id))
}

/// Constructs the error returned when the order `id` does not exist.
pub(crate) fn order_not_found(id: OrderId) -> DriverError {
    DriverError::NotFound(format!("Order with ID {} not found", id))
}

/// Converts a database error `e` into a driver error, describing a missing entity with `not_found`.
fn map_db_error<F>(e: DbError, not_found: F) -> DriverError
where
    F: FnOnce() -> DriverError,
{
    match e {
        DbError::NotFound => not_found(),
        e => e.into(),
    }
}
