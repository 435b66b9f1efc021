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

//! Generic business logic for any service.
//!
//! Every service should implement its own `Driver` type holding the database and any other
//! in-memory state required by the app:
//!
//! ```rust
//! use apibench_core::db::Db;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! pub(crate) struct Driver {
//!     /// The database that the driver uses for persistence.
//!     db: Arc<dyn Db + Send + Sync>,
//!
//!     // ... other fields here ...
//! }
//! ```
//!
//! Every operation implemented in the `Driver` should take consume `self` because this is the
//! layer that coordinates multiple operations against the database inside a single transaction.
//! Consuming `self` prevents the caller from easily issuing multiple operations against the driver,
//! as this would require a clone and highlight an undesirable pattern.

use crate::db::DbError;
use crate::model::ModelError;
use log::info;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

/// Log target under which business events are recorded.
pub const BUSINESS_EVENT_TARGET: &str = "business_event";

/// Records a business event, such as the creation or the deletion of an entity.
///
/// Events are regular log records under the `BUSINESS_EVENT_TARGET` target carrying structured
/// key/value pairs, so they can be filtered out of the rest of the logs via `RUST_LOG`.
pub fn log_business_event(
    event_type: &str,
    entity_type: &str,
    entity_id: i32,
    details: serde_json::Value,
) {
    info!(
        target: BUSINESS_EVENT_TARGET,
        event_type = event_type,
        entity_type = entity_type,
        entity_id = entity_id,
        details:% = details;
        "Business event: {} {}", event_type, entity_type
    );
}

/// Test utilities to inspect the records sent to the logging facade.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::BUSINESS_EVENT_TARGET;
    use log::kv::{self, Key, Value, VisitSource};
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::RefCell;
    use std::sync::OnceLock;

    /// A log record captured during a test.
    #[derive(Debug, PartialEq)]
    pub struct CapturedRecord {
        /// Severity of the record.
        pub level: Level,

        /// Target the record was sent to.
        pub target: String,

        /// Formatted message of the record.
        pub message: String,

        /// Structured key/value pairs attached to the record, in emission order.
        pub kvs: Vec<(String, String)>,
    }

    thread_local! {
        /// Records emitted by the current thread and not yet consumed.
        static RECORDS: RefCell<Vec<CapturedRecord>> = const { RefCell::new(Vec::new()) };
    }

    /// Collects the key/value pairs of a record as strings.
    struct KeyValues(Vec<(String, String)>);

    impl<'kvs> VisitSource<'kvs> for KeyValues {
        fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
            self.0.push((key.as_str().to_owned(), value.to_string()));
            Ok(())
        }
    }

    /// Logger that keeps every record for later inspection and forwards them to `env_logger`.
    struct CapturingLogger {
        /// Logger that prints the records selected by `RUST_LOG`.
        inner: env_logger::Logger,
    }

    impl Log for CapturingLogger {
        fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            let mut kvs = KeyValues(vec![]);
            let _can_fail = record.key_values().visit(&mut kvs);
            let captured = CapturedRecord {
                level: record.level(),
                target: record.target().to_owned(),
                message: record.args().to_string(),
                kvs: kvs.0,
            };
            RECORDS.with_borrow_mut(|records| records.push(captured));

            if self.inner.matches(record) {
                self.inner.log(record);
            }
        }

        fn flush(&self) {
            self.inner.flush();
        }
    }

    /// Installs the test logger, which is a no-op if it is already installed.
    ///
    /// Records at `INFO` and above are always captured regardless of `RUST_LOG`.
    pub fn setup_logging() {
        static LOGGER: OnceLock<CapturingLogger> = OnceLock::new();

        let mut created = false;
        let logger = LOGGER.get_or_init(|| {
            created = true;
            CapturingLogger { inner: env_logger::Builder::from_default_env().is_test(true).build() }
        });
        if created && log::set_logger(logger).is_ok() {
            log::set_max_level(logger.inner.filter().max(LevelFilter::Info));
        }
    }

    /// Consumes and returns all records emitted so far by the current thread.
    pub fn take_records() -> Vec<CapturedRecord> {
        RECORDS.with_borrow_mut(std::mem::take)
    }

    /// Consumes all records emitted so far by the current thread and returns the business events
    /// among them.
    pub fn take_business_events() -> Vec<CapturedRecord> {
        take_records().into_iter().filter(|r| r.target == BUSINESS_EVENT_TARGET).collect()
    }
}
