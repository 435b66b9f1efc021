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

//! Test utilities for the business layer.

use crate::db::testutils::setup_sqlite;
use crate::driver::Driver;
use apibench_core::clocks::Clock;
use apibench_core::clocks::testutils::MonotonicClock;
use apibench_core::db::{Db, Executor};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver, for direct access to it.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver against an in-memory database.
    pub(crate) async fn setup() -> Self {
        let db = setup_sqlite().await;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new(100000));
        let driver = Driver::new(db.clone(), clock);
        apibench_core::driver::testutils::take_records();
        Self { db, driver }
    }

    /// Obtains a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Obtains a copy of the driver to issue one operation.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}

/// Consumes the business events emitted so far by the current thread and returns their
/// `(event_type, entity_type, entity_id, details)` fields.
pub(crate) fn take_business_events() -> Vec<(String, String, i32, serde_json::Value)> {
    apibench_core::driver::testutils::take_business_events()
        .into_iter()
        .map(|record| {
            assert_eq!(log::Level::Info, record.level);
            let field = |name: &str| {
                record.kvs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()).unwrap()
            };
            assert_eq!(
                format!("Business event: {} {}", field("event_type"), field("entity_type")),
                record.message
            );
            (
                field("event_type"),
                field("entity_type"),
                field("entity_id").parse().unwrap(),
                serde_json::from_str(&field("details")).unwrap(),
            )
        })
        .collect()
}
