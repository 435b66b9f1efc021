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

//! Test utilities to obtain databases with the schema already in place.

use crate::db::init_schema;
use apibench_core::db::Db;
use std::sync::Arc;

/// Initializes the schema of `db` and returns it as a generic database.
async fn with_schema(db: Arc<dyn Db + Send + Sync>) -> Arc<dyn Db + Send + Sync> {
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

/// Creates an in-memory SQLite database with the schema initialized.
pub(crate) async fn setup_sqlite() -> Arc<dyn Db + Send + Sync> {
    with_schema(Arc::new(apibench_core::db::sqlite::testutils::setup().await)).await
}

/// Creates a connection to the PostgreSQL test database with the schema initialized.
#[cfg(feature = "postgres")]
pub(crate) async fn setup_postgres() -> Arc<dyn Db + Send + Sync> {
    with_schema(Arc::new(apibench_core::db::postgres::testutils::setup().await)).await
}
