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

//! Test utilities for the REST API.

use crate::db;
use crate::db::testutils::setup_sqlite;
use crate::driver::Driver;
use crate::model::*;
use crate::rest::app;
use apibench_core::clocks::Clock;
use apibench_core::clocks::testutils::MonotonicClock;
use apibench_core::db::Db;
use apibench_core::model::EmailAddress;
use axum::Router;
use std::sync::Arc;
use time::macros::datetime;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the app, for direct access to it.
    db: Arc<dyn Db + Send + Sync>,

    /// The router of the app under test.
    app: Router,
}

impl TestContext {
    /// Initializes the app against an in-memory database.
    pub(crate) async fn setup() -> Self {
        let db = setup_sqlite().await;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new(100000));
        let app = app(Driver::new(db.clone(), clock));
        Self { db, app }
    }

    /// Obtains a copy of the router to issue one request.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Inserts a user directly into the database.
    pub(crate) async fn create_user(&self, name: &str, email: &str) -> User {
        db::create_user(
            &mut self.db.ex().await.unwrap(),
            UserName::new(name).unwrap(),
            EmailAddress::from(email),
            datetime!(2023-11-14 22:13:20 UTC),
        )
        .await
        .unwrap()
    }

    /// Inserts an order for `user` directly into the database.
    pub(crate) async fn create_order(&self, user: &User, product_name: &str, price: &str) -> Order {
        db::create_order(
            &mut self.db.ex().await.unwrap(),
            *user.id(),
            ProductName::new(product_name).unwrap(),
            Price::parse(price).unwrap(),
            datetime!(2023-11-15 10:00:00 UTC),
        )
        .await
        .unwrap()
    }

    /// Gets all users directly from the database.
    pub(crate) async fn get_users(&self) -> Vec<User> {
        db::get_users(&mut self.db.ex().await.unwrap()).await.unwrap()
    }

    /// Gets all orders directly from the database.
    pub(crate) async fn get_orders(&self) -> Vec<Order> {
        db::get_orders(&mut self.db.ex().await.unwrap()).await.unwrap()
    }
}
