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

//! Operations on users.

use crate::db;
use crate::driver::{Driver, map_db_error, user_not_found};
use crate::model::{User, UserId, UserName};
use apibench_core::db::{DbError, Executor};
use apibench_core::driver::{DriverError, DriverResult, log_business_event};
use apibench_core::model::EmailAddress;
use serde_json::json;
use time::OffsetDateTime;

/// Constructs the error returned when a user with `email` already exists.
fn user_already_exists(email: &EmailAddress) -> DriverError {
    DriverError::AlreadyExists(format!("User with email='{}' already exists", email.as_str()))
}

/// Inserts a new user, reporting a clash on the unique `email` as an already existing user.
///
/// Callers check for duplicates beforehand, so the clash only happens when a concurrent creation
/// with the same email commits in between.
async fn insert_user(
    ex: &mut Executor,
    name: UserName,
    email: EmailAddress,
    created_at: OffsetDateTime,
) -> DriverResult<User> {
    match db::create_user(ex, name, email.clone(), created_at).await {
        Ok(user) => Ok(user),
        Err(DbError::AlreadyExists) => Err(user_already_exists(&email)),
        Err(e) => Err(e.into()),
    }
}

impl Driver {
    /// Gets all existing users.
    pub(crate) async fn get_users(self) -> DriverResult<Vec<User>> {
        let users = db::get_users(&mut self.db.ex().await?).await?;
        Ok(users)
    }

    /// Gets the user identified by `id`.
    pub(crate) async fn get_user(self, id: UserId) -> DriverResult<User> {
        db::get_user(&mut self.db.ex().await?, id)
            .await
            .map_err(|e| map_db_error(e, || user_not_found(id)))
    }

    /// Creates a new user from an untrusted `name` and `email`.
    ///
    /// Email addresses are unique across users.
    pub(crate) async fn create_user(self, name: String, email: String) -> DriverResult<User> {
        let email = EmailAddress::new(email)?;
        let name = UserName::new(name)?;

        let mut tx = self.db.begin().await?;
        if db::get_user_by_email(tx.ex(), &email).await?.is_some() {
            return Err(user_already_exists(&email));
        }
        let now = self.clock.now_utc();
        let user = insert_user(tx.ex(), name, email, now).await?;
        tx.commit().await?;

        log_business_event(
            "created",
            "user",
            user.id().as_i32(),
            json!({"name": user.name().as_str(), "email": user.email().as_str()}),
        );
        Ok(user)
    }

    /// Deletes the user identified by `id` and all of its orders.
    pub(crate) async fn delete_user(self, id: UserId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        db::delete_user(tx.ex(), id).await.map_err(|e| map_db_error(e, || user_not_found(id)))?;
        tx.commit().await?;

        log_business_event("deleted", "user", id.as_i32(), json!({}));
        Ok(())
    }
}
