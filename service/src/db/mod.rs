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

//! Database abstraction to manipulate users and their orders.

use crate::model::{Order, OrderId, Price, ProductName, User, UserId, UserName};
use apibench_core::db::{DbError, DbResult, Executor};
#[cfg(feature = "postgres")]
use apibench_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use apibench_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use apibench_core::model::EmailAddress;
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

#[cfg(test)]
pub(crate) mod testutils;

/// Initializes the database schema.
///
/// This is idempotent: tables and indexes that already exist are left untouched.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Converts a row identifier assigned by SQLite into our 32-bit identifiers.
#[cfg(any(feature = "sqlite", test))]
fn rowid_to_i32(rowid: i64) -> DbResult<i32> {
    i32::try_from(rowid)
        .map_err(|_| DbError::DataIntegrityError(format!("Row id {} out of range", rowid)))
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(User::new(UserId::from(id), UserName::new(name)?, EmailAddress::new(email)?, created_at))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Order {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let user_id: i32 = row.try_get("user_id").map_err(postgres::map_sqlx_error)?;
        let product_name: String = row.try_get("product_name").map_err(postgres::map_sqlx_error)?;
        let price: String = row.try_get("price").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(Order::new(
            OrderId::from(id),
            UserId::from(user_id),
            ProductName::new(product_name)?,
            Price::parse(&price)?,
            created_at,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(User::new(
            UserId::from(rowid_to_i32(id)?),
            UserName::new(name)?,
            EmailAddress::new(email)?,
            build_timestamp(created_at_secs, created_at_nsecs)?,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Order {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let user_id: i64 = row.try_get("user_id").map_err(sqlite::map_sqlx_error)?;
        let product_name: String = row.try_get("product_name").map_err(sqlite::map_sqlx_error)?;
        let price: String = row.try_get("price").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(Order::new(
            OrderId::from(rowid_to_i32(id)?),
            UserId::from(rowid_to_i32(user_id)?),
            ProductName::new(product_name)?,
            Price::parse(&price)?,
            build_timestamp(created_at_secs, created_at_nsecs)?,
        ))
    }
}

/// Creates a new user with the given `name` and `email`, stamped at `created_at`.
///
/// Fails with `AlreadyExists` if another user already has the same email address.
pub(crate) async fn create_user(
    ex: &mut Executor,
    name: UserName,
    email: EmailAddress,
    created_at: OffsetDateTime,
) -> DbResult<User> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO users (name, email, created_at) VALUES ($1, $2, $3) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(email.as_str())
                .bind(created_at)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i32, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at)?;

            let query_str = "
                INSERT INTO users (name, email, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(email.as_str())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }
            rowid_to_i32(done.last_insert_rowid())?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(User::new(UserId::from(id), name, email, created_at))
}

/// Gets all users sorted by their identifier.
pub(crate) async fn get_users(ex: &mut Executor) -> DbResult<Vec<User>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, email, created_at FROM users ORDER BY id";
            let rows =
                sqlx::query(query_str).fetch_all(ex).await.map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(User::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, name, email, created_at_secs, created_at_nsecs
                FROM users ORDER BY id";
            let rows = sqlx::query(query_str).fetch_all(ex).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(User::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the user identified by `id`.
pub(crate) async fn get_user(ex: &mut Executor, id: UserId) -> DbResult<User> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, email, created_at FROM users WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, name, email, created_at_secs, created_at_nsecs
                FROM users WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Looks up a user by its `email` address, returning `None` if there is no such user.
pub(crate) async fn get_user_by_email(
    ex: &mut Executor,
    email: &EmailAddress,
) -> DbResult<Option<User>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, email, created_at FROM users WHERE email = $1";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_optional(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.map(User::try_from).transpose()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, name, email, created_at_secs, created_at_nsecs
                FROM users WHERE email = ?";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_optional(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.map(User::try_from).transpose()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Deletes the user identified by `id` together with all of its orders.
pub(crate) async fn delete_user(ex: &mut Executor, id: UserId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let done = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let done = sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}

/// Creates a new order for the user `user_id`, stamped at `created_at`.
///
/// Fails with `NotFound` if the user does not exist.
pub(crate) async fn create_order(
    ex: &mut Executor,
    user_id: UserId,
    product_name: ProductName,
    price: Price,
    created_at: OffsetDateTime,
) -> DbResult<Order> {
    let id = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO orders (user_id, product_name, price, created_at)
                VALUES ($1, $2, $3::NUMERIC, $4)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(product_name.as_str())
                .bind(price.to_string())
                .bind(created_at)
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i32, _>("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at)?;

            let query_str = "
                INSERT INTO orders
                    (user_id, product_name, price, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(product_name.as_str())
                .bind(price.to_string())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }
            rowid_to_i32(done.last_insert_rowid())?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Order::new(OrderId::from(id), user_id, product_name, price, created_at))
}

/// Gets all orders sorted by their identifier.
pub(crate) async fn get_orders(ex: &mut Executor) -> DbResult<Vec<Order>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, user_id, product_name, price::TEXT AS price, created_at
                FROM orders ORDER BY id";
            let rows =
                sqlx::query(query_str).fetch_all(ex).await.map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Order::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, user_id, product_name, price, created_at_secs, created_at_nsecs
                FROM orders ORDER BY id";
            let rows = sqlx::query(query_str).fetch_all(ex).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Order::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the order identified by `id`.
pub(crate) async fn get_order(ex: &mut Executor, id: OrderId) -> DbResult<Order> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, user_id, product_name, price::TEXT AS price, created_at
                FROM orders WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Order::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, user_id, product_name, price, created_at_secs, created_at_nsecs
                FROM orders WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Order::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all orders placed by `user_id` sorted by their identifier.
///
/// This does not check whether the user exists: an unknown user simply has no orders.
pub(crate) async fn get_orders_by_user(ex: &mut Executor, user_id: UserId) -> DbResult<Vec<Order>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, user_id, product_name, price::TEXT AS price, created_at
                FROM orders WHERE user_id = $1 ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Order::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, user_id, product_name, price, created_at_secs, created_at_nsecs
                FROM orders WHERE user_id = ? ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Order::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Deletes the order identified by `id`.
pub(crate) async fn delete_order(ex: &mut Executor, id: OrderId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let done = sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let done = sqlx::query("DELETE FROM orders WHERE id = ?")
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}
