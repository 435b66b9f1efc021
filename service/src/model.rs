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

//! High-level data types.

use apibench_core::model::{EmailAddress, ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod price;
pub(crate) use price::{Price, deserialize_price_text};

/// Maximum length of user names per the schema.
const MAX_USER_NAME_LENGTH: usize = 100;

/// Maximum length of product names per the schema.
const MAX_PRODUCT_NAME_LENGTH: usize = 255;

/// Identifier of a user, assigned by the database on creation.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Serialize)]
#[serde(transparent)]
pub(crate) struct UserId(i32);

impl UserId {
    /// Returns the identifier as the integer used by the database.
    pub(crate) fn as_i32(self) -> i32 {
        self.0
    }
}

/// Identifier of an order, assigned by the database on creation.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Serialize)]
#[serde(transparent)]
pub(crate) struct OrderId(i32);

impl OrderId {
    /// Returns the identifier as the integer used by the database.
    pub(crate) fn as_i32(self) -> i32 {
        self.0
    }
}

/// Validates that `s`, which describes a `what`, is not blank and fits in `max_length` characters.
fn validate_text(what: &str, s: &str, max_length: usize) -> ModelResult<()> {
    if s.trim().is_empty() {
        return Err(ModelError(format!("{} cannot be empty", what)));
    }
    if s.chars().count() > max_length {
        return Err(ModelError(format!("{} is too long", what)));
    }
    Ok(())
}

/// The name of a user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(transparent)]
pub(crate) struct UserName(String);

impl UserName {
    /// Creates a new user name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        validate_text("Name", &s, MAX_USER_NAME_LENGTH)?;
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// The name of the product bought in an order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(transparent)]
pub(crate) struct ProductName(String);

impl ProductName {
    /// Creates a new product name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        validate_text("Product name", &s, MAX_PRODUCT_NAME_LENGTH)?;
        Ok(Self(s))
    }

    /// Returns a string view of the product name.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// A registered user.
#[derive(Clone, Constructor, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct User {
    /// Unique identifier of the user.
    id: UserId,

    /// Full name of the user.
    name: UserName,

    /// Email address of the user, unique across all users.
    email: EmailAddress,

    /// Time at which the user was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

/// An order placed by a user.
#[derive(Clone, Constructor, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct Order {
    /// Unique identifier of the order.
    id: OrderId,

    /// Identifier of the user that placed the order.
    user_id: UserId,

    /// Name of the product that was bought.
    product_name: ProductName,

    /// Price paid for the product.
    price: Price,

    /// Time at which the order was placed.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}
