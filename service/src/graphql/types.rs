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

//! GraphQL representations of the data types.

use crate::model::{Order, User};
use async_graphql::{
    InputObject, InputValueError, InputValueResult, Number, Object, Result, Scalar, ScalarType,
    Value,
};
use time::format_description::well_known::Rfc3339;

/// Exact decimal amount transferred as a string with two fractional digits.
///
/// Inputs are accepted both as numbers and as strings and are carried verbatim to the business
/// logic, which is responsible for validating them.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Decimal(pub(crate) String);

/// Converts a JSON `number` into its decimal text form without using scientific notation.
fn number_to_text(number: &Number) -> Option<String> {
    if let Some(i) = number.as_i64() {
        Some(i.to_string())
    } else if let Some(u) = number.as_u64() {
        Some(u.to_string())
    } else {
        number.as_f64().map(|f| f.to_string())
    }
}

#[Scalar(name = "Decimal")]
impl ScalarType for Decimal {
    fn parse(value: Value) -> InputValueResult<Self> {
        match &value {
            Value::String(s) => Ok(Decimal(s.clone())),
            Value::Number(n) => match number_to_text(n) {
                Some(text) => Ok(Decimal(text)),
                None => Err(InputValueError::expected_type(value)),
            },
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn is_valid(value: &Value) -> bool {
        matches!(value, Value::String(_) | Value::Number(_))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

/// A registered user.
pub(crate) struct UserObject(pub(crate) User);

#[Object(name = "User")]
impl UserObject {
    /// Unique identifier of the user.
    async fn id(&self) -> i32 {
        self.0.id().as_i32()
    }

    /// Full name of the user.
    async fn name(&self) -> &str {
        self.0.name().as_str()
    }

    /// Email address of the user.
    async fn email(&self) -> &str {
        self.0.email().as_str()
    }

    /// Time at which the user was created, in RFC 3339 format.
    async fn created_at(&self) -> Result<String> {
        Ok(self.0.created_at().format(&Rfc3339)?)
    }
}

/// An order placed by a user.
pub(crate) struct OrderObject(pub(crate) Order);

#[Object(name = "Order")]
impl OrderObject {
    /// Unique identifier of the order.
    async fn id(&self) -> i32 {
        self.0.id().as_i32()
    }

    /// Identifier of the user that placed the order.
    async fn user_id(&self) -> i32 {
        self.0.user_id().as_i32()
    }

    /// Name of the product that was bought.
    async fn product_name(&self) -> &str {
        self.0.product_name().as_str()
    }

    /// Price paid for the product.
    async fn price(&self) -> Decimal {
        Decimal(self.0.price().to_string())
    }

    /// Time at which the order was placed, in RFC 3339 format.
    async fn created_at(&self) -> Result<String> {
        Ok(self.0.created_at().format(&Rfc3339)?)
    }
}

/// Details of a user to create.
#[derive(InputObject)]
pub(crate) struct UserInput {
    /// Full name of the user, which cannot be empty.
    pub(crate) name: String,

    /// Email address of the user in a valid format, such as `user@example.com`.
    pub(crate) email: String,
}

/// Details of an order to create.
#[derive(InputObject)]
pub(crate) struct OrderInput {
    /// Identifier of an existing user.
    pub(crate) user_id: i32,

    /// Name of the product, which cannot be empty.
    pub(crate) product_name: String,

    /// Price with at most two decimal places, which must be greater than zero.
    pub(crate) price: Decimal,
}
