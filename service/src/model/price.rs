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

//! The `Price` data type.

use apibench_core::model::{ModelError, ModelResult};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Largest amount, in cents, that fits in a `NUMERIC(10, 2)` column.
const MAX_CENTS: i64 = 99_999_999_99;

/// Maximum number of integral digits that a price can have.
const MAX_INTEGRAL_DIGITS: usize = 8;

/// An exact, strictly positive amount of money with two fractional digits.
///
/// Prices are kept as an integer number of cents to avoid any floating point inaccuracies.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Price(i64);

impl Price {
    /// Parses a decimal literal such as `12`, `+0.5` or `1299.999` into a price.
    ///
    /// The value is quantized to two fractional digits rounding half to even, and must be
    /// positive both before and after quantization.
    pub fn parse(text: &str) -> ModelResult<Self> {
        let invalid = || ModelError(format!("Invalid price format: {}", text));
        let not_positive = || ModelError("Price must be greater than zero".to_owned());
        let too_large = || ModelError("Price is too large".to_owned());

        let trimmed = text.trim();
        let (negative, unsigned) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (false, rest)
        } else {
            (false, trimmed)
        };

        let (integral, fractional) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integral.is_empty() && fractional.is_empty() {
            return Err(invalid());
        }
        if !integral.bytes().all(|b| b.is_ascii_digit())
            || !fractional.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let integral = integral.trim_start_matches('0');
        let is_zero = integral.is_empty() && fractional.bytes().all(|b| b == b'0');
        if negative || is_zero {
            return Err(not_positive());
        }
        if integral.len() > MAX_INTEGRAL_DIGITS {
            return Err(too_large());
        }

        let integral =
            if integral.is_empty() { 0 } else { integral.parse::<i64>().map_err(|_| invalid())? };
        let mut digits = fractional.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let mut cents = integral * 100 + tenths * 10 + hundredths;

        let remainder = fractional.get(2..).unwrap_or("");
        if let Some((first, rest)) = remainder.as_bytes().split_first() {
            let round_up = match first.cmp(&b'5') {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => rest.iter().any(|b| *b != b'0') || cents % 2 == 1,
            };
            if round_up {
                cents += 1;
            }
        }

        if cents == 0 {
            return Err(not_positive());
        }
        if cents > MAX_CENTS {
            return Err(too_large());
        }
        Ok(Self(cents))
    }

    /// Creates a price from an amount of `cents`.
    pub fn from_cents(cents: i64) -> ModelResult<Self> {
        if cents <= 0 {
            return Err(ModelError("Price must be greater than zero".to_owned()));
        }
        if cents > MAX_CENTS {
            return Err(ModelError("Price is too large".to_owned()));
        }
        Ok(Self(cents))
    }

    /// Returns the price as an amount of cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the price as a floating point number, for transports that cannot carry decimals.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Visitor to extract the textual representation of a price from either a string or a number.
struct PriceTextVisitor;

impl Visitor<'_> for PriceTextVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal number or a string with a decimal number")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // The `Display` implementation of floats never uses scientific notation.
        Ok(v.to_string())
    }
}

/// Deserializes the raw text of a price that may come as a JSON string or a JSON number.
///
/// This does not validate the price so that validation errors can be reported by the business
/// logic layer like any other input error.
pub(crate) fn deserialize_price_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    deserializer.deserialize_any(PriceTextVisitor)
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = deserialize_price_text(deserializer)?;
        Price::parse(&text).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}
