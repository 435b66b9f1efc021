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

//! Collection of clock implementations used to stamp entities with their creation time.

use time::OffsetDateTime;

/// Generic definition of a clock.
pub trait Clock {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock implementation that uses the system clock.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();

        // PostgreSQL timestamps only have microsecond resolution.  Truncate here so that values
        // read back from the database compare equal to the values we wrote.
        let nanos = nanos / 1000 * 1000;

        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A clock that starts at a fixed point in time and moves forward by one second every time it
    /// is queried.
    ///
    /// This makes creation times predictable in tests while still keeping them unique and
    /// ordered.
    pub struct MonotonicClock {
        /// Next value to return, in seconds since the Unix epoch.
        next_secs: AtomicI64,
    }

    impl MonotonicClock {
        /// Creates a new clock whose first reading will be `start_secs` seconds after the epoch.
        pub fn new(start_secs: i64) -> Self {
            Self { next_secs: AtomicI64::new(start_secs) }
        }
    }

    impl Clock for MonotonicClock {
        fn now_utc(&self) -> OffsetDateTime {
            let secs = self.next_secs.fetch_add(1, Ordering::SeqCst);
            OffsetDateTime::from_unix_timestamp(secs).unwrap()
        }
    }

}
