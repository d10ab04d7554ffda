//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_seen`, log entries, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
