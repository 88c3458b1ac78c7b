//! Runtime configuration shared by the binaries.

use time::Date;

use crate::{Error, timezone::local_today};

/// The canonical timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Settings that affect how the aggregation layer interprets dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// "Today" (and therefore every "last N days" window) is evaluated in
    /// this timezone.
    pub local_timezone: String,
}

impl Config {
    /// Create a config for `local_timezone`.
    pub fn new(local_timezone: &str) -> Self {
        Self {
            local_timezone: local_timezone.to_owned(),
        }
    }

    /// The current calendar date in the configured timezone.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone is not a valid,
    /// canonical timezone name.
    pub fn today(&self) -> Result<Date, Error> {
        local_today(&self.local_timezone)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}
