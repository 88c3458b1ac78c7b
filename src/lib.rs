//! Expense tracker is a personal-finance client for recording transactions,
//! grouping them into categories and viewing filtered summaries over time
//! windows.
//!
//! This library provides the transaction aggregation and filtering layer:
//! resolving a time selection into a store query, joining transactions to
//! their category names, refining the result locally and reconciling local
//! state after bulk mutations.

#![warn(missing_docs)]

mod category;
mod config;
mod controller;
mod database_id;
mod db;
mod export;
mod format;
mod logging;
mod state;
mod timezone;
mod transaction;
mod user;

pub mod stores;

#[cfg(test)]
mod test_utils;

pub use category::{Category, CategoryName, CategoryUpdate};
pub use config::{Config, DEFAULT_TIMEZONE};
pub use controller::{BulkDeleteOutcome, TransactionsController};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use export::write_csv;
pub use format::format_currency;
pub use logging::setup_logging;
pub use state::{RequestToken, TransactionState};
pub use transaction::{
    CategoryFilter, DateRange, DateSelection, DateWindow, DisplayOptions, EnrichedTransaction,
    MonthChoice, NewTransaction, OTHER_CATEGORY_NAME, RangeQuery, SortDirection, SortKey,
    SortState, Transaction, TransactionBuilder, TransactionUpdate, WindowData, enrich,
    filter_by_category, load_window, month_bounds, month_range, parse_calendar_date, resolve,
    search_by_name, sort_transactions, total, totals_by_category, year_bounds,
};
pub use user::UserID;

/// Input that was rejected before reaching a store.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    /// A transaction was given an empty (or whitespace only) name.
    #[error("transaction name is required")]
    EmptyName,

    /// A transaction amount was zero, negative or not a number.
    #[error("amount must be greater than 0")]
    NonPositiveAmount,

    /// A transaction was created without a date.
    #[error("date is required")]
    MissingDate,

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A month selection was not a number from 1 to 12 or "full".
    #[error("\"{0}\" is not a valid month, expected 1-12 or \"full\"")]
    InvalidMonth(String),

    /// A "last N days" selection used zero days.
    #[error("the number of days must be at least 1")]
    ZeroDays,

    /// A category filter was not "all", "Other" or a category ID.
    #[error("\"{0}\" is not a valid category filter")]
    InvalidCategoryFilter(String),

    /// A year/month/day combination could not be turned into a date.
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// The coarse classes of [Error] that presentation code can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input detected by the client or rejected by the store.
    Validation,
    /// An id referred to an entity the store no longer has.
    NotFound,
    /// The store could not be reached or failed unexpectedly.
    Transport,
    /// Local output, such as a report file or stdout, could not be written.
    Output,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The store was unreachable or returned something unexpected.
    #[error("the store could not complete the request: {0}")]
    Transport(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the local transaction state.
    #[error("could not acquire the transaction state lock")]
    StateLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The CSV report could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// Command output could not be written to a file or the terminal.
    #[error("could not write output: {0}")]
    OutputError(String),
}

impl Error {
    /// Classify the error so callers do not need to match on transport details.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound => ErrorKind::NotFound,
            Error::Transport(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::StateLockError
            | Error::InvalidTimezoneError(_) => ErrorKind::Transport,
            Error::CsvError(_) | Error::OutputError(_) => ErrorKind::Output,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::OutputError(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::CsvError(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, ErrorKind, ValidationError};

    #[test]
    fn classifies_errors_into_taxonomy() {
        assert_eq!(
            Error::from(ValidationError::EmptyName).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Transport("connection refused".to_owned()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(Error::DatabaseLockError.kind(), ErrorKind::Transport);
    }

    #[test]
    fn local_write_failures_are_not_store_failures() {
        let error: Error = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();

        assert!(matches!(error, Error::OutputError(_)));
        assert_eq!(error.kind(), ErrorKind::Output);
        assert_eq!(
            Error::CsvError("disk full".to_owned()).kind(),
            ErrorKind::Output
        );
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
