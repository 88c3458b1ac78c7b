//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Resolving a date filter selection into a store query
//! - Loading a window of transactions and joining them with category names
//! - Filtering, searching and sorting the loaded transactions

mod aggregate;
mod core;
mod refine;
mod window;

pub use aggregate::{EnrichedTransaction, OTHER_CATEGORY_NAME, WindowData, enrich, load_window};
pub use core::{
    NewTransaction, Transaction, TransactionBuilder, TransactionUpdate, parse_calendar_date,
};
pub use refine::{
    CategoryFilter, DisplayOptions, SortDirection, SortKey, SortState, filter_by_category,
    search_by_name, sort_transactions, total, totals_by_category,
};
pub use window::{
    DateRange, DateSelection, DateWindow, MonthChoice, RangeQuery, month_bounds, month_range,
    resolve, year_bounds,
};

pub(crate) use aggregate::{category_lookup, enrich_one};
