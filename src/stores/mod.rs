//! Contains traits and implementations for the stores that hold transactions and categories.
//!
//! The aggregation layer only talks to a store through [TransactionStore] and
//! [CategoryStore], so any backend (a REST service, a local database) can be
//! plugged in by implementing them.

mod category;
mod transaction;

pub mod sqlite;

pub use category::CategoryStore;
pub use transaction::TransactionStore;
