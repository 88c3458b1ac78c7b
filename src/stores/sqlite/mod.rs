//! SQLite implementations of the store traits and a helper to open them.

mod category;
mod transaction;

pub use category::SQLiteCategoryStore;
pub use transaction::SQLiteTransactionStore;

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// Open the database at `path`, creating the tables if needed, and return
/// stores that share the connection.
///
/// # Errors
/// Returns [Error::SqlError] if the database cannot be opened or initialized.
pub fn open_stores(path: &Path) -> Result<(SQLiteTransactionStore, SQLiteCategoryStore), Error> {
    let connection = Connection::open(path)?;

    create_stores(connection)
}

/// Create the tables on `connection` if needed and return stores that share it.
///
/// # Errors
/// Returns [Error::SqlError] if the tables cannot be created.
pub fn create_stores(
    connection: Connection,
) -> Result<(SQLiteTransactionStore, SQLiteCategoryStore), Error> {
    initialize(&connection)?;

    let connection = Arc::new(Mutex::new(connection));

    Ok((
        SQLiteTransactionStore::new(connection.clone()),
        SQLiteCategoryStore::new(connection),
    ))
}
