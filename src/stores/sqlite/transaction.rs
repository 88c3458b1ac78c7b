//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, ToSql, params_from_iter, types::Value};
use time::{Month, OffsetDateTime};

use crate::{
    Error, NewTransaction, Transaction, TransactionId, TransactionUpdate, UserID,
    stores::TransactionStore,
    transaction::{DateRange, month_bounds, month_range, year_bounds},
};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, category_id, name, amount, date, created_at, updated_at
     FROM \"transaction\"";

/// Stores transactions in a SQLite database.
///
/// The tables must be created with [initialize](crate::initialize_db) first.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }

    fn select(&self, user_id: UserID, range: Option<DateRange>) -> Result<Vec<Transaction>, Error> {
        let mut query_string = format!("{SELECT_COLUMNS} WHERE user_id = ?1");
        let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

        if let Some(range) = range {
            query_string.push_str(" AND date BETWEEN ?2 AND ?3");
            query_parameters.push(Value::Text(range.start.to_string()));
            query_parameters.push(Value::Text(range.end.to_string()));
        }

        query_string.push_str(" ORDER BY date ASC, id ASC");

        let connection = self.lock()?;
        let mut statement = connection.prepare(&query_string)?;

        statement
            .query_map(params_from_iter(query_parameters.iter()), map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    fn select_one(&self, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .lock()?
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = :id"))?
            .query_row(&[(":id", &id)], map_row)?;

        Ok(transaction)
    }

    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let now = OffsetDateTime::now_utc();

        let transaction = self
            .lock()?
            .prepare(
                "INSERT INTO \"transaction\"
                 (user_id, category_id, name, amount, date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 RETURNING id, user_id, category_id, name, amount, date, created_at, updated_at",
            )?
            .query_row(
                (
                    transaction.user_id().as_i64(),
                    transaction.category_id(),
                    transaction.name(),
                    transaction.amount(),
                    transaction.date(),
                    now,
                ),
                map_row,
            )?;

        Ok(transaction)
    }

    fn update_fields(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error> {
        if update.is_empty() {
            return self.select_one(id);
        }

        let mut set_clause_parts = vec![];
        let mut query_parameters: Vec<Box<dyn ToSql>> = vec![];

        if let Some(name) = update.name {
            query_parameters.push(Box::new(name));
            set_clause_parts.push(format!("name = ?{}", query_parameters.len()));
        }

        if let Some(amount) = update.amount {
            query_parameters.push(Box::new(amount));
            set_clause_parts.push(format!("amount = ?{}", query_parameters.len()));
        }

        if let Some(date) = update.date {
            query_parameters.push(Box::new(date));
            set_clause_parts.push(format!("date = ?{}", query_parameters.len()));
        }

        if let Some(category_id) = update.category_id {
            query_parameters.push(Box::new(category_id));
            set_clause_parts.push(format!("category_id = ?{}", query_parameters.len()));
        }

        query_parameters.push(Box::new(OffsetDateTime::now_utc()));
        set_clause_parts.push(format!("updated_at = ?{}", query_parameters.len()));

        query_parameters.push(Box::new(id));
        let query_string = format!(
            "UPDATE \"transaction\" SET {} WHERE id = ?{}
             RETURNING id, user_id, category_id, name, amount, date, created_at, updated_at",
            set_clause_parts.join(", "),
            query_parameters.len()
        );

        let transaction = self
            .lock()?
            .prepare(&query_string)?
            .query_row(params_from_iter(query_parameters.iter()), map_row)?;

        Ok(transaction)
    }

    fn remove(&self, id: TransactionId) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Retrieve every transaction for `user_id`, oldest first.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    async fn list(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.select(user_id, None)
    }

    async fn by_month(
        &self,
        user_id: UserID,
        year: i32,
        month: Month,
    ) -> Result<Vec<Transaction>, Error> {
        self.select(user_id, Some(month_bounds(year, month)?))
    }

    async fn by_year(&self, user_id: UserID, year: i32) -> Result<Vec<Transaction>, Error> {
        self.select(user_id, Some(year_bounds(year)?))
    }

    async fn by_range(
        &self,
        user_id: UserID,
        start_year: i32,
        start_month: Month,
        end_year: i32,
        end_month: Month,
    ) -> Result<Vec<Transaction>, Error> {
        let range = month_range(start_year, start_month, end_year, end_month)?;

        self.select(user_id, Some(range))
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] there is some other SQL error.
    async fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.select_one(id)
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        self.insert(transaction)
    }

    /// Change the set fields of a transaction and bump `updated_at`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] there is some other SQL error.
    async fn update(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error> {
        self.update_fields(id, update)
    }

    async fn delete(&self, id: TransactionId) -> Result<(), Error> {
        self.remove(id)
    }
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let category_id = row.get(2)?;
    let name = row.get(3)?;
    let amount = row.get(4)?;
    let date = row.get(5)?;
    let created_at = row.get(6)?;
    let updated_at = row.get(7)?;

    Ok(Transaction {
        id,
        user_id,
        category_id,
        name,
        amount,
        date,
        created_at,
        updated_at,
    })
}
