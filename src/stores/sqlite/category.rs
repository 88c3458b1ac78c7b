//! Implements a SQLite backed category store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Category, CategoryId, CategoryName, CategoryUpdate, Error, UserID, stores::CategoryStore,
};

/// Creates and retrieves transaction categories to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new category store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }

    fn select_all(&self, user_id: UserID) -> Result<Vec<Category>, Error> {
        self.lock()?
            .prepare(
                "SELECT id, user_id, name, created_at, updated_at FROM category
                 WHERE user_id = :user_id ORDER BY name COLLATE NOCASE ASC, id ASC;",
            )?
            .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
            .map(|maybe_category| maybe_category.map_err(|error| error.into()))
            .collect()
    }

    fn select_one(&self, id: CategoryId) -> Result<Category, Error> {
        self.lock()?
            .prepare(
                "SELECT id, user_id, name, created_at, updated_at FROM category WHERE id = :id;",
            )?
            .query_row(&[(":id", &id)], map_row)
            .map_err(|error| error.into())
    }

    fn insert(&self, user_id: UserID, name: CategoryName) -> Result<Category, Error> {
        let now = OffsetDateTime::now_utc();

        self.lock()?
            .prepare(
                "INSERT INTO category (user_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 RETURNING id, user_id, name, created_at, updated_at;",
            )?
            .query_row((user_id.as_i64(), name.as_ref(), now), map_row)
            .map_err(|error| error.into())
    }

    fn update_fields(&self, id: CategoryId, update: CategoryUpdate) -> Result<Category, Error> {
        let Some(name) = update.name else {
            return self.select_one(id);
        };

        self.lock()?
            .prepare(
                "UPDATE category SET name = ?1, updated_at = ?2 WHERE id = ?3
                 RETURNING id, user_id, name, created_at, updated_at;",
            )?
            .query_row((name.as_ref(), OffsetDateTime::now_utc(), id), map_row)
            .map_err(|error| error.into())
    }

    fn remove(&self, id: CategoryId) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM category WHERE id = ?1;", [id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CategoryStore for SQLiteCategoryStore {
    /// Retrieve the categories for `user_id`, sorted by name.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    async fn list(&self, user_id: UserID) -> Result<Vec<Category>, Error> {
        self.select_all(user_id)
    }

    /// Retrieve the category with `id`.
    ///
    /// # Errors
    /// This function will return a [Error::NotFound] if `id` is unknown, or
    /// another error if there is an SQL error.
    async fn get(&self, id: CategoryId) -> Result<Category, Error> {
        self.select_one(id)
    }

    async fn create(&self, user_id: UserID, name: CategoryName) -> Result<Category, Error> {
        self.insert(user_id, name)
    }

    async fn update(&self, id: CategoryId, update: CategoryUpdate) -> Result<Category, Error> {
        self.update_fields(id, update)
    }

    /// Delete the category with `id`. Transactions that refer to it are kept.
    async fn delete(&self, id: CategoryId) -> Result<(), Error> {
        self.remove(id)
    }
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let raw_name: String = row.get(2)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let created_at = row.get(3)?;
    let updated_at = row.get(4)?;

    Ok(Category {
        id,
        user_id,
        name,
        created_at,
        updated_at,
    })
}
