//! Defines the category store trait.

use std::future::Future;

use crate::{Category, CategoryId, CategoryName, CategoryUpdate, Error, UserID};

/// Creates, retrieves and removes the categories that transactions are grouped by.
///
/// Deleting a category must not delete its transactions.
pub trait CategoryStore {
    /// Get all categories for a given user.
    fn list(&self, user_id: UserID) -> impl Future<Output = Result<Vec<Category>, Error>> + Send;

    /// Get a category by its ID.
    fn get(&self, id: CategoryId) -> impl Future<Output = Result<Category, Error>> + Send;

    /// Create a new category and add it the store.
    fn create(
        &self,
        user_id: UserID,
        name: CategoryName,
    ) -> impl Future<Output = Result<Category, Error>> + Send;

    /// Change a category's fields.
    ///
    /// Fails with [Error::NotFound] if `id` is unknown.
    fn update(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> impl Future<Output = Result<Category, Error>> + Send;

    /// Remove a category.
    ///
    /// Fails with [Error::NotFound] if `id` is unknown.
    fn delete(&self, id: CategoryId) -> impl Future<Output = Result<(), Error>> + Send;
}
