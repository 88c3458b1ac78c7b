//! Defines the transaction store trait.

use std::future::Future;

use time::Month;

use crate::{Error, NewTransaction, Transaction, TransactionId, TransactionUpdate, UserID};

/// Handles the creation, retrieval and removal of transactions.
///
/// Every read is scoped to a single user. Implementations should classify
/// their failures into [Error::Validation], [Error::NotFound] or a transport
/// error (see [Error::kind]).
pub trait TransactionStore {
    /// Retrieve every transaction for `user_id`.
    fn list(
        &self,
        user_id: UserID,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve the transactions for `user_id` dated within a calendar month.
    fn by_month(
        &self,
        user_id: UserID,
        year: i32,
        month: Month,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve the transactions for `user_id` dated within a calendar year.
    fn by_year(
        &self,
        user_id: UserID,
        year: i32,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve the transactions for `user_id` dated from the first day of the
    /// start month to the last day of the end month.
    fn by_range(
        &self,
        user_id: UserID,
        start_year: i32,
        start_month: Month,
        end_year: i32,
        end_month: Month,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve a single transaction.
    ///
    /// Fails with [Error::NotFound] if `id` is unknown.
    fn get(&self, id: TransactionId)
    -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Save a new transaction, the store assigns the ID and timestamps.
    fn create(
        &self,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Change a subset of a transaction's fields.
    ///
    /// Fails with [Error::NotFound] if `id` is unknown.
    fn update(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Remove a transaction.
    ///
    /// Fails with [Error::NotFound] if `id` is unknown.
    fn delete(&self, id: TransactionId) -> impl Future<Output = Result<(), Error>> + Send;
}
