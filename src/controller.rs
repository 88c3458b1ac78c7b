//! Coordinates the stores with the local transaction state.

use std::sync::Mutex;

use time::Date;

use crate::{
    Category, CategoryId, CategoryName, CategoryUpdate, Error, Transaction, TransactionId,
    TransactionUpdate, UserID,
    state::TransactionState,
    stores::{CategoryStore, TransactionStore},
    transaction::{DateSelection, EnrichedTransaction, TransactionBuilder, load_window, resolve},
};

/// The result of deleting several transactions.
#[derive(Debug, Default, PartialEq)]
pub struct BulkDeleteOutcome {
    /// The IDs the store confirmed as deleted, in the order they were deleted.
    pub deleted: Vec<TransactionId>,
    /// The IDs that could not be deleted and why. These remain in the local state.
    pub failed: Vec<(TransactionId, Error)>,
}

impl BulkDeleteOutcome {
    /// Whether every requested ID was deleted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Loads, refines and mutates the transactions of a single user.
///
/// The local state is only ever locked between `.await` points, so a fetch
/// that completes while another operation is in flight sees either none or
/// all of that operation's changes.
pub struct TransactionsController<T, C> {
    transaction_store: T,
    category_store: C,
    user_id: UserID,
    state: Mutex<TransactionState>,
}

impl<T, C> TransactionsController<T, C>
where
    T: TransactionStore,
    C: CategoryStore,
{
    /// Create a controller for `user_id` with an empty state.
    pub fn new(transaction_store: T, category_store: C, user_id: UserID) -> Self {
        Self {
            transaction_store,
            category_store,
            user_id,
            state: Mutex::new(TransactionState::new()),
        }
    }

    /// The user whose transactions are managed.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// Run `f` with exclusive access to the local state.
    ///
    /// # Errors
    /// Returns [Error::StateLockError] if the lock is poisoned.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut TransactionState) -> R) -> Result<R, Error> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(error) => {
                tracing::error!("could not acquire transaction state lock: {error}");
                return Err(Error::StateLockError);
            }
        };

        Ok(f(&mut state))
    }

    /// The transactions to show after filtering, searching and sorting.
    ///
    /// # Errors
    /// Returns [Error::StateLockError] if the lock is poisoned.
    pub fn displayed(&self) -> Result<Vec<EnrichedTransaction>, Error> {
        self.with_state(|state| state.displayed())
    }

    /// Load the window for `selection` and replace the local lists with it.
    ///
    /// Returns `Ok(false)` if another selection was applied while this one was
    /// loading, in which case its result (or its failure) is discarded.
    ///
    /// # Errors
    /// Returns the store error if either fetch fails and this is still the
    /// latest request.
    pub async fn apply_selection(
        &self,
        selection: DateSelection,
        today: Date,
    ) -> Result<bool, Error> {
        let window = resolve(selection);
        let token = self.with_state(|state| state.begin_request(window))?;

        let result = load_window(
            &self.transaction_store,
            &self.category_store,
            self.user_id,
            window,
            today,
        )
        .await;

        match result {
            Ok(data) => self.with_state(|state| state.apply_loaded(token, data)),
            Err(error) => {
                if self.with_state(|state| state.is_current(&token))? {
                    Err(error)
                } else {
                    tracing::warn!(
                        "Ignoring failure of superseded request for {}: {error}",
                        window.label()
                    );
                    Ok(false)
                }
            }
        }
    }

    /// Delete each of `ids` from the store, one at a time.
    ///
    /// A failure does not stop the remaining IDs from being attempted. Once
    /// every ID has been attempted, the confirmed deletions are removed from the
    /// local state in a single step. The selection is cleared if anything was
    /// removed and left untouched otherwise.
    ///
    /// # Errors
    /// Returns [Error::StateLockError] if the lock is poisoned. Store errors
    /// are reported per ID in [BulkDeleteOutcome::failed].
    pub async fn delete_many(&self, ids: &[TransactionId]) -> Result<BulkDeleteOutcome, Error> {
        let mut outcome = BulkDeleteOutcome::default();

        for &id in ids {
            let attempted = outcome.deleted.contains(&id)
                || outcome.failed.iter().any(|(failed, _)| *failed == id);
            if attempted {
                continue;
            }

            match self.transaction_store.delete(id).await {
                Ok(()) => outcome.deleted.push(id),
                Err(error) => {
                    tracing::warn!("Could not delete transaction {id}: {error}");
                    outcome.failed.push((id, error));
                }
            }
        }

        tracing::info!(
            "Deleted {} of {} transactions",
            outcome.deleted.len(),
            outcome.deleted.len() + outcome.failed.len()
        );

        self.with_state(|state| state.remove_confirmed(&outcome.deleted))?;

        Ok(outcome)
    }

    /// Delete the selected transactions.
    ///
    /// # Errors
    /// See [TransactionsController::delete_many].
    pub async fn delete_selected(&self) -> Result<BulkDeleteOutcome, Error> {
        let ids: Vec<TransactionId> =
            self.with_state(|state| state.selected().iter().copied().collect())?;

        self.delete_many(&ids).await
    }

    /// Validate and save a new transaction, then add it to the local list.
    ///
    /// # Errors
    /// Returns [Error::Validation] without calling the store if the builder
    /// is invalid, otherwise any error from the store.
    pub async fn create_transaction(
        &self,
        builder: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        let new_transaction = builder.finalize(self.user_id)?;
        let transaction = self.transaction_store.create(new_transaction).await?;
        tracing::info!("Created transaction {}", transaction.id);

        self.with_state(|state| state.upsert(transaction.clone()))?;

        Ok(transaction)
    }

    /// Validate and apply a partial update, then merge the result into the local list.
    ///
    /// # Errors
    /// Returns [Error::Validation] without calling the store if a set field is
    /// invalid, [Error::NotFound] if `id` is unknown to the store, or any
    /// other store error.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error> {
        let update = update.validate()?;
        let transaction = self.transaction_store.update(id, update).await?;
        tracing::info!("Updated transaction {id}");

        self.with_state(|state| state.upsert(transaction.clone()))?;

        Ok(transaction)
    }

    /// Create a category and refresh the category names.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the name is empty, or any store error.
    pub async fn create_category(&self, name: &str) -> Result<Category, Error> {
        let name = CategoryName::new(name)?;
        let category = self.category_store.create(self.user_id, name).await?;
        tracing::info!("Created category {}", category.id);

        self.with_state(|state| state.upsert_category(category.clone()))?;

        Ok(category)
    }

    /// Rename a category and refresh the category names.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the name is empty, [Error::NotFound] if
    /// `id` is unknown, or any other store error.
    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category, Error> {
        let update = CategoryUpdate {
            name: Some(CategoryName::new(name)?),
        };
        let category = self.category_store.update(id, update).await?;
        tracing::info!("Renamed category {id}");

        self.with_state(|state| state.upsert_category(category.clone()))?;

        Ok(category)
    }

    /// Delete a category. Its transactions are kept and shown as "Other".
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` is unknown, or any other store error.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), Error> {
        self.category_store.delete(id).await?;
        tracing::info!("Deleted category {id}");

        self.with_state(|state| state.remove_category(id))
    }
}
