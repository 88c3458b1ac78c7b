//! Fetching the transactions for a window and joining them with their category names.

use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use crate::{
    Category, CategoryId, Error, Transaction, UserID,
    stores::{CategoryStore, TransactionStore},
};

use super::window::{DateWindow, RangeQuery};

/// The display name for transactions without a resolvable category.
pub const OTHER_CATEGORY_NAME: &str = "Other";

/// A transaction with the display name of its category attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    /// The transaction as returned by the store.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The category name, or [OTHER_CATEGORY_NAME]. Never empty.
    pub category_name: String,
    /// Whether the category ID matched one of the user's categories.
    #[serde(skip)]
    pub category_resolved: bool,
}

impl EnrichedTransaction {
    /// Whether the transaction fell back to the [OTHER_CATEGORY_NAME] category.
    pub fn is_uncategorized(&self) -> bool {
        !self.category_resolved
    }
}

/// The result of loading a window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowData {
    /// The enriched transactions, in the order the store returned them.
    pub transactions: Vec<EnrichedTransaction>,
    /// The user's categories, for populating filter controls.
    pub categories: Vec<Category>,
}

/// Fetch the transactions in `window` and the user's categories, and join them.
///
/// Both fetches are issued concurrently. If either fails the whole load
/// fails, a partial join would attribute transactions to the wrong category.
///
/// # Errors
/// Returns whichever error the stores produced first.
pub async fn load_window<T, C>(
    transaction_store: &T,
    category_store: &C,
    user_id: UserID,
    window: DateWindow,
    today: Date,
) -> Result<WindowData, Error>
where
    T: TransactionStore,
    C: CategoryStore,
{
    let query = window.query(today);
    tracing::debug!("Loading {} for user {user_id} with {query:?}", window.label());

    let (transactions, categories) = tokio::try_join!(
        fetch_transactions(transaction_store, user_id, query),
        category_store.list(user_id),
    )?;

    let fetched_count = transactions.len();
    let transactions = match window.post_fetch_bounds(today) {
        Some(bounds) => transactions
            .into_iter()
            .filter(|transaction| bounds.contains(transaction.date))
            .collect(),
        None => transactions,
    };

    tracing::debug!(
        "Kept {} of {fetched_count} transactions, joining with {} categories",
        transactions.len(),
        categories.len()
    );

    Ok(WindowData {
        transactions: enrich(transactions, &categories),
        categories,
    })
}

async fn fetch_transactions<T: TransactionStore>(
    store: &T,
    user_id: UserID,
    query: RangeQuery,
) -> Result<Vec<Transaction>, Error> {
    match query {
        RangeQuery::All => store.list(user_id).await,
        RangeQuery::Month { year, month } => store.by_month(user_id, year, month).await,
        RangeQuery::Year(year) => store.by_year(user_id, year).await,
        RangeQuery::Range {
            start_year,
            start_month,
            end_year,
            end_month,
        } => {
            store
                .by_range(user_id, start_year, start_month, end_year, end_month)
                .await
        }
    }
}

/// Attach category names to `transactions`.
///
/// Transactions without a category, and transactions whose category is not
/// in `categories` (e.g. it was deleted), get [OTHER_CATEGORY_NAME].
pub fn enrich(transactions: Vec<Transaction>, categories: &[Category]) -> Vec<EnrichedTransaction> {
    let lookup = category_lookup(categories);

    transactions
        .into_iter()
        .map(|transaction| enrich_one(transaction, &lookup))
        .collect()
}

pub(crate) fn category_lookup(categories: &[Category]) -> HashMap<CategoryId, &str> {
    categories
        .iter()
        .map(|category| (category.id, category.name.as_ref()))
        .collect()
}

pub(crate) fn enrich_one(
    transaction: Transaction,
    lookup: &HashMap<CategoryId, &str>,
) -> EnrichedTransaction {
    let category_name = transaction
        .category_id
        .and_then(|category_id| lookup.get(&category_id).copied());

    EnrichedTransaction {
        category_name: category_name.unwrap_or(OTHER_CATEGORY_NAME).to_owned(),
        category_resolved: category_name.is_some(),
        transaction,
    }
}
