//! Local filtering, searching and sorting of enriched transactions.
//!
//! The refinements are applied in a fixed order: category filter, then text
//! search, then sort. None of them mutate their input.

use std::{cmp::Ordering, str::FromStr};

use crate::{CategoryId, ValidationError};

use super::aggregate::{EnrichedTransaction, OTHER_CATEGORY_NAME};

/// Which categories to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Show every transaction.
    #[default]
    All,
    /// Show transactions assigned to this category, as long as it exists.
    Category(CategoryId),
    /// Show transactions that have no resolvable category.
    Uncategorized,
}

impl CategoryFilter {
    /// Whether `transaction` passes the filter.
    pub fn matches(&self, transaction: &EnrichedTransaction) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(id) => {
                transaction.category_resolved && transaction.transaction.category_id == Some(*id)
            }
            CategoryFilter::Uncategorized => transaction.is_uncategorized(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ValidationError;

    /// Parse "all", "Other" or a category ID.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();

        if text.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else if text.eq_ignore_ascii_case(OTHER_CATEGORY_NAME) {
            Ok(CategoryFilter::Uncategorized)
        } else {
            text.parse()
                .map(CategoryFilter::Category)
                .map_err(|_| ValidationError::InvalidCategoryFilter(text.to_owned()))
        }
    }
}

/// The field to sort transactions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Chronological order.
    Date,
    /// Numeric order of the amount.
    Amount,
    /// Alphabetical order of the name.
    Name,
    /// Alphabetical order of the category display name.
    Category,
}

/// The direction to sort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// The active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    /// The field being sorted by.
    pub key: SortKey,
    /// The direction of the sort.
    pub direction: SortDirection,
}

impl SortState {
    /// Sort by `key` in ascending order.
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Sort by `key` in descending order.
    pub fn descending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    /// Selecting the current key flips the direction, a new key starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key != key {
            return Self::ascending(key);
        }

        match self.direction {
            SortDirection::Ascending => Self::descending(key),
            SortDirection::Descending => Self::ascending(key),
        }
    }
}

impl Default for SortState {
    /// Newest transactions first.
    fn default() -> Self {
        Self::descending(SortKey::Date)
    }
}

/// The combined local refinements for the transaction table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// The category filter.
    pub category: CategoryFilter,
    /// Case-insensitive text to look for in transaction names.
    pub search: String,
    /// The sort order.
    pub sort: SortState,
}

impl DisplayOptions {
    /// Apply the category filter, then the search, then the sort.
    pub fn apply(&self, transactions: &[EnrichedTransaction]) -> Vec<EnrichedTransaction> {
        let filtered = filter_by_category(transactions, self.category);
        let searched = search_by_name(&filtered, &self.search);

        sort_transactions(&searched, self.sort)
    }
}

/// Keep the transactions that pass `filter`.
pub fn filter_by_category(
    transactions: &[EnrichedTransaction],
    filter: CategoryFilter,
) -> Vec<EnrichedTransaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction))
        .cloned()
        .collect()
}

/// Keep the transactions whose name contains `query`, ignoring case.
///
/// An empty (or whitespace only) query keeps everything.
pub fn search_by_name(
    transactions: &[EnrichedTransaction],
    query: &str,
) -> Vec<EnrichedTransaction> {
    let query = query.trim().to_lowercase();

    if query.is_empty() {
        return transactions.to_vec();
    }

    transactions
        .iter()
        .filter(|transaction| transaction.transaction.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Return a sorted copy of `transactions`.
///
/// The sort is stable in both directions: transactions with equal keys keep
/// their original relative order.
pub fn sort_transactions(
    transactions: &[EnrichedTransaction],
    sort: SortState,
) -> Vec<EnrichedTransaction> {
    let mut sorted = transactions.to_vec();

    sorted.sort_by(|a, b| {
        let ordering = compare_by_key(a, b, sort.key);

        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    sorted
}

fn compare_by_key(a: &EnrichedTransaction, b: &EnrichedTransaction, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.transaction.date.cmp(&b.transaction.date),
        SortKey::Amount => a.transaction.amount.total_cmp(&b.transaction.amount),
        SortKey::Name => compare_text(&a.transaction.name, &b.transaction.name),
        SortKey::Category => compare_text(&a.category_name, &b.category_name),
    }
}

/// Case-insensitive comparison so that "apple" sorts next to "Apple" rather
/// than after "Zebra". Text that only differs by case is equal, which keeps the
/// sort stable for it.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// The sum of `amount` over `transactions`.
pub fn total(transactions: &[EnrichedTransaction]) -> f64 {
    transactions
        .iter()
        .map(|transaction| transaction.transaction.amount)
        .sum()
}

/// Totals per category display name, largest first.
pub fn totals_by_category(transactions: &[EnrichedTransaction]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();

    for transaction in transactions {
        match totals
            .iter_mut()
            .find(|(name, _)| *name == transaction.category_name)
        {
            Some((_, total)) => *total += transaction.transaction.amount,
            None => totals.push((
                transaction.category_name.clone(),
                transaction.transaction.amount,
            )),
        }
    }

    totals.sort_by(|(a_name, a_total), (b_name, b_total)| {
        b_total.total_cmp(a_total).then_with(|| a_name.cmp(b_name))
    });

    totals
}
