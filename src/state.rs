//! The in-memory transaction and category lists behind the transactions table.
//!
//! All methods are synchronous: every change to the lists, the display
//! options and the selection happens in a single step, so a fetch completing
//! in the background can never observe (or produce) a half-applied update.

use std::collections::BTreeSet;

use crate::{
    Category, CategoryId, Transaction, TransactionId,
    transaction::{
        CategoryFilter, DateWindow, DisplayOptions, EnrichedTransaction, SortKey, SortState,
        WindowData, category_lookup, enrich, enrich_one, total,
    },
};

/// Identifies a fetch so that its result can be matched to the request that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    generation: u64,
    window: DateWindow,
}

impl RequestToken {
    /// The window that the request was issued for.
    pub fn window(&self) -> DateWindow {
        self.window
    }
}

/// Local state for the transactions table.
///
/// The selection is always a subset of the displayed transactions. It is
/// cleared whenever the displayed set changes because of a new filter, a
/// refetch or a successful delete.
#[derive(Debug, Default)]
pub struct TransactionState {
    transactions: Vec<EnrichedTransaction>,
    categories: Vec<Category>,
    window: Option<DateWindow>,
    options: DisplayOptions,
    selected: BTreeSet<TransactionId>,
    generation: u64,
    /// IDs confirmed deleted since the latest request was issued. Its
    /// response may have been read before the deletes happened.
    deleted_since_request: BTreeSet<TransactionId>,
}

impl TransactionState {
    /// Create an empty state with no window loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new fetch for `window`.
    ///
    /// Any fetch started before this one becomes stale.
    pub fn begin_request(&mut self, window: DateWindow) -> RequestToken {
        self.generation += 1;
        self.deleted_since_request.clear();

        RequestToken {
            generation: self.generation,
            window,
        }
    }

    /// Whether `token` belongs to the most recent request.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        token.generation == self.generation
    }

    /// Replace the lists with the result of the request identified by `token`.
    ///
    /// Transactions confirmed deleted while the request was in flight are
    /// left out. Returns `false`, leaving the state untouched, if a newer
    /// request has been issued since.
    pub fn apply_loaded(&mut self, token: RequestToken, data: WindowData) -> bool {
        if !self.is_current(&token) {
            tracing::warn!(
                "Discarding stale response for {} (request {}, latest {})",
                token.window.label(),
                token.generation,
                self.generation
            );
            return false;
        }

        let mut transactions = data.transactions;
        if !self.deleted_since_request.is_empty() {
            transactions.retain(|transaction| {
                !self
                    .deleted_since_request
                    .contains(&transaction.transaction.id)
            });
            self.deleted_since_request.clear();
        }

        self.transactions = transactions;
        self.categories = data.categories;
        self.window = Some(token.window);
        self.selected.clear();

        true
    }

    /// The window that the current lists were loaded for.
    pub fn window(&self) -> Option<DateWindow> {
        self.window
    }

    /// Every loaded transaction, in store order.
    pub fn transactions(&self) -> &[EnrichedTransaction] {
        &self.transactions
    }

    /// The user's categories.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The active filter, search and sort.
    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    /// The loaded transactions after filtering, searching and sorting.
    pub fn displayed(&self) -> Vec<EnrichedTransaction> {
        self.options.apply(&self.transactions)
    }

    /// The sum of the displayed amounts.
    pub fn total(&self) -> f64 {
        total(&self.displayed())
    }

    /// Change the category filter, clearing the selection.
    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        if self.options.category != filter {
            self.options.category = filter;
            self.selected.clear();
        }
    }

    /// Change the search text, clearing the selection.
    pub fn set_search(&mut self, query: &str) {
        if self.options.search != query {
            self.options.search = query.to_owned();
            self.selected.clear();
        }
    }

    /// Sort by `key`, flipping the direction if it is already the sort key.
    ///
    /// Sorting only reorders the displayed set, so the selection is kept.
    pub fn toggle_sort(&mut self, key: SortKey) -> SortState {
        self.options.sort = self.options.sort.toggle(key);
        self.options.sort
    }

    /// Set the sort order directly. The selection is kept.
    pub fn set_sort(&mut self, sort: SortState) {
        self.options.sort = sort;
    }

    /// The IDs of the selected transactions.
    pub fn selected(&self) -> &BTreeSet<TransactionId> {
        &self.selected
    }

    /// Select or deselect `id`.
    ///
    /// Returns whether the transaction is selected afterwards. IDs that are
    /// not displayed cannot be selected.
    pub fn toggle_selected(&mut self, id: TransactionId) -> bool {
        if self.selected.remove(&id) {
            return false;
        }

        if self.is_displayed(id) {
            self.selected.insert(id);
            true
        } else {
            false
        }
    }

    /// Select every displayed transaction.
    pub fn select_all(&mut self) {
        self.selected = self
            .displayed()
            .iter()
            .map(|transaction| transaction.transaction.id)
            .collect();
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Merge a saved transaction into the list.
    ///
    /// An existing transaction with the same ID is replaced in place,
    /// otherwise the transaction is added to the front. Selected IDs that are
    /// no longer displayed afterwards are deselected.
    pub fn upsert(&mut self, transaction: Transaction) {
        let lookup = category_lookup(&self.categories);
        let enriched = enrich_one(transaction, &lookup);

        match self
            .transactions
            .iter_mut()
            .find(|existing| existing.transaction.id == enriched.transaction.id)
        {
            Some(existing) => *existing = enriched,
            None => self.transactions.insert(0, enriched),
        }

        self.prune_selection();
    }

    /// Remove the transactions the store confirmed as deleted.
    ///
    /// The lists and the selection are updated together: if anything was
    /// removed the displayed set changed, so the selection is cleared. Returns
    /// the number of transactions removed from the list.
    pub fn remove_confirmed(&mut self, ids: &[TransactionId]) -> usize {
        if ids.is_empty() {
            return 0;
        }

        self.deleted_since_request.extend(ids.iter().copied());

        let before = self.transactions.len();
        self.transactions
            .retain(|transaction| !ids.contains(&transaction.transaction.id));

        let removed = before - self.transactions.len();
        if removed > 0 {
            self.selected.clear();
        }

        removed
    }

    /// Merge a saved category into the list and refresh the category names.
    pub fn upsert_category(&mut self, category: Category) {
        match self
            .categories
            .iter_mut()
            .find(|existing| existing.id == category.id)
        {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }

        self.reenrich();
    }

    /// Remove a deleted category. Its transactions fall back to "Other".
    pub fn remove_category(&mut self, id: CategoryId) {
        self.categories.retain(|category| category.id != id);

        if self.options.category == CategoryFilter::Category(id) {
            self.options.category = CategoryFilter::All;
            self.selected.clear();
        }

        self.reenrich();
    }

    fn reenrich(&mut self) {
        let transactions = std::mem::take(&mut self.transactions)
            .into_iter()
            .map(|enriched| enriched.transaction)
            .collect();

        self.transactions = enrich(transactions, &self.categories);
        self.prune_selection();
    }

    fn is_displayed(&self, id: TransactionId) -> bool {
        self.displayed()
            .iter()
            .any(|transaction| transaction.transaction.id == id)
    }

    fn prune_selection(&mut self) {
        if self.selected.is_empty() {
            return;
        }

        let displayed: BTreeSet<TransactionId> = self
            .displayed()
            .iter()
            .map(|transaction| transaction.transaction.id)
            .collect();

        self.selected.retain(|id| displayed.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use time::{Month, macros::date};

    use crate::{
        test_utils::{category, transaction},
        transaction::{CategoryFilter, DateWindow, SortKey, SortState, WindowData, enrich},
    };

    use super::TransactionState;

    fn loaded_state() -> TransactionState {
        let categories = vec![category(1, "Food"), category(2, "Housing")];
        let transactions = enrich(
            vec![
                transaction(3, "Coffee", 4.5, date!(2024 - 03 - 02), Some(1)),
                transaction(7, "Rent", 1200.0, date!(2024 - 03 - 01), Some(2)),
                transaction(9, "Bus", 3.5, date!(2024 - 03 - 03), None),
            ],
            &categories,
        );

        let mut state = TransactionState::new();
        let token = state.begin_request(DateWindow::Year(2024));
        assert!(state.apply_loaded(
            token,
            WindowData {
                transactions,
                categories
            }
        ));

        state
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut state = TransactionState::new();
        let year = state.begin_request(DateWindow::Year(2024));
        let month = state.begin_request(DateWindow::Month {
            year: 2024,
            month: Month::March,
        });

        let month_data = WindowData {
            transactions: enrich(
                vec![transaction(1, "March", 1.0, date!(2024 - 03 - 01), None)],
                &[],
            ),
            categories: vec![],
        };
        let year_data = WindowData {
            transactions: enrich(
                vec![
                    transaction(1, "March", 1.0, date!(2024 - 03 - 01), None),
                    transaction(2, "June", 1.0, date!(2024 - 06 - 01), None),
                ],
                &[],
            ),
            categories: vec![],
        };

        assert!(state.apply_loaded(month, month_data));
        assert!(!state.apply_loaded(year, year_data));

        assert_eq!(state.transactions().len(), 1);
        assert_eq!(
            state.window(),
            Some(DateWindow::Month {
                year: 2024,
                month: Month::March
            })
        );
    }

    #[test]
    fn refetch_clears_selection() {
        let mut state = loaded_state();
        state.toggle_selected(3);

        let token = state.begin_request(DateWindow::LastDays(NonZeroU32::new(7).unwrap()));
        state.apply_loaded(token, WindowData::default());

        assert!(state.selected().is_empty());
    }

    #[test]
    fn selection_is_limited_to_displayed_transactions() {
        let mut state = loaded_state();
        state.set_category_filter(CategoryFilter::Category(1));

        assert!(!state.toggle_selected(7), "7 is not displayed");
        assert!(state.toggle_selected(3));
        assert!(!state.toggle_selected(3), "second toggle deselects");
        assert!(!state.toggle_selected(404));
        assert!(state.selected().is_empty());
    }

    #[test]
    fn filter_change_clears_selection() {
        let mut state = loaded_state();
        state.select_all();
        assert_eq!(state.selected().len(), 3);

        state.set_search("co");

        assert!(state.selected().is_empty());
        assert_eq!(state.displayed().len(), 1);
    }

    #[test]
    fn sort_keeps_selection() {
        let mut state = loaded_state();
        state.toggle_selected(9);

        state.toggle_sort(SortKey::Amount);

        assert!(state.selected().contains(&9));
        let ids: Vec<_> = state
            .displayed()
            .iter()
            .map(|t| t.transaction.id)
            .collect();
        assert_eq!(ids, vec![9, 3, 7]);

        state.set_sort(SortState::descending(SortKey::Name));

        assert!(state.selected().contains(&9));
        let ids: Vec<_> = state
            .displayed()
            .iter()
            .map(|t| t.transaction.id)
            .collect();
        assert_eq!(ids, vec![7, 3, 9]);
    }

    #[test]
    fn total_uses_displayed_set() {
        let mut state = loaded_state();
        assert_eq!(state.total(), 1208.0);

        state.set_category_filter(CategoryFilter::Uncategorized);

        assert_eq!(state.total(), 3.5);
    }

    #[test]
    fn remove_confirmed_updates_everything_together() {
        let mut state = loaded_state();
        state.select_all();

        let removed = state.remove_confirmed(&[3, 9]);

        assert_eq!(removed, 2);
        let ids: Vec<_> = state
            .displayed()
            .iter()
            .map(|t| t.transaction.id)
            .collect();
        assert_eq!(ids, vec![7]);
        assert!(state.selected().is_empty());
    }

    #[test]
    fn remove_nothing_keeps_selection() {
        let mut state = loaded_state();
        state.toggle_selected(7);

        assert_eq!(state.remove_confirmed(&[]), 0);
        assert!(state.selected().contains(&7));
    }

    #[test]
    fn response_read_before_delete_does_not_restore_deleted() {
        let mut state = loaded_state();
        let token = state.begin_request(DateWindow::Year(2024));
        let fetched = WindowData {
            transactions: state.transactions().to_vec(),
            categories: state.categories().to_vec(),
        };

        assert_eq!(state.remove_confirmed(&[3]), 1);
        assert!(state.apply_loaded(token, fetched));

        let ids: Vec<_> = state
            .transactions()
            .iter()
            .map(|t| t.transaction.id)
            .collect();
        assert_eq!(ids, vec![7, 9]);
    }

    #[test]
    fn deletes_before_a_request_do_not_hide_its_results() {
        let mut state = loaded_state();
        state.remove_confirmed(&[3]);

        let token = state.begin_request(DateWindow::Year(2024));
        let categories = vec![category(1, "Food")];
        let transactions = enrich(
            vec![transaction(3, "Coffee", 4.5, date!(2024 - 03 - 02), Some(1))],
            &categories,
        );
        assert!(state.apply_loaded(
            token,
            WindowData {
                transactions,
                categories
            }
        ));

        assert_eq!(state.transactions().len(), 1);
    }

    #[test]
    fn upsert_replaces_existing_and_prepends_new() {
        let mut state = loaded_state();

        state.upsert(transaction(7, "Rent", 1250.0, date!(2024 - 03 - 01), Some(2)));
        state.upsert(transaction(10, "Lunch", 12.0, date!(2024 - 03 - 04), Some(1)));

        let got: Vec<_> = state
            .transactions()
            .iter()
            .map(|t| (t.transaction.id, t.transaction.amount, t.category_name.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                (10, 12.0, "Food".to_owned()),
                (3, 4.5, "Food".to_owned()),
                (7, 1250.0, "Housing".to_owned()),
                (9, 3.5, "Other".to_owned()),
            ]
        );
    }

    #[test]
    fn upsert_deselects_transactions_that_leave_the_filter() {
        let mut state = loaded_state();
        state.set_category_filter(CategoryFilter::Category(1));
        state.toggle_selected(3);

        state.upsert(transaction(3, "Coffee", 4.5, date!(2024 - 03 - 02), None));

        assert!(state.selected().is_empty());
    }

    #[test]
    fn removing_a_category_falls_back_to_other() {
        let mut state = loaded_state();
        state.set_category_filter(CategoryFilter::Category(2));

        state.remove_category(2);

        assert_eq!(state.options().category, CategoryFilter::All);
        let rent = state
            .transactions()
            .iter()
            .find(|t| t.transaction.id == 7)
            .unwrap();
        assert_eq!(rent.category_name, "Other");
        assert!(rent.is_uncategorized());
    }

    #[test]
    fn renaming_a_category_updates_names() {
        let mut state = loaded_state();
        let mut renamed = category(1, "Eating");
        renamed.user_id = state.categories()[0].user_id;

        state.upsert_category(renamed);

        let coffee = state
            .transactions()
            .iter()
            .find(|t| t.transaction.id == 3)
            .unwrap();
        assert_eq!(coffee.category_name, "Eating");
        assert_eq!(state.categories().len(), 2);
    }
}
