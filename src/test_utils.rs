#![allow(missing_docs)]

//! In-memory stores and fixtures for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use time::{Date, Month, OffsetDateTime, macros::datetime};

use crate::{
    Category, CategoryId, CategoryName, CategoryUpdate, Error, NewTransaction, Transaction,
    TransactionId, TransactionUpdate, UserID,
    stores::{CategoryStore, TransactionStore},
    transaction::{DateRange, month_bounds, month_range, year_bounds},
};

const CREATED_AT: OffsetDateTime = datetime!(2024-01-01 0:00 UTC);

pub(crate) fn transaction(
    id: TransactionId,
    name: &str,
    amount: f64,
    date: Date,
    category_id: Option<CategoryId>,
) -> Transaction {
    Transaction {
        id,
        user_id: UserID::new(1),
        category_id,
        name: name.to_owned(),
        amount,
        date,
        created_at: CREATED_AT,
        updated_at: CREATED_AT,
    }
}

pub(crate) fn category(id: CategoryId, name: &str) -> Category {
    Category {
        id,
        user_id: UserID::new(1),
        name: CategoryName::new_unchecked(name),
        created_at: CREATED_AT,
        updated_at: CREATED_AT,
    }
}

#[derive(Default)]
struct FakeTransactionState {
    transactions: Vec<Transaction>,
    calls: Vec<String>,
    latency: HashMap<&'static str, Duration>,
    response_delay: HashMap<&'static str, Duration>,
    failing_operations: HashSet<&'static str>,
    failing_deletes: HashSet<TransactionId>,
    fail_everything: bool,
}

/// A transaction store that keeps everything in memory, records the calls
/// made to it and can be told to be slow or to fail.
#[derive(Default)]
pub(crate) struct FakeTransactionStore {
    state: Mutex<FakeTransactionState>,
}

impl FakeTransactionStore {
    pub(crate) fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            state: Mutex::new(FakeTransactionState {
                transactions,
                ..Default::default()
            }),
        }
    }

    /// A store where every operation fails with a transport error.
    pub(crate) fn failing() -> Self {
        Self {
            state: Mutex::new(FakeTransactionState {
                fail_everything: true,
                ..Default::default()
            }),
        }
    }

    /// The calls made so far, e.g. "by_month 2024-3".
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Delay every call to `operation` (e.g. "by_year") by `latency`.
    pub(crate) fn set_latency(&self, operation: &'static str, latency: Duration) {
        self.state.lock().unwrap().latency.insert(operation, latency);
    }

    /// Make reads by `operation` take their snapshot straight away but only
    /// return it after `delay`.
    pub(crate) fn set_response_delay(&self, operation: &'static str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .response_delay
            .insert(operation, delay);
    }

    pub(crate) fn fail_operation(&self, operation: &'static str) {
        self.state
            .lock()
            .unwrap()
            .failing_operations
            .insert(operation);
    }

    pub(crate) fn fail_delete(&self, id: TransactionId) {
        self.state.lock().unwrap().failing_deletes.insert(id);
    }

    async fn begin(&self, operation: &'static str, call: String) -> Result<(), Error> {
        let (latency, should_fail) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);

            (
                state.latency.get(operation).copied(),
                state.fail_everything || state.failing_operations.contains(operation),
            )
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if should_fail {
            return Err(Error::Transport(format!("{operation} failed")));
        }

        Ok(())
    }

    async fn select(
        &self,
        operation: &'static str,
        user_id: UserID,
        range: Option<DateRange>,
    ) -> Vec<Transaction> {
        let (selected, delay) = {
            let state = self.state.lock().unwrap();
            let selected = state
                .transactions
                .iter()
                .filter(|transaction| transaction.user_id == user_id)
                .filter(|transaction| range.is_none_or(|range| range.contains(transaction.date)))
                .cloned()
                .collect();

            (selected, state.response_delay.get(operation).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        selected
    }
}

impl TransactionStore for FakeTransactionStore {
    async fn list(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.begin("list", "list".to_owned()).await?;

        Ok(self.select("list", user_id, None).await)
    }

    async fn by_month(
        &self,
        user_id: UserID,
        year: i32,
        month: Month,
    ) -> Result<Vec<Transaction>, Error> {
        self.begin("by_month", format!("by_month {year}-{}", month as u8))
            .await?;

        let range = month_bounds(year, month)?;

        Ok(self.select("by_month", user_id, Some(range)).await)
    }

    async fn by_year(&self, user_id: UserID, year: i32) -> Result<Vec<Transaction>, Error> {
        self.begin("by_year", format!("by_year {year}")).await?;

        let range = year_bounds(year)?;

        Ok(self.select("by_year", user_id, Some(range)).await)
    }

    async fn by_range(
        &self,
        user_id: UserID,
        start_year: i32,
        start_month: Month,
        end_year: i32,
        end_month: Month,
    ) -> Result<Vec<Transaction>, Error> {
        self.begin(
            "by_range",
            format!(
                "by_range {start_year}-{}..{end_year}-{}",
                start_month as u8, end_month as u8
            ),
        )
        .await?;
        let range = month_range(start_year, start_month, end_year, end_month)?;

        Ok(self.select("by_range", user_id, Some(range)).await)
    }

    async fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.begin("get", format!("get {id}")).await?;

        self.state
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|transaction| transaction.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        self.begin("create", format!("create {}", new_transaction.name()))
            .await?;

        let mut state = self.state.lock().unwrap();
        let id = state
            .transactions
            .iter()
            .map(|transaction| transaction.id)
            .max()
            .unwrap_or(0)
            + 1;
        let transaction = Transaction {
            id,
            user_id: new_transaction.user_id(),
            category_id: new_transaction.category_id(),
            name: new_transaction.name().to_owned(),
            amount: new_transaction.amount(),
            date: new_transaction.date(),
            created_at: CREATED_AT,
            updated_at: CREATED_AT,
        };
        state.transactions.push(transaction.clone());

        Ok(transaction)
    }

    async fn update(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error> {
        self.begin("update", format!("update {id}")).await?;

        let mut state = self.state.lock().unwrap();
        let transaction = state
            .transactions
            .iter_mut()
            .find(|transaction| transaction.id == id)
            .ok_or(Error::NotFound)?;
        update.apply_to(transaction);

        Ok(transaction.clone())
    }

    async fn delete(&self, id: TransactionId) -> Result<(), Error> {
        self.begin("delete", format!("delete {id}")).await?;

        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(&id) {
            return Err(Error::Transport(format!("delete {id} failed")));
        }

        let before = state.transactions.len();
        state.transactions.retain(|transaction| transaction.id != id);

        if state.transactions.len() == before {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }
}

/// A category store that keeps everything in memory.
#[derive(Default)]
pub(crate) struct FakeCategoryStore {
    categories: Mutex<Vec<Category>>,
    fail_everything: bool,
}

impl FakeCategoryStore {
    pub(crate) fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories: Mutex::new(categories),
            fail_everything: false,
        }
    }

    /// A store where every operation fails with a transport error.
    pub(crate) fn failing() -> Self {
        Self {
            categories: Mutex::default(),
            fail_everything: true,
        }
    }

    fn check(&self, operation: &str) -> Result<(), Error> {
        if self.fail_everything {
            Err(Error::Transport(format!("{operation} failed")))
        } else {
            Ok(())
        }
    }
}

impl CategoryStore for FakeCategoryStore {
    async fn list(&self, user_id: UserID) -> Result<Vec<Category>, Error> {
        self.check("list")?;

        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|category| category.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: CategoryId) -> Result<Category, Error> {
        self.check("get")?;

        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|category| category.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn create(&self, user_id: UserID, name: CategoryName) -> Result<Category, Error> {
        self.check("create")?;

        let mut categories = self.categories.lock().unwrap();
        let id = categories
            .iter()
            .map(|category| category.id)
            .max()
            .unwrap_or(0)
            + 1;
        let category = Category {
            id,
            user_id,
            name,
            created_at: CREATED_AT,
            updated_at: CREATED_AT,
        };
        categories.push(category.clone());

        Ok(category)
    }

    async fn update(&self, id: CategoryId, update: CategoryUpdate) -> Result<Category, Error> {
        self.check("update")?;

        let mut categories = self.categories.lock().unwrap();
        let category = categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or(Error::NotFound)?;

        if let Some(name) = update.name {
            category.name = name;
        }

        Ok(category.clone())
    }

    async fn delete(&self, id: CategoryId) -> Result<(), Error> {
        self.check("delete")?;

        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|category| category.id != id);

        if categories.len() == before {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }
}
