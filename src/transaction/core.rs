//! Defines the core data models for transactions and the types used to create or change them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, OffsetDateTime, macros::format_description};

use crate::{CategoryId, TransactionId, UserID, ValidationError};

// ============================================================================
// MODELS
// ============================================================================

/// An expense, i.e. an event where money was spent.
///
/// Transactions are created by a store from a [NewTransaction], use
/// [Transaction::build] to create one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the store.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The ID of the category the transaction belongs to.
    ///
    /// This may refer to a category that has since been deleted.
    pub category_id: Option<CategoryId>,
    /// A short description of what the money was spent on.
    pub name: String,
    /// The amount of money spent.
    pub amount: f64,
    /// When the transaction happened.
    #[serde(with = "calendar_date")]
    pub date: Date,
    /// When the store created the transaction.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the store last modified the transaction.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(name: &str, amount: f64) -> TransactionBuilder {
        TransactionBuilder {
            name: name.to_owned(),
            amount,
            date: None,
            category_id: None,
        }
    }
}

/// A builder for creating [NewTransaction] instances.
///
/// # Examples
///
/// ```
/// use time::macros::date;
///
/// use expense_tracker::{Transaction, UserID};
///
/// let new_transaction = Transaction::build("Groceries", 45.99)
///     .date(date!(2025 - 01 - 15))
///     .category_id(Some(3))
///     .finalize(UserID::new(1))
///     .unwrap();
///
/// assert_eq!(new_transaction.name(), "Groceries");
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    name: String,
    amount: f64,
    date: Option<Date>,
    category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the date the transaction happened on.
    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Validate the builder and assign the transaction to `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [ValidationError::EmptyName] if the name is empty or only whitespace,
    /// - [ValidationError::NonPositiveAmount] if the amount is not greater than zero,
    /// - or [ValidationError::MissingDate] if no date was set.
    pub fn finalize(self, user_id: UserID) -> Result<NewTransaction, ValidationError> {
        let name = validate_name(&self.name)?;
        let amount = validate_amount(self.amount)?;
        let date = self.date.ok_or(ValidationError::MissingDate)?;

        Ok(NewTransaction {
            user_id,
            name,
            amount,
            date,
            category_id: self.category_id,
        })
    }
}

/// A validated transaction that has not been saved to a store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    user_id: UserID,
    name: String,
    amount: f64,
    date: Date,
    category_id: Option<CategoryId>,
}

impl NewTransaction {
    /// The user that will own the transaction.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// The trimmed, non-empty name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The amount, always greater than zero.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// When the transaction happened.
    pub fn date(&self) -> Date {
        self.date
    }

    /// The category the transaction belongs to, if any.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }
}

/// A partial update to a transaction. Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    /// The new name.
    pub name: Option<String>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new date.
    #[serde(default, with = "optional_calendar_date")]
    pub date: Option<Date>,
    /// `Some(None)` removes the category, `Some(Some(id))` assigns one.
    pub category_id: Option<Option<CategoryId>>,
}

impl TransactionUpdate {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.category_id.is_none()
    }

    /// Check the fields that are set with the same rules used on creation.
    ///
    /// Names are trimmed in place.
    ///
    /// # Errors
    /// Returns [ValidationError::EmptyName] or [ValidationError::NonPositiveAmount].
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name(name)?);
        }

        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        Ok(self)
    }

    /// Apply the set fields to `transaction`.
    pub fn apply_to(&self, transaction: &mut Transaction) {
        if let Some(name) = &self.name {
            transaction.name = name.clone();
        }

        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }

        if let Some(date) = self.date {
            transaction.date = date;
        }

        if let Some(category_id) = self.category_id {
            transaction.category_id = category_id;
        }
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        Err(ValidationError::EmptyName)
    } else {
        Ok(name.to_owned())
    }
}

fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    // Written this way so that NaN is rejected too.
    if amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::NonPositiveAmount)
    }
}

// ============================================================================
// DATE FORMAT
// ============================================================================

/// Parse a `YYYY-MM-DD` date, optionally followed by a time of day.
///
/// The time of day is discarded since windows and sorting work on whole days.
pub fn parse_calendar_date(text: &str) -> Result<Date, ValidationError> {
    let text = text.trim();
    let (date_part, rest) = match (text.get(..10), text.get(10..)) {
        (Some(date_part), Some(rest)) => (date_part, rest),
        _ => (text, ""),
    };

    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return Err(ValidationError::InvalidDate(text.to_owned()));
    }

    Date::parse(date_part, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate(text.to_owned()))
}

fn format_calendar_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

mod calendar_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_calendar_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_calendar_date(&text).map_err(serde::de::Error::custom)
    }
}

mod optional_calendar_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&format_calendar_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| parse_calendar_date(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ============================================================================
// TESTS
// ============================================================================
