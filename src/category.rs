//! This file defines the `Category` type and the types needed to create or rename a category.
//! A category groups transactions, however a transaction may only have one category.

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::{CategoryId, UserID, ValidationError};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash, PartialOrd, Ord)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();

        if name.is_empty() {
            Err(ValidationError::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the non-empty invariant is violated it will cause incorrect
    /// behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for CategoryName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CategoryName::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// A category for expenses, e.g., 'Groceries', 'Eating Out', 'Rent'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The id of the category.
    pub id: CategoryId,

    /// The user that owns the category.
    pub user_id: UserID,

    /// The name of the category.
    pub name: CategoryName,

    /// When the store created the category.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the store last modified the category.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields of a category that may be changed after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    /// The new name, if it should change.
    pub name: Option<CategoryName>,
}

#[cfg(test)]
mod tests {
    use crate::{ValidationError, category::CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        let category_name = CategoryName::new("");

        assert_eq!(category_name, Err(ValidationError::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_whitespace() {
        let category_name = CategoryName::new("   ");

        assert_eq!(category_name, Err(ValidationError::EmptyCategoryName));
    }

    #[test]
    fn new_trims_name() {
        let category_name = CategoryName::new("  Groceries ").unwrap();

        assert_eq!(category_name.as_ref(), "Groceries");
    }

    #[test]
    fn deserialize_rejects_empty_name() {
        let result = serde_json::from_str::<CategoryName>("\"\"");

        assert!(result.is_err(), "want error for empty name, got {result:?}");
    }
}
