//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// Store-assigned transaction identifier.
pub type TransactionId = DatabaseId;
/// Store-assigned category identifier.
pub type CategoryId = DatabaseId;
