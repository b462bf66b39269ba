use thiserror::Error;

/// Errors surfaced by the store layer.
///
/// Uniqueness violations are translated into [`StoreError::DuplicateItem`]
/// at the point they surface; raw database errors never cross the
/// unit-of-work boundary with a meaning of their own.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated. `fields` names the columns
    /// that collided, for error details shown to the caller.
    #[error("an item like this already exists ({})", .fields.join(", "))]
    DuplicateItem { fields: Vec<String> },

    /// The session was used after commit or rollback.
    #[error("store session is already closed")]
    SessionClosed,

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Persisted JSON could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Shorthand for a duplicate over the given columns.
    pub fn duplicate(fields: &[&str]) -> Self {
        StoreError::DuplicateItem {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Returns true for uniqueness conflicts.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateItem { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
