//! Route handlers.

pub mod drivers;
pub mod health;
pub mod menu;
pub mod metrics;
pub mod orders;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path segment into an id, mapping failures to a 400 with the
/// offending segment in the details.
pub(crate) fn parse_id<T: FromStr<Err = uuid::Error>>(id: &str) -> Result<T, ApiError> {
    id.parse().map_err(|e: uuid::Error| {
        ApiError::bad_request(
            "invalid id format",
            serde_json::json!({ "id": id, "error": e.to_string() }),
        )
    })
}
