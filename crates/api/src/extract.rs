//! Request payload extraction with field validation.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON extractor that validates the payload before the handler runs.
///
/// Malformed bodies and failed field validation both map to a 400 with
/// per-field details, so no business logic ever sees an invalid payload.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::bad_request(
                    "invalid payload",
                    serde_json::json!({ "body": rejection.body_text() }),
                )
            })?;

        value.validate().map_err(|errors| {
            let details = serde_json::to_value(&errors).unwrap_or_default();
            ApiError::bad_request("invalid payload", details)
        })?;

        Ok(ValidatedJson(value))
    }
}
