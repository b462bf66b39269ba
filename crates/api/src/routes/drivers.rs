//! Driver endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::DriverId;
use domain::drivers;
use serde::{Deserialize, Serialize};
use store::{Driver, DriverStatus, NewDriver, SessionFactory};
use validator::Validate;

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::AppState;

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "phone_number is required"))]
    pub phone_number: String,
    pub status: DriverStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct DriverResponse {
    pub id: DriverId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub status: DriverStatus,
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            created: driver.created,
            updated: driver.updated,
            first_name: driver.first_name,
            last_name: driver.last_name,
            phone_number: driver.phone_number,
            status: driver.status,
        }
    }
}

// -- Handlers --

/// GET /drivers — list all drivers.
#[tracing::instrument(skip(state))]
pub async fn list<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<Vec<DriverResponse>>, ApiError> {
    let mut uow = state.unit_of_work().await?;
    let all = drivers::list_drivers(&mut uow).await?;
    Ok(Json(all.into_iter().map(DriverResponse::from).collect()))
}

/// POST /drivers — register a driver. A duplicate phone number is a 400.
#[tracing::instrument(skip(state, req))]
pub async fn create<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    ValidatedJson(req): ValidatedJson<CreateDriverRequest>,
) -> Result<(StatusCode, Json<DriverResponse>), ApiError> {
    let mut uow = state.unit_of_work().await?;
    let driver = drivers::create_driver(
        NewDriver {
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
            status: req.status,
        },
        &mut uow,
    )
    .await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(driver.into())))
}
