//! Menu item and add-on endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{AddOnId, MenuItemId, Money};
use domain::catalog;
use serde::{Deserialize, Serialize};
use store::{AddOn, AddOnUpdate, MenuItem, MenuItemUpdate, NewAddOn, NewMenuItem, SessionFactory};
use validator::Validate;

use super::parse_id;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::AppState;

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub price: Money,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub price: Option<Money>,
}

#[derive(Deserialize, Validate)]
pub struct CreateAddOnRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateAddOnRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
}

// -- Response types --

#[derive(Serialize)]
pub struct AddOnResponse {
    pub id: AddOnId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
}

impl From<AddOn> for AddOnResponse {
    fn from(addon: AddOn) -> Self {
        Self {
            id: addon.id,
            created: addon.created,
            updated: addon.updated,
            name: addon.name,
            description: addon.description,
            price: addon.price,
        }
    }
}

#[derive(Serialize)]
pub struct MenuItemResponse {
    pub id: MenuItemId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub size: String,
    pub price: Money,
    pub addons: Vec<AddOnResponse>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            created: item.created,
            updated: item.updated,
            name: item.name,
            description: item.description,
            size: item.size,
            price: item.price,
            addons: item.addons.into_iter().map(AddOnResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// GET /menuitems — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list_menu_items<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let mut uow = state.unit_of_work().await?;
    let items = catalog::list_menu_items(&mut uow).await?;
    Ok(Json(items.into_iter().map(MenuItemResponse::from).collect()))
}

/// POST /menuitems — create a menu item.
#[tracing::instrument(skip(state, req))]
pub async fn create_menu_item<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    ValidatedJson(req): ValidatedJson<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let mut uow = state.unit_of_work().await?;
    let item = catalog::create_menu_item(
        NewMenuItem {
            name: req.name,
            description: req.description,
            size: req.size.unwrap_or_default(),
            price: req.price,
        },
        &mut uow,
    )
    .await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /menuitems/{id} — fetch one menu item.
#[tracing::instrument(skip(state))]
pub async fn get_menu_item<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let id: MenuItemId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;
    let item = catalog::get_menu_item(id, &mut uow)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("menu item {id} doesn't exist")))?;
    Ok(Json(item.into()))
}

/// PUT /menuitems/{id} — partial update. Uniqueness conflicts are 403.
#[tracing::instrument(skip(state, req))]
pub async fn update_menu_item<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let id: MenuItemId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;
    let item = catalog::update_menu_item(
        id,
        MenuItemUpdate {
            name: req.name,
            description: req.description,
            size: req.size,
            price: req.price,
        },
        &mut uow,
    )
    .await
    .map_err(ApiError::from_store_update)?
    .ok_or_else(|| ApiError::not_found(format!("menu item {id} doesn't exist")))?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /menuitems/{id}/addons — list the add-ons of one menu item.
#[tracing::instrument(skip(state))]
pub async fn list_menu_item_addons<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AddOnResponse>>, ApiError> {
    let id: MenuItemId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;
    let item = catalog::get_menu_item(id, &mut uow)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("menu item {id} doesn't exist")))?;
    Ok(Json(
        item.addons.into_iter().map(AddOnResponse::from).collect(),
    ))
}

/// POST /menuitems/{id}/addons — fetch-or-create an add-on and associate
/// it with the menu item.
#[tracing::instrument(skip(state, req))]
pub async fn create_menu_item_addon<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateAddOnRequest>,
) -> Result<(StatusCode, Json<AddOnResponse>), ApiError> {
    let id: MenuItemId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;

    let item = catalog::get_menu_item(id, &mut uow)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("menu item {id} doesn't exist")))?;

    let addon = catalog::add_addon_to_menu_item(
        item.id,
        NewAddOn {
            name: req.name,
            description: req.description,
            price: req.price,
        },
        &mut uow,
    )
    .await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(addon.into())))
}

/// GET /addons — list all add-ons.
#[tracing::instrument(skip(state))]
pub async fn list_addons<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<Vec<AddOnResponse>>, ApiError> {
    let mut uow = state.unit_of_work().await?;
    let addons = catalog::list_addons(&mut uow).await?;
    Ok(Json(addons.into_iter().map(AddOnResponse::from).collect()))
}

/// GET /addons/{id} — fetch one add-on.
#[tracing::instrument(skip(state))]
pub async fn get_addon<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
) -> Result<Json<AddOnResponse>, ApiError> {
    let id: AddOnId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;
    let addon = catalog::get_addon(id, &mut uow)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("add-on {id} doesn't exist")))?;
    Ok(Json(addon.into()))
}

/// PUT /addons/{id} — partial update. Uniqueness conflicts are 403.
#[tracing::instrument(skip(state, req))]
pub async fn update_addon<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateAddOnRequest>,
) -> Result<(StatusCode, Json<AddOnResponse>), ApiError> {
    let id: AddOnId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;
    let addon = catalog::update_addon(
        id,
        AddOnUpdate {
            name: req.name,
            description: req.description,
            price: req.price,
        },
        &mut uow,
    )
    .await
    .map_err(ApiError::from_store_update)?
    .ok_or_else(|| ApiError::not_found(format!("add-on {id} doesn't exist")))?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(addon.into())))
}
