//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use domain::orders;
use domain::OrderRequest;
use serde::{Deserialize, Serialize};
use store::{
    CustomerInfo, Order, OrderAddOnRequest, OrderItemRequest, OrderStatus, SessionFactory,
};
use validator::Validate;

use super::parse_id;
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::AppState;

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "phone_number is required"))]
    pub phone_number: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "zip is required"))]
    pub zip: String,
}

impl From<CustomerPayload> for CustomerInfo {
    fn from(customer: CustomerPayload) -> Self {
        Self {
            first_name: customer.first_name,
            last_name: customer.last_name,
            phone_number: customer.phone_number,
            email: customer.email,
            address: customer.address,
            city: customer.city,
            state: customer.state,
            zip: customer.zip,
        }
    }
}

#[derive(Deserialize, Serialize)]
pub struct OrderAddOnPayload {
    pub name: String,
}

#[derive(Deserialize, Serialize, Validate)]
pub struct OrderItemPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub size: Option<String>,
    #[serde(default)]
    pub addons: Vec<OrderAddOnPayload>,
}

impl From<OrderItemPayload> for OrderItemRequest {
    fn from(item: OrderItemPayload) -> Self {
        Self {
            name: item.name,
            size: item.size,
            addons: item
                .addons
                .into_iter()
                .map(|addon| OrderAddOnRequest { name: addon.name })
                .collect(),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(nested)]
    pub customer: CustomerPayload,
    #[validate(length(min = 1, message = "items must be added to an order"), nested)]
    pub items: Vec<OrderItemPayload>,
    pub delivery_fee: Option<Money>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer: CustomerInfo,
    pub items: Vec<OrderItemRequest>,
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total = order.total();
        Self {
            id: order.id,
            created: order.created,
            updated: order.updated,
            status: order.status,
            customer: order.customer,
            items: order.items,
            subtotal: order.subtotal,
            tax: order.tax,
            delivery_fee: order.delivery_fee,
            total,
        }
    }
}

// -- Handlers --

/// POST /orders — compose, price and persist a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let request = OrderRequest {
        customer: req.customer.into(),
        items: req.items.into_iter().map(OrderItemRequest::from).collect(),
        delivery_fee: req.delivery_fee.unwrap_or_else(Money::zero),
    };

    let mut uow = state.unit_of_work().await?;
    let order = orders::create_order(request, &mut uow).await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id_or_status} — fetch one order by id, or list orders by
/// status token.
///
/// The path segment doubles as either an order id or a list token; an id
/// is recognized by parsing as a UUID. `"new"` and `"ready"` list the
/// matching statuses; any other token is a 400.
#[tracing::instrument(skip(state))]
pub async fn get_or_list<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id_or_status): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    use axum::response::IntoResponse;

    let mut uow = state.unit_of_work().await?;

    if let Ok(id) = id_or_status.parse::<OrderId>() {
        let order = orders::get_order(id, &mut uow)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("order {id} doesn't exist")))?;
        return Ok(Json(OrderResponse::from(order)).into_response());
    }

    let status = match id_or_status.as_str() {
        "new" => OrderStatus::New,
        "ready" => OrderStatus::ReadyForPickup,
        other => {
            return Err(ApiError::bad_request(
                "invalid status",
                serde_json::json!({ "status": other, "allowed": ["new", "ready"] }),
            ));
        }
    };

    let list = orders::list_orders_by_status(status, &mut uow).await?;
    let responses: Vec<OrderResponse> = list.into_iter().map(OrderResponse::from).collect();
    Ok(Json(responses).into_response())
}

/// PUT /orders/{id} — move an order to a new status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let mut uow = state.unit_of_work().await?;

    let order = orders::update_order_status(id, &req.status, &mut uow)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order {id} doesn't exist")))?;
    uow.commit().await?;

    Ok(Json(order.into()))
}
