//! Order service operations.

use common::OrderId;
use store::{InvalidOrderStatus, Order, OrderStatus, StoreError, StoreSession};
use thiserror::Error;

use crate::compose::{ComposeError, OrderRequest, compose};
use crate::events::{DomainEvent, OrderCreatedData, OrderStatusUpdatedData};
use crate::uow::UnitOfWork;

/// Why an order status update failed.
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    /// The requested status token is outside the enumerated set. The
    /// stored status is untouched: the token is validated before the
    /// store is asked to write anything.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidOrderStatus),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composes, prices and persists a new order, and queues the
/// order-created notification.
///
/// Resolution failures leave the store untouched; the order row is only
/// written after every line item and add-on resolved.
#[tracing::instrument(skip(request, uow), fields(items = request.items.len()))]
pub async fn create_order<S: StoreSession>(
    request: OrderRequest,
    uow: &mut UnitOfWork<S>,
) -> Result<Order, ComposeError> {
    let composed = compose(request, uow.session()).await?;
    let total = composed.total();

    let order = uow.session().create_order(composed.order).await?;

    uow.add_event(DomainEvent::OrderCreated(OrderCreatedData {
        order_id: order.id,
        recipient: order.customer.email.clone(),
        first_name: order.customer.first_name.clone(),
        order_total: total,
    }));
    metrics::counter!("orders_created_total").increment(1);

    Ok(order)
}

/// Loads one order.
#[tracing::instrument(skip(uow))]
pub async fn get_order<S: StoreSession>(
    id: OrderId,
    uow: &mut UnitOfWork<S>,
) -> Result<Option<Order>, StoreError> {
    uow.session().fetch_order(id).await
}

/// Lists orders sitting in the given status.
#[tracing::instrument(skip(uow))]
pub async fn list_orders_by_status<S: StoreSession>(
    status: OrderStatus,
    uow: &mut UnitOfWork<S>,
) -> Result<Vec<Order>, StoreError> {
    uow.session().fetch_orders_by_status(status).await
}

/// Moves an order to the status named by `token`.
///
/// Any status in the enumerated set is accepted as a target; ordering
/// between statuses is deliberately not enforced so that manual
/// overrides stay possible. Returns `Ok(None)` for an unknown order id.
#[tracing::instrument(skip(uow))]
pub async fn update_order_status<S: StoreSession>(
    id: OrderId,
    token: &str,
    uow: &mut UnitOfWork<S>,
) -> Result<Option<Order>, OrderUpdateError> {
    let status: OrderStatus = token.parse()?;

    let Some(order) = uow.session().update_order_status(id, status).await? else {
        return Ok(None);
    };

    uow.add_event(DomainEvent::OrderStatusUpdated(OrderStatusUpdatedData {
        order_id: order.id,
        status: order.status,
    }));
    metrics::counter!("orders_status_updated_total").increment(1);

    Ok(Some(order))
}
