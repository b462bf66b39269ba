//! Domain events queued during a unit of work and dispatched after
//! commit.

use common::{Money, OrderId};
use serde::{Deserialize, Serialize};
use store::OrderStatus;

/// Events recorded by business operations. Each variant carries its own
/// typed payload; dispatch serializes the active variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DomainEvent {
    /// A new order was persisted.
    OrderCreated(OrderCreatedData),

    /// An order moved to a new status.
    OrderStatusUpdated(OrderStatusUpdatedData),
}

impl DomainEvent {
    /// The event name used on the bus.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderCreated(_) => "OrderCreated",
            DomainEvent::OrderStatusUpdated(_) => "OrderStatusUpdated",
        }
    }

    /// The serialized payload of the active variant.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            DomainEvent::OrderCreated(data) => serde_json::to_value(data),
            DomainEvent::OrderStatusUpdated(data) => serde_json::to_value(data),
        }
    }
}

/// Payload for [`DomainEvent::OrderCreated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedData {
    pub order_id: OrderId,

    /// Where the confirmation goes.
    pub recipient: String,

    /// Customer first name, for the notification greeting.
    pub first_name: String,

    /// The grand total at order time.
    pub order_total: Money,
}

/// Payload for [`DomainEvent::OrderStatusUpdated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusUpdatedData {
    pub order_id: OrderId,
    pub status: OrderStatus,
}
