//! Entity records and the status enums persisted with them.
//!
//! The store crate owns the row-level representation of the catalog,
//! orders and drivers. Orders keep the customer's submitted line items
//! verbatim (they are persisted as JSON for audit/replay); the computed
//! monetary fields sit alongside them.

use chrono::{DateTime, Utc};
use common::{AddOnId, DriverId, MenuItemId, Money, OrderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A purchasable catalog entry, optionally size-variant.
///
/// The pair `(name, size)` is unique across the catalog; an empty `size`
/// means the item has no size variant. Sizes are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub size: String,
    pub price: Money,
    /// Associated add-ons, ordered by creation.
    pub addons: Vec<AddOn>,
}

/// Fields for creating a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    /// Normalized to lower case on write; empty when the item has no
    /// size variant.
    pub size: String,
    pub price: Money,
}

/// Partial update for a menu item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub price: Option<Money>,
}

/// An optional extra attachable to one or more menu items.
///
/// Add-on names are globally unique; add-ons are shared across menu
/// items rather than owned by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: AddOnId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
}

/// Fields for creating an add-on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddOn {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
}

/// Partial update for an add-on. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddOnUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
}

/// Customer contact and address data captured at order time.
///
/// This is a snapshot owned by the order, not a reference to a mutable
/// customer entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// One line item exactly as the customer submitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub addons: Vec<OrderAddOnRequest>,
}

/// One add-on request under a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAddOnRequest {
    pub name: String,
}

/// A customer order with its computed monetary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer: CustomerInfo,
    /// The submitted line items, verbatim.
    pub items: Vec<OrderItemRequest>,
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
}

impl Order {
    /// The grand total, derived on read rather than stored.
    pub fn total(&self) -> Money {
        self.subtotal + self.tax + self.delivery_fee
    }
}

/// Fields for persisting a freshly composed order. Status starts at
/// [`OrderStatus::New`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub items: Vec<OrderItemRequest>,
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
}

/// A delivery driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    /// Unique across drivers.
    pub phone_number: String,
    pub status: DriverStatus,
}

/// Fields for registering a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDriver {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub status: DriverStatus,
}

/// Fulfillment lifecycle of an order.
///
/// ```text
/// NEW → PREPARING → READY_FOR_PICKUP → ENROUTE → DELIVERED
/// ```
///
/// Transitions accept any status in the set, in any order; only the
/// token itself is validated. This keeps manual overrides possible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Preparing,
    ReadyForPickup,
    Enroute,
    Delivered,
}

/// Error produced when a status token is outside the enumerated set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid order status {token:?}, must be one of: {}", .allowed.join(", "))]
pub struct InvalidOrderStatus {
    pub token: String,
    pub allowed: Vec<&'static str>,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
    ];

    /// The wire token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatus::Enroute => "ENROUTE",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    /// All wire tokens, for error details.
    pub fn tokens() -> Vec<&'static str> {
        Self::ALL.iter().map(OrderStatus::as_str).collect()
    }

    /// Returns true when no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidOrderStatus {
                token: s.to_string(),
                allowed: OrderStatus::tokens(),
            })
    }
}

/// Availability of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Available,
    Delivering,
    Offline,
}

/// Error produced when a driver status token is unknown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid driver status {token:?}, must be one of: {}", .allowed.join(", "))]
pub struct InvalidDriverStatus {
    pub token: String,
    pub allowed: Vec<&'static str>,
}

impl DriverStatus {
    pub const ALL: [DriverStatus; 3] = [
        DriverStatus::Available,
        DriverStatus::Delivering,
        DriverStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "AVAILABLE",
            DriverStatus::Delivering => "DELIVERING",
            DriverStatus::Offline => "OFFLINE",
        }
    }

    pub fn tokens() -> Vec<&'static str> {
        Self::ALL.iter().map(DriverStatus::as_str).collect()
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DriverStatus {
    type Err = InvalidDriverStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriverStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidDriverStatus {
                token: s.to_string(),
                allowed: DriverStatus::tokens(),
            })
    }
}
