//! Shared primitive types used across the order-management crates.

pub mod money;
pub mod types;

pub use money::{Money, MoneyParseError};
pub use types::{AddOnId, DriverId, MenuItemId, OrderId};
