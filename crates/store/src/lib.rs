//! Persistence layer for the order-management backend.
//!
//! Entities live in [`records`]; the [`StoreSession`] trait is the
//! transactional contract the domain layer programs against, with one
//! concrete implementation per backing store: PostgreSQL ([`postgres`])
//! and an in-memory store ([`memory`]) with the same interface.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod session;

pub use common::{AddOnId, DriverId, MenuItemId, Money, OrderId};
pub use error::{Result, StoreError};
pub use memory::{MemorySession, MemoryStore};
pub use postgres::{PgSession, PgStore};
pub use records::{
    AddOn, AddOnUpdate, CustomerInfo, Driver, DriverStatus, InvalidDriverStatus,
    InvalidOrderStatus, MenuItem, MenuItemUpdate, NewAddOn, NewDriver, NewMenuItem, NewOrder,
    Order, OrderAddOnRequest, OrderItemRequest, OrderStatus,
};
pub use session::{SessionFactory, StoreSession};
