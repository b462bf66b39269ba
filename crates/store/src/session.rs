//! The transactional store contract.
//!
//! A [`StoreSession`] is one transaction against the backing store: every
//! operation inside it sees the same snapshot, nothing is durable until
//! [`commit`](StoreSession::commit), and dropping the session without
//! committing rolls everything back. Sessions are handed out by a
//! [`SessionFactory`] owned by the process and injected into request
//! handling.

use async_trait::async_trait;
use common::{AddOnId, DriverId, MenuItemId, OrderId};

use crate::error::Result;
use crate::records::{
    AddOn, AddOnUpdate, Driver, MenuItem, MenuItemUpdate, NewAddOn, NewDriver, NewMenuItem,
    NewOrder, Order, OrderStatus,
};

/// One transaction against the catalog, order and driver stores.
///
/// Fetches report a missing row as `Ok(None)`; only infrastructure
/// failures and uniqueness conflicts are errors.
#[async_trait]
pub trait StoreSession: Send {
    // -- menu items --

    /// Persists a new menu item. Fails with
    /// [`StoreError::DuplicateItem`](crate::StoreError::DuplicateItem)
    /// when `(name, size)` already exists.
    async fn create_menu_item(&mut self, new: NewMenuItem) -> Result<MenuItem>;

    async fn fetch_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>>;

    async fn fetch_menu_items(&mut self) -> Result<Vec<MenuItem>>;

    /// All size variants carrying the given name.
    async fn fetch_menu_items_named(&mut self, name: &str) -> Result<Vec<MenuItem>>;

    /// Exact `(name, size)` lookup; `size` is expected lower-cased.
    async fn fetch_menu_item_by_name_size(
        &mut self,
        name: &str,
        size: &str,
    ) -> Result<Option<MenuItem>>;

    /// Applies a partial update. Returns `Ok(None)` when the id is
    /// unknown; duplicate `(name, size)` surfaces as `DuplicateItem`.
    async fn update_menu_item(
        &mut self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<Option<MenuItem>>;

    // -- add-ons --

    /// Returns the add-on with the requested name, creating it when
    /// absent. When the name exists the stored row is returned unchanged
    /// and the request's price/description are discarded. Idempotent
    /// under retries and safe under concurrent invocation for the same
    /// name.
    async fn fetch_or_create_addon(&mut self, new: NewAddOn) -> Result<AddOn>;

    async fn fetch_addon(&mut self, id: AddOnId) -> Result<Option<AddOn>>;

    async fn fetch_addons(&mut self) -> Result<Vec<AddOn>>;

    async fn fetch_addon_named(&mut self, name: &str) -> Result<Option<AddOn>>;

    /// Applies a partial update. Duplicate name surfaces as
    /// `DuplicateItem`.
    async fn update_addon(&mut self, id: AddOnId, update: AddOnUpdate) -> Result<Option<AddOn>>;

    /// Associates an add-on with a menu item. Already-linked pairs are a
    /// no-op.
    async fn add_addon_to_menu_item(&mut self, item: MenuItemId, addon: AddOnId) -> Result<()>;

    // -- orders --

    async fn create_order(&mut self, new: NewOrder) -> Result<Order>;

    async fn fetch_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    async fn fetch_orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Sets the status of one order with a single targeted write, so
    /// concurrent updates to the same order serialize instead of losing
    /// one. Returns the refreshed record, or `Ok(None)` for an unknown
    /// id.
    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>>;

    // -- drivers --

    /// Registers a driver. Duplicate phone number surfaces as
    /// `DuplicateItem`.
    async fn create_driver(&mut self, new: NewDriver) -> Result<Driver>;

    async fn fetch_drivers(&mut self) -> Result<Vec<Driver>>;

    // -- transaction boundary --

    /// Makes every write in this session durable. The session is closed
    /// afterwards.
    async fn commit(&mut self) -> Result<()>;

    /// Discards every write in this session. Dropping an uncommitted
    /// session has the same effect; calling this merely makes it
    /// explicit.
    async fn rollback(&mut self) -> Result<()>;
}

/// Opens [`StoreSession`]s. One factory per process, built at bootstrap
/// and passed down to request handling.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: StoreSession + Send + 'static;

    /// Begins a new transaction.
    async fn begin(&self) -> Result<Self::Session>;
}
