//! In-memory store implementation.
//!
//! Provides the same interface as the PostgreSQL implementation, for
//! tests and for running the server without a database. Shared state
//! sits behind a tokio `RwLock`; a session takes the owned write guard
//! and mutates a working copy, so sessions serialize and nothing is
//! visible to others until commit. Dropping an uncommitted session
//! releases the guard and discards the copy.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{AddOnId, DriverId, MenuItemId, OrderId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::error::{Result, StoreError};
use crate::records::{
    AddOn, AddOnUpdate, Driver, MenuItem, MenuItemUpdate, NewAddOn, NewDriver, NewMenuItem,
    NewOrder, Order, OrderStatus,
};
use crate::session::{SessionFactory, StoreSession};

#[derive(Debug, Clone, Default)]
struct State {
    menu_items: Vec<MenuItem>,
    add_ons: Vec<AddOn>,
    /// Menu-item/add-on associations, in insertion order.
    links: Vec<(MenuItemId, AddOnId)>,
    orders: Vec<Order>,
    drivers: Vec<Driver>,
}

impl State {
    fn addons_for(&self, item: MenuItemId) -> Vec<AddOn> {
        let mut addons: Vec<AddOn> = self
            .links
            .iter()
            .filter(|(i, _)| *i == item)
            .filter_map(|(_, a)| self.add_ons.iter().find(|addon| addon.id == *a))
            .cloned()
            .collect();
        addons.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.as_uuid().cmp(&b.id.as_uuid())));
        addons
    }

    fn assemble_item(&self, item: &MenuItem) -> MenuItem {
        let mut item = item.clone();
        item.addons = self.addons_for(item.id);
        item
    }
}

/// In-memory store and session factory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionFactory for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession> {
        let guard = Arc::clone(&self.state).write_owned().await;
        let work = guard.clone();
        Ok(MemorySession {
            guard: Some(guard),
            work,
        })
    }
}

/// One transaction against the in-memory store.
pub struct MemorySession {
    guard: Option<OwnedRwLockWriteGuard<State>>,
    work: State,
}

impl MemorySession {
    fn open(&mut self) -> Result<&mut State> {
        if self.guard.is_none() {
            return Err(StoreError::SessionClosed);
        }
        Ok(&mut self.work)
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn create_menu_item(&mut self, new: NewMenuItem) -> Result<MenuItem> {
        let state = self.open()?;
        let size = new.size.to_lowercase();
        if state
            .menu_items
            .iter()
            .any(|i| i.name == new.name && i.size == size)
        {
            return Err(StoreError::duplicate(&["name", "size"]));
        }

        let now = Utc::now();
        let item = MenuItem {
            id: MenuItemId::new(),
            created: now,
            updated: now,
            name: new.name,
            description: new.description,
            size,
            price: new.price,
            addons: Vec::new(),
        };
        state.menu_items.push(item.clone());
        Ok(item)
    }

    async fn fetch_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        let state = self.open()?;
        let found = state.menu_items.iter().find(|i| i.id == id).cloned();
        Ok(found.map(|i| state.assemble_item(&i)))
    }

    async fn fetch_menu_items(&mut self) -> Result<Vec<MenuItem>> {
        let state = self.open()?;
        let items = state.menu_items.clone();
        Ok(items.iter().map(|i| state.assemble_item(i)).collect())
    }

    async fn fetch_menu_items_named(&mut self, name: &str) -> Result<Vec<MenuItem>> {
        let state = self.open()?;
        let matching: Vec<MenuItem> = state
            .menu_items
            .iter()
            .filter(|i| i.name == name)
            .cloned()
            .collect();
        Ok(matching.iter().map(|i| state.assemble_item(i)).collect())
    }

    async fn fetch_menu_item_by_name_size(
        &mut self,
        name: &str,
        size: &str,
    ) -> Result<Option<MenuItem>> {
        let state = self.open()?;
        let found = state
            .menu_items
            .iter()
            .find(|i| i.name == name && i.size == size)
            .cloned();
        Ok(found.map(|i| state.assemble_item(&i)))
    }

    async fn update_menu_item(
        &mut self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<Option<MenuItem>> {
        let state = self.open()?;
        let Some(idx) = state.menu_items.iter().position(|i| i.id == id) else {
            return Ok(None);
        };

        let name = update
            .name
            .clone()
            .unwrap_or_else(|| state.menu_items[idx].name.clone());
        let size = update
            .size
            .as_ref()
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| state.menu_items[idx].size.clone());
        if state
            .menu_items
            .iter()
            .any(|i| i.id != id && i.name == name && i.size == size)
        {
            return Err(StoreError::duplicate(&["name", "size"]));
        }

        let item = &mut state.menu_items[idx];
        item.name = name;
        item.size = size;
        if let Some(description) = update.description {
            item.description = Some(description);
        }
        if let Some(price) = update.price {
            item.price = price;
        }
        item.updated = Utc::now();

        let item = state.menu_items[idx].clone();
        Ok(Some(state.assemble_item(&item)))
    }

    async fn fetch_or_create_addon(&mut self, new: NewAddOn) -> Result<AddOn> {
        let state = self.open()?;
        if let Some(existing) = state.add_ons.iter().find(|a| a.name == new.name) {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let addon = AddOn {
            id: AddOnId::new(),
            created: now,
            updated: now,
            name: new.name,
            description: new.description,
            price: new.price,
        };
        state.add_ons.push(addon.clone());
        Ok(addon)
    }

    async fn fetch_addon(&mut self, id: AddOnId) -> Result<Option<AddOn>> {
        let state = self.open()?;
        Ok(state.add_ons.iter().find(|a| a.id == id).cloned())
    }

    async fn fetch_addons(&mut self) -> Result<Vec<AddOn>> {
        let state = self.open()?;
        Ok(state.add_ons.clone())
    }

    async fn fetch_addon_named(&mut self, name: &str) -> Result<Option<AddOn>> {
        let state = self.open()?;
        Ok(state.add_ons.iter().find(|a| a.name == name).cloned())
    }

    async fn update_addon(&mut self, id: AddOnId, update: AddOnUpdate) -> Result<Option<AddOn>> {
        let state = self.open()?;
        let Some(idx) = state.add_ons.iter().position(|a| a.id == id) else {
            return Ok(None);
        };

        if let Some(ref name) = update.name
            && state.add_ons.iter().any(|a| a.id != id && a.name == *name)
        {
            return Err(StoreError::duplicate(&["name"]));
        }

        let addon = &mut state.add_ons[idx];
        if let Some(name) = update.name {
            addon.name = name;
        }
        if let Some(description) = update.description {
            addon.description = Some(description);
        }
        if let Some(price) = update.price {
            addon.price = price;
        }
        addon.updated = Utc::now();
        Ok(Some(addon.clone()))
    }

    async fn add_addon_to_menu_item(&mut self, item: MenuItemId, addon: AddOnId) -> Result<()> {
        let state = self.open()?;
        if !state.links.contains(&(item, addon)) {
            state.links.push((item, addon));
        }
        Ok(())
    }

    async fn create_order(&mut self, new: NewOrder) -> Result<Order> {
        let state = self.open()?;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            created: now,
            updated: now,
            status: OrderStatus::New,
            customer: new.customer,
            items: new.items,
            subtotal: new.subtotal,
            tax: new.tax,
            delivery_fee: new.delivery_fee,
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn fetch_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let state = self.open()?;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn fetch_orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>> {
        let state = self.open()?;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let state = self.open()?;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn create_driver(&mut self, new: NewDriver) -> Result<Driver> {
        let state = self.open()?;
        if state
            .drivers
            .iter()
            .any(|d| d.phone_number == new.phone_number)
        {
            return Err(StoreError::duplicate(&["phone_number"]));
        }

        let now = Utc::now();
        let driver = Driver {
            id: DriverId::new(),
            created: now,
            updated: now,
            first_name: new.first_name,
            last_name: new.last_name,
            phone_number: new.phone_number,
            status: new.status,
        };
        state.drivers.push(driver.clone());
        Ok(driver)
    }

    async fn fetch_drivers(&mut self) -> Result<Vec<Driver>> {
        let state = self.open()?;
        Ok(state.drivers.clone())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut guard = self.guard.take().ok_or(StoreError::SessionClosed)?;
        *guard = self.work.clone();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.guard.take().ok_or(StoreError::SessionClosed)?;
        Ok(())
    }
}
