//! PostgreSQL-backed store.
//!
//! A [`PgSession`] owns one sqlx transaction for its whole life. Commit
//! makes the writes durable; dropping the session without committing
//! rolls the transaction back, which keeps every error exit path clean.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AddOnId, DriverId, MenuItemId, Money, OrderId};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{PgConnection, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::records::{
    AddOn, AddOnUpdate, Driver, MenuItem, MenuItemUpdate, NewAddOn, NewDriver, NewMenuItem,
    NewOrder, Order, OrderStatus,
};
use crate::session::{SessionFactory, StoreSession};

/// Connection pool and session factory for the PostgreSQL store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx: Some(tx) })
    }
}

/// One transaction against the PostgreSQL store.
pub struct PgSession {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.tx.as_deref_mut().ok_or(StoreError::SessionClosed)
    }

    async fn load_addons(&mut self, item: MenuItemId) -> Result<Vec<AddOn>> {
        let conn = self.conn()?;
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.created, a.updated, a.name, a.description, a.price_cents
            FROM add_ons a
            JOIN menu_item_add_ons l ON l.add_on_id = a.id
            WHERE l.menu_item_id = $1
            ORDER BY a.created ASC, a.id ASC
            "#,
        )
        .bind(item.as_uuid())
        .fetch_all(conn)
        .await?;

        rows.iter().map(addon_from_row).collect()
    }

    async fn menu_item_with_addons(&mut self, row: &PgRow) -> Result<MenuItem> {
        let mut item = menu_item_from_row(row)?;
        item.addons = self.load_addons(item.id).await?;
        Ok(item)
    }
}

/// Maps a unique-constraint violation onto the domain taxonomy; anything
/// else stays a database error.
fn translate_unique(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("menu_items_name_size_key") => return StoreError::duplicate(&["name", "size"]),
            Some("add_ons_name_key") => return StoreError::duplicate(&["name"]),
            Some("drivers_phone_number_key") => {
                return StoreError::duplicate(&["phone_number"]);
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

fn menu_item_from_row(row: &PgRow) -> Result<MenuItem> {
    Ok(MenuItem {
        id: MenuItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        created: row.try_get::<DateTime<Utc>, _>("created")?,
        updated: row.try_get::<DateTime<Utc>, _>("updated")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        size: row.try_get("size")?,
        price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
        addons: Vec::new(),
    })
}

fn addon_from_row(row: &PgRow) -> Result<AddOn> {
    Ok(AddOn {
        id: AddOnId::from_uuid(row.try_get::<Uuid, _>("id")?),
        created: row.try_get("created")?,
        updated: row.try_get("updated")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
    })
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status
        .parse()
        .map_err(|e: crate::records::InvalidOrderStatus| {
            StoreError::Database(sqlx::Error::Decode(Box::new(e)))
        })?;

    let items: serde_json::Value = row.try_get("items")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        created: row.try_get("created")?,
        updated: row.try_get("updated")?,
        status,
        customer: crate::records::CustomerInfo {
            first_name: row.try_get("customer_first_name")?,
            last_name: row.try_get("customer_last_name")?,
            phone_number: row.try_get("customer_phone_number")?,
            email: row.try_get("customer_email")?,
            address: row.try_get("customer_address")?,
            city: row.try_get("customer_city")?,
            state: row.try_get("customer_state")?,
            zip: row.try_get("customer_zip")?,
        },
        items: serde_json::from_value(items)?,
        subtotal: Money::from_cents(row.try_get::<i64, _>("subtotal_cents")?),
        tax: Money::from_cents(row.try_get::<i64, _>("tax_cents")?),
        delivery_fee: Money::from_cents(row.try_get::<i64, _>("delivery_fee_cents")?),
    })
}

fn driver_from_row(row: &PgRow) -> Result<Driver> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse()
        .map_err(|e: crate::records::InvalidDriverStatus| {
            StoreError::Database(sqlx::Error::Decode(Box::new(e)))
        })?;

    Ok(Driver {
        id: DriverId::from_uuid(row.try_get::<Uuid, _>("id")?),
        created: row.try_get("created")?,
        updated: row.try_get("updated")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone_number: row.try_get("phone_number")?,
        status,
    })
}

const MENU_ITEM_COLUMNS: &str = "id, created, updated, name, description, size, price_cents";
const ADDON_COLUMNS: &str = "id, created, updated, name, description, price_cents";
const ORDER_COLUMNS: &str = "id, created, updated, status, \
     customer_first_name, customer_last_name, customer_phone_number, customer_email, \
     customer_address, customer_city, customer_state, customer_zip, \
     items, subtotal_cents, tax_cents, delivery_fee_cents";
const DRIVER_COLUMNS: &str = "id, created, updated, first_name, last_name, phone_number, status";

#[async_trait]
impl StoreSession for PgSession {
    async fn create_menu_item(&mut self, new: NewMenuItem) -> Result<MenuItem> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "INSERT INTO menu_items (name, description, size, price_cents) \
             VALUES ($1, $2, $3, $4) RETURNING {MENU_ITEM_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.size.to_lowercase())
        .bind(new.price.cents())
        .fetch_one(conn)
        .await
        .map_err(translate_unique)?;

        menu_item_from_row(&row)
    }

    async fn fetch_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;

        match row {
            Some(row) => Ok(Some(self.menu_item_with_addons(&row).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_menu_items(&mut self) -> Result<Vec<MenuItem>> {
        let conn = self.conn()?;
        let rows = sqlx::query(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items ORDER BY created ASC, id ASC"
        ))
        .fetch_all(conn)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(self.menu_item_with_addons(row).await?);
        }
        Ok(items)
    }

    async fn fetch_menu_items_named(&mut self, name: &str) -> Result<Vec<MenuItem>> {
        let conn = self.conn()?;
        let rows = sqlx::query(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE name = $1 \
             ORDER BY created ASC, id ASC"
        ))
        .bind(name)
        .fetch_all(conn)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(self.menu_item_with_addons(row).await?);
        }
        Ok(items)
    }

    async fn fetch_menu_item_by_name_size(
        &mut self,
        name: &str,
        size: &str,
    ) -> Result<Option<MenuItem>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE name = $1 AND size = $2"
        ))
        .bind(name)
        .bind(size)
        .fetch_optional(conn)
        .await?;

        match row {
            Some(row) => Ok(Some(self.menu_item_with_addons(&row).await?)),
            None => Ok(None),
        }
    }

    async fn update_menu_item(
        &mut self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<Option<MenuItem>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "UPDATE menu_items SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 size = COALESCE($4, size), \
                 price_cents = COALESCE($5, price_cents), \
                 updated = NOW() \
             WHERE id = $1 RETURNING {MENU_ITEM_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.size.map(|s| s.to_lowercase()))
        .bind(update.price.map(|p| p.cents()))
        .fetch_optional(conn)
        .await
        .map_err(translate_unique)?;

        match row {
            Some(row) => Ok(Some(self.menu_item_with_addons(&row).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_or_create_addon(&mut self, new: NewAddOn) -> Result<AddOn> {
        if let Some(existing) = self.fetch_addon_named(&new.name).await? {
            return Ok(existing);
        }

        // The name unique constraint is the source of truth: a conflict
        // means someone else created it first, so refetch.
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "INSERT INTO add_ons (name, description, price_cents) VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO NOTHING RETURNING {ADDON_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.cents())
        .fetch_optional(conn)
        .await?;

        match row {
            Some(row) => addon_from_row(&row),
            None => self
                .fetch_addon_named(&new.name)
                .await?
                .ok_or(StoreError::Database(sqlx::Error::RowNotFound)),
        }
    }

    async fn fetch_addon(&mut self, id: AddOnId) -> Result<Option<AddOn>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!("SELECT {ADDON_COLUMNS} FROM add_ons WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(conn)
            .await?;

        row.as_ref().map(addon_from_row).transpose()
    }

    async fn fetch_addons(&mut self) -> Result<Vec<AddOn>> {
        let conn = self.conn()?;
        let rows = sqlx::query(&format!(
            "SELECT {ADDON_COLUMNS} FROM add_ons ORDER BY created ASC, id ASC"
        ))
        .fetch_all(conn)
        .await?;

        rows.iter().map(addon_from_row).collect()
    }

    async fn fetch_addon_named(&mut self, name: &str) -> Result<Option<AddOn>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "SELECT {ADDON_COLUMNS} FROM add_ons WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(conn)
        .await?;

        row.as_ref().map(addon_from_row).transpose()
    }

    async fn update_addon(&mut self, id: AddOnId, update: AddOnUpdate) -> Result<Option<AddOn>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "UPDATE add_ons SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 price_cents = COALESCE($4, price_cents), \
                 updated = NOW() \
             WHERE id = $1 RETURNING {ADDON_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price.map(|p| p.cents()))
        .fetch_optional(conn)
        .await
        .map_err(translate_unique)?;

        row.as_ref().map(addon_from_row).transpose()
    }

    async fn add_addon_to_menu_item(&mut self, item: MenuItemId, addon: AddOnId) -> Result<()> {
        let conn = self.conn()?;
        sqlx::query(
            "INSERT INTO menu_item_add_ons (menu_item_id, add_on_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(item.as_uuid())
        .bind(addon.as_uuid())
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn create_order(&mut self, new: NewOrder) -> Result<Order> {
        let items = serde_json::to_value(&new.items)?;
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "INSERT INTO orders (customer_first_name, customer_last_name, \
                 customer_phone_number, customer_email, customer_address, customer_city, \
                 customer_state, customer_zip, items, subtotal_cents, tax_cents, \
                 delivery_fee_cents) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&new.customer.first_name)
        .bind(&new.customer.last_name)
        .bind(&new.customer.phone_number)
        .bind(&new.customer.email)
        .bind(&new.customer.address)
        .bind(&new.customer.city)
        .bind(&new.customer.state)
        .bind(&new.customer.zip)
        .bind(items)
        .bind(new.subtotal.cents())
        .bind(new.tax.cents())
        .bind(new.delivery_fee.cents())
        .fetch_one(conn)
        .await?;

        order_from_row(&row)
    }

    async fn fetch_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(conn)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn fetch_orders_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>> {
        let conn = self.conn()?;
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 ORDER BY created ASC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(conn)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        // Single targeted write keyed by id, never read-modify-write.
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(conn)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn create_driver(&mut self, new: NewDriver) -> Result<Driver> {
        let conn = self.conn()?;
        let row = sqlx::query(&format!(
            "INSERT INTO drivers (first_name, last_name, phone_number, status) \
             VALUES ($1, $2, $3, $4) RETURNING {DRIVER_COLUMNS}"
        ))
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone_number)
        .bind(new.status.as_str())
        .fetch_one(conn)
        .await
        .map_err(translate_unique)?;

        driver_from_row(&row)
    }

    async fn fetch_drivers(&mut self) -> Result<Vec<Driver>> {
        let conn = self.conn()?;
        let rows = sqlx::query(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY created ASC, id ASC"
        ))
        .fetch_all(conn)
        .await?;

        rows.iter().map(driver_from_row).collect()
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(StoreError::SessionClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(StoreError::SessionClosed)?;
        tx.rollback().await?;
        Ok(())
    }
}
