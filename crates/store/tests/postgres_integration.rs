//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container for efficiency and are
//! serialized because they truncate the tables between runs:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use common::Money;
use serial_test::serial;
use sqlx::PgPool;
use store::{
    CustomerInfo, MenuItemUpdate, NewAddOn, NewDriver, NewMenuItem, NewOrder, OrderAddOnRequest,
    OrderItemRequest, OrderStatus, PgStore, SessionFactory, StoreSession,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Connects to the shared database and wipes all rows.
async fn fresh_store() -> PgStore {
    let info = get_container_info().await;
    let pool = PgPool::connect(&info.connection_string).await.unwrap();
    sqlx::query("TRUNCATE menu_item_add_ons, menu_items, add_ons, orders, drivers")
        .execute(&pool)
        .await
        .unwrap();
    PgStore::new(pool)
}

fn burger() -> NewMenuItem {
    NewMenuItem {
        name: "Hamburger".to_string(),
        description: Some("classic".to_string()),
        size: String::new(),
        price: Money::from_cents(899),
    }
}

fn customer() -> CustomerInfo {
    CustomerInfo {
        first_name: "Brian".into(),
        last_name: "Z".into(),
        phone_number: "555-0100".into(),
        email: "brian@example.com".into(),
        address: "1 Main St".into(),
        city: "Fort Collins".into(),
        state: "CO".into(),
        zip: "80523".into(),
    }
}

#[tokio::test]
#[serial]
async fn menu_item_roundtrip_with_addons() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let item = session.create_menu_item(burger()).await.unwrap();
    assert_eq!(item.price, Money::from_cents(899));
    assert_eq!(item.size, "");

    let addon = session
        .fetch_or_create_addon(NewAddOn {
            name: "Extra cheese".into(),
            description: None,
            price: Money::from_cents(100),
        })
        .await
        .unwrap();
    session
        .add_addon_to_menu_item(item.id, addon.id)
        .await
        .unwrap();
    // duplicate association is a no-op
    session
        .add_addon_to_menu_item(item.id, addon.id)
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    let fetched = session.fetch_menu_item(item.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Hamburger");
    assert_eq!(fetched.addons.len(), 1);
    assert_eq!(fetched.addons[0].name, "Extra cheese");

    let by_name = session
        .fetch_menu_item_by_name_size("Hamburger", "")
        .await
        .unwrap();
    assert!(by_name.is_some());
}

#[tokio::test]
#[serial]
async fn duplicate_name_size_is_translated() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    session.create_menu_item(burger()).await.unwrap();
    let err = session.create_menu_item(burger()).await.unwrap_err();
    assert!(err.is_duplicate(), "expected DuplicateItem, got {err:?}");
}

#[tokio::test]
#[serial]
async fn sizes_are_stored_lower_cased() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let mut fries = burger();
    fries.name = "French fries".to_string();
    fries.size = "Large".to_string();
    let item = session.create_menu_item(fries).await.unwrap();
    assert_eq!(item.size, "large");

    let found = session
        .fetch_menu_item_by_name_size("French fries", "large")
        .await
        .unwrap();
    assert!(found.is_some());

    let variants = session.fetch_menu_items_named("French fries").await.unwrap();
    assert_eq!(variants.len(), 1);
}

#[tokio::test]
#[serial]
async fn partial_update_leaves_other_fields_alone() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let item = session.create_menu_item(burger()).await.unwrap();
    let updated = session
        .update_menu_item(
            item.id,
            MenuItemUpdate {
                price: Some(Money::from_cents(949)),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.price, Money::from_cents(949));
    assert_eq!(updated.name, "Hamburger");
    assert_eq!(updated.description.as_deref(), Some("classic"));

    let missing = session
        .update_menu_item(common::MenuItemId::new(), MenuItemUpdate::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
async fn fetch_or_create_addon_yields_one_row() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let first = session
        .fetch_or_create_addon(NewAddOn {
            name: "Extra mayo".into(),
            description: None,
            price: Money::from_cents(50),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    let second = session
        .fetch_or_create_addon(NewAddOn {
            name: "Extra mayo".into(),
            description: Some("retried".into()),
            price: Money::from_cents(75),
        })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.price, Money::from_cents(50));
    assert_eq!(session.fetch_addons().await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn order_roundtrip_keeps_submitted_items_verbatim() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let items = vec![OrderItemRequest {
        name: "Hamburger".into(),
        size: None,
        addons: vec![OrderAddOnRequest {
            name: "Extra cheese".into(),
        }],
    }];
    let order = session
        .create_order(NewOrder {
            customer: customer(),
            items: items.clone(),
            subtotal: Money::from_cents(999),
            tax: Money::from_cents(225),
            delivery_fee: Money::from_cents(300),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.total(), Money::from_cents(1524));

    let mut session = store.begin().await.unwrap();
    let fetched = session.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.items, items);
    assert_eq!(fetched.customer, customer());
    assert_eq!(fetched.subtotal, Money::from_cents(999));
}

#[tokio::test]
#[serial]
async fn status_update_is_a_single_targeted_write() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let order = session
        .create_order(NewOrder {
            customer: customer(),
            items: vec![],
            subtotal: Money::from_cents(899),
            tax: Money::zero(),
            delivery_fee: Money::zero(),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    let updated = session
        .update_order_status(order.id, OrderStatus::Preparing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Preparing);
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    let new_orders = session
        .fetch_orders_by_status(OrderStatus::New)
        .await
        .unwrap();
    assert!(new_orders.is_empty());
    let preparing = session
        .fetch_orders_by_status(OrderStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(preparing.len(), 1);
}

#[tokio::test]
#[serial]
async fn dropped_session_rolls_back() {
    let store = fresh_store().await;

    {
        let mut session = store.begin().await.unwrap();
        session.create_menu_item(burger()).await.unwrap();
        // dropped without commit
    }

    let mut session = store.begin().await.unwrap();
    assert!(session.fetch_menu_items().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn duplicate_driver_phone_is_translated() {
    let store = fresh_store().await;
    let mut session = store.begin().await.unwrap();

    let new = NewDriver {
        first_name: "Pat".into(),
        last_name: "Kim".into(),
        phone_number: "555-0199".into(),
        status: store::DriverStatus::Available,
    };
    session.create_driver(new.clone()).await.unwrap();
    let err = session.create_driver(new).await.unwrap_err();
    assert!(err.is_duplicate());
}
