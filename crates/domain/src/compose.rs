//! The order composer.
//!
//! Turns a client-submitted order (customer snapshot plus loosely
//! structured line items) into a fully resolved, priced order, or fails
//! with a precise, machine-readable reason carrying the offending
//! request fragment. Resolution is read-only against the catalog;
//! persistence happens afterwards, in the caller's unit of work, so a
//! mid-resolution failure mutates nothing.

use common::Money;
use common::{AddOnId, MenuItemId};
use serde::Serialize;
use store::{
    CustomerInfo, NewOrder, OrderAddOnRequest, OrderItemRequest, StoreError, StoreSession,
};
use thiserror::Error;

use crate::pricing;

/// A raw order as submitted by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub customer: CustomerInfo,
    pub items: Vec<OrderItemRequest>,
    pub delivery_fee: Money,
}

/// Why composition failed. The first three variants are expected,
/// user-correctable outcomes and carry the offending request fragment.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The request contained no line items.
    #[error("an order must contain at least one item")]
    EmptyOrder,

    /// No menu item matches the requested name and size. Menu item names
    /// are case sensitive, and an item with size variants requires the
    /// size to be spelled out.
    #[error("a matching menu item could not be found")]
    ItemNotFound { item: OrderItemRequest },

    /// More than one menu item carries the requested name and the
    /// request did not say which size.
    #[error("multiple menu items match this name, a size is required")]
    AmbiguousItem { item: OrderItemRequest },

    /// No add-on carries the requested name.
    #[error("a matching add-on could not be found")]
    AddOnNotFound { addon: OrderAddOnRequest },

    /// The catalog could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ComposeError {
    /// The offending request fragment, for the error response details.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            ComposeError::EmptyOrder => serde_json::json!({"items": []}),
            ComposeError::ItemNotFound { item } | ComposeError::AmbiguousItem { item } => {
                serde_json::to_value(item).unwrap_or_default()
            }
            ComposeError::AddOnNotFound { addon } => {
                serde_json::to_value(addon).unwrap_or_default()
            }
            ComposeError::Store(_) => serde_json::Value::Null,
        }
    }
}

/// One resolved add-on reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAddOn {
    pub addon: AddOnId,
    pub price: Money,
}

/// One resolved line item: the catalog references behind a submitted
/// line, with the prices that went into the subtotal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLine {
    pub menu_item: MenuItemId,
    pub price: Money,
    pub addons: Vec<ResolvedAddOn>,
}

/// A fully resolved, priced order, not yet persisted.
#[derive(Debug, Clone)]
pub struct ComposedOrder {
    /// Ready to hand to the order store. Keeps the submitted line items
    /// verbatim.
    pub order: NewOrder,
    /// What each line resolved to.
    pub resolved: Vec<ResolvedLine>,
}

impl ComposedOrder {
    /// The grand total the customer will be charged.
    pub fn total(&self) -> Money {
        pricing::total(self.order.subtotal, self.order.tax, self.order.delivery_fee)
    }
}

/// Resolves every line item and add-on of `request` against the catalog
/// and prices the order.
///
/// Size matching is case-normalized (lower-cased). A request that omits
/// the size matches only an item with no size variant; when several
/// variants share the name this is [`ComposeError::AmbiguousItem`] —
/// never a silent pick — and when the only variant is sized it is
/// [`ComposeError::ItemNotFound`]. Add-ons resolve by global name.
pub async fn compose<S: StoreSession>(
    request: OrderRequest,
    session: &mut S,
) -> Result<ComposedOrder, ComposeError> {
    if request.items.is_empty() {
        return Err(ComposeError::EmptyOrder);
    }

    let mut subtotal = Money::zero();
    let mut resolved = Vec::with_capacity(request.items.len());

    for item in &request.items {
        let menu_item = resolve_menu_item(item, session).await?;
        subtotal += menu_item.price;

        let mut addons = Vec::with_capacity(item.addons.len());
        for addon_request in &item.addons {
            let addon = session
                .fetch_addon_named(&addon_request.name)
                .await?
                .ok_or_else(|| ComposeError::AddOnNotFound {
                    addon: addon_request.clone(),
                })?;
            subtotal += addon.price;
            addons.push(ResolvedAddOn {
                addon: addon.id,
                price: addon.price,
            });
        }

        resolved.push(ResolvedLine {
            menu_item: menu_item.id,
            price: menu_item.price,
            addons,
        });
    }

    let tax = pricing::tax_for(&request.customer.zip);

    Ok(ComposedOrder {
        order: NewOrder {
            customer: request.customer,
            items: request.items,
            subtotal,
            tax,
            delivery_fee: request.delivery_fee,
        },
        resolved,
    })
}

async fn resolve_menu_item<S: StoreSession>(
    item: &OrderItemRequest,
    session: &mut S,
) -> Result<store::MenuItem, ComposeError> {
    match item.size.as_deref() {
        Some(size) => {
            let size = size.to_lowercase();
            session
                .fetch_menu_item_by_name_size(&item.name, &size)
                .await?
                .ok_or_else(|| ComposeError::ItemNotFound { item: item.clone() })
        }
        None => {
            let mut variants = session.fetch_menu_items_named(&item.name).await?;
            match variants.len() {
                0 => Err(ComposeError::ItemNotFound { item: item.clone() }),
                1 => {
                    let only = variants.remove(0);
                    // A bare name never silently matches a sized item.
                    if only.size.is_empty() {
                        Ok(only)
                    } else {
                        Err(ComposeError::ItemNotFound { item: item.clone() })
                    }
                }
                _ => Err(ComposeError::AmbiguousItem { item: item.clone() }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, NewAddOn, NewMenuItem, SessionFactory};

    fn customer(zip: &str) -> CustomerInfo {
        CustomerInfo {
            first_name: "Brian".into(),
            last_name: "Z".into(),
            phone_number: "555-0100".into(),
            email: "brian@example.com".into(),
            address: "1 Main St".into(),
            city: "Fort Collins".into(),
            state: "CO".into(),
            zip: zip.into(),
        }
    }

    fn line(name: &str, size: Option<&str>, addons: &[&str]) -> OrderItemRequest {
        OrderItemRequest {
            name: name.to_string(),
            size: size.map(str::to_string),
            addons: addons
                .iter()
                .map(|name| OrderAddOnRequest {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        session
            .create_menu_item(NewMenuItem {
                name: "Hamburger".into(),
                description: None,
                size: String::new(),
                price: Money::from_cents(899),
            })
            .await
            .unwrap();
        session
            .create_menu_item(NewMenuItem {
                name: "French fries".into(),
                description: None,
                size: "large".into(),
                price: Money::from_cents(499),
            })
            .await
            .unwrap();
        session
            .create_menu_item(NewMenuItem {
                name: "Soda".into(),
                description: None,
                size: "small".into(),
                price: Money::from_cents(199),
            })
            .await
            .unwrap();
        session
            .create_menu_item(NewMenuItem {
                name: "Soda".into(),
                description: None,
                size: "large".into(),
                price: Money::from_cents(299),
            })
            .await
            .unwrap();
        session
            .fetch_or_create_addon(NewAddOn {
                name: "Extra cheese".into(),
                description: None,
                price: Money::from_cents(100),
            })
            .await
            .unwrap();
        session.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn prices_items_and_addons_exactly() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        let composed = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![
                    line("Hamburger", None, &["Extra cheese"]),
                    line("Soda", Some("large"), &[]),
                ],
                delivery_fee: Money::from_cents(300),
            },
            &mut session,
        )
        .await
        .unwrap();

        // 8.99 + 1.00 + 2.99
        assert_eq!(composed.order.subtotal, Money::from_cents(1298));
        assert_eq!(composed.order.tax, Money::from_cents(225));
        assert_eq!(composed.order.delivery_fee, Money::from_cents(300));
        assert_eq!(composed.total(), Money::from_cents(1823));

        assert_eq!(composed.resolved.len(), 2);
        assert_eq!(composed.resolved[0].addons.len(), 1);
        assert_eq!(composed.resolved[0].addons[0].price, Money::from_cents(100));

        // submitted line items survive verbatim
        assert_eq!(composed.order.items[0].name, "Hamburger");
        assert_eq!(composed.order.items[1].size.as_deref(), Some("large"));
    }

    #[tokio::test]
    async fn empty_order_is_rejected_before_any_lookup() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();

        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ComposeError::EmptyOrder));
    }

    #[tokio::test]
    async fn unknown_item_carries_the_offending_fragment() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        let requested = line("Cheeseburger", None, &[]);
        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![requested.clone()],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();

        match err {
            ComposeError::ItemNotFound { item } => assert_eq!(item, requested),
            other => panic!("expected ItemNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn name_lookup_is_case_sensitive_but_size_is_not() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        // "hamburger" does not match "Hamburger"
        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![line("hamburger", None, &[])],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ComposeError::ItemNotFound { .. }));

        // "LARGE" matches the stored "large"
        let composed = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![line("French fries", Some("LARGE"), &[])],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap();
        assert_eq!(composed.order.subtotal, Money::from_cents(499));
    }

    #[tokio::test]
    async fn multiple_sizes_without_a_size_is_ambiguous() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        let requested = line("Soda", None, &[]);
        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![requested.clone()],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();

        match err {
            ComposeError::AmbiguousItem { item } => assert_eq!(item, requested),
            other => panic!("expected AmbiguousItem, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_sized_variant_without_a_size_is_not_found() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        // "French fries" exists only as "large"; omitting the size is
        // not a silent match.
        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![line("French fries", None, &[])],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ComposeError::ItemNotFound { .. }));

        // A wrong size against an existing name is not found either,
        // never ambiguous.
        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![line("Soda", Some("medium"), &[])],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ComposeError::ItemNotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_addon_carries_the_offending_fragment() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        let err = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![line("Hamburger", None, &["Extra mayo"])],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();

        match &err {
            ComposeError::AddOnNotFound { addon } => assert_eq!(addon.name, "Extra mayo"),
            other => panic!("expected AddOnNotFound, got {other:?}"),
        }
        assert_eq!(err.detail(), serde_json::json!({"name": "Extra mayo"}));
    }

    #[tokio::test]
    async fn unknown_zip_yields_zero_tax() {
        let store = seeded_store().await;
        let mut session = store.begin().await.unwrap();

        let composed = compose(
            OrderRequest {
                customer: customer("99999"),
                items: vec![line("Hamburger", None, &[])],
                delivery_fee: Money::from_cents(300),
            },
            &mut session,
        )
        .await
        .unwrap();

        assert_eq!(composed.order.tax, Money::zero());
        assert_eq!(composed.total(), Money::from_cents(1199));
    }

    #[tokio::test]
    async fn failed_composition_writes_nothing() {
        let store = seeded_store().await;

        let mut session = store.begin().await.unwrap();
        let _ = compose(
            OrderRequest {
                customer: customer("80523"),
                items: vec![line("Hamburger", None, &["Extra mayo"])],
                delivery_fee: Money::zero(),
            },
            &mut session,
        )
        .await
        .unwrap_err();
        session.commit().await.unwrap();

        let mut check = store.begin().await.unwrap();
        assert!(check
            .fetch_orders_by_status(store::OrderStatus::New)
            .await
            .unwrap()
            .is_empty());
    }
}
