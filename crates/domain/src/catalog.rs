//! Catalog management: menu items and add-ons.

use common::{AddOnId, MenuItemId};
use store::{
    AddOn, AddOnUpdate, MenuItem, MenuItemUpdate, NewAddOn, NewMenuItem, StoreError, StoreSession,
};

use crate::uow::UnitOfWork;

/// Creates a menu item. `(name, size)` duplicates surface as
/// [`StoreError::DuplicateItem`].
#[tracing::instrument(skip(uow), fields(name = %new.name))]
pub async fn create_menu_item<S: StoreSession>(
    new: NewMenuItem,
    uow: &mut UnitOfWork<S>,
) -> Result<MenuItem, StoreError> {
    uow.session().create_menu_item(new).await
}

#[tracing::instrument(skip(uow))]
pub async fn get_menu_item<S: StoreSession>(
    id: MenuItemId,
    uow: &mut UnitOfWork<S>,
) -> Result<Option<MenuItem>, StoreError> {
    uow.session().fetch_menu_item(id).await
}

#[tracing::instrument(skip(uow))]
pub async fn list_menu_items<S: StoreSession>(
    uow: &mut UnitOfWork<S>,
) -> Result<Vec<MenuItem>, StoreError> {
    uow.session().fetch_menu_items().await
}

/// Applies a partial update to a menu item.
///
/// When the update carries the item's current name, the name is dropped
/// from the update set before it is applied: a same-value write must
/// never be rejected as a duplicate of itself.
#[tracing::instrument(skip(uow, update))]
pub async fn update_menu_item<S: StoreSession>(
    id: MenuItemId,
    mut update: MenuItemUpdate,
    uow: &mut UnitOfWork<S>,
) -> Result<Option<MenuItem>, StoreError> {
    let Some(current) = uow.session().fetch_menu_item(id).await? else {
        return Ok(None);
    };

    if update.name.as_deref() == Some(current.name.as_str()) {
        update.name = None;
    }

    uow.session().update_menu_item(id, update).await
}

/// Returns the add-on with the requested name, creating it when absent,
/// and associates it with the given menu item. Both halves are
/// idempotent.
#[tracing::instrument(skip(uow), fields(addon = %new.name))]
pub async fn add_addon_to_menu_item<S: StoreSession>(
    item: MenuItemId,
    new: NewAddOn,
    uow: &mut UnitOfWork<S>,
) -> Result<AddOn, StoreError> {
    let addon = uow.session().fetch_or_create_addon(new).await?;
    uow.session().add_addon_to_menu_item(item, addon.id).await?;
    Ok(addon)
}

#[tracing::instrument(skip(uow))]
pub async fn get_addon<S: StoreSession>(
    id: AddOnId,
    uow: &mut UnitOfWork<S>,
) -> Result<Option<AddOn>, StoreError> {
    uow.session().fetch_addon(id).await
}

#[tracing::instrument(skip(uow))]
pub async fn list_addons<S: StoreSession>(
    uow: &mut UnitOfWork<S>,
) -> Result<Vec<AddOn>, StoreError> {
    uow.session().fetch_addons().await
}

/// Applies a partial update to an add-on. A name collision surfaces as
/// [`StoreError::DuplicateItem`].
#[tracing::instrument(skip(uow, update))]
pub async fn update_addon<S: StoreSession>(
    id: AddOnId,
    update: AddOnUpdate,
    uow: &mut UnitOfWork<S>,
) -> Result<Option<AddOn>, StoreError> {
    uow.session().update_addon(id, update).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::Money;
    use store::{MemoryStore, SessionFactory};

    use super::*;
    use crate::dispatch::{Dispatcher, InMemoryCustomerNotifier, InMemoryEventBus};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Arc::new(InMemoryCustomerNotifier::new()),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    fn burger() -> NewMenuItem {
        NewMenuItem {
            name: "Hamburger".into(),
            description: Some("classic".into()),
            size: String::new(),
            price: Money::from_cents(899),
        }
    }

    #[tokio::test]
    async fn same_name_update_is_not_a_duplicate() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher());

        let item = create_menu_item(burger(), &mut uow).await.unwrap();

        // The client sends the full record back, name included.
        let updated = update_menu_item(
            item.id,
            MenuItemUpdate {
                name: Some("Hamburger".into()),
                description: Some("with pickles".into()),
                size: None,
                price: Some(Money::from_cents(949)),
            },
            &mut uow,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.name, "Hamburger");
        assert_eq!(updated.description.as_deref(), Some("with pickles"));
        assert_eq!(updated.price, Money::from_cents(949));
    }

    #[tokio::test]
    async fn renaming_onto_another_item_is_a_duplicate() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher());

        create_menu_item(burger(), &mut uow).await.unwrap();
        let other = create_menu_item(
            NewMenuItem {
                name: "Veggie burger".into(),
                description: None,
                size: String::new(),
                price: Money::from_cents(999),
            },
            &mut uow,
        )
        .await
        .unwrap();

        let err = update_menu_item(
            other.id,
            MenuItemUpdate {
                name: Some("Hamburger".into()),
                ..Default::default()
            },
            &mut uow,
        )
        .await
        .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn addon_attach_is_idempotent_end_to_end() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher());

        let item = create_menu_item(burger(), &mut uow).await.unwrap();

        let first = add_addon_to_menu_item(
            item.id,
            NewAddOn {
                name: "Bacon".into(),
                description: None,
                price: Money::from_cents(250),
            },
            &mut uow,
        )
        .await
        .unwrap();

        // Retried with a different price: existing row wins, association
        // stays single.
        let second = add_addon_to_menu_item(
            item.id,
            NewAddOn {
                name: "Bacon".into(),
                description: None,
                price: Money::from_cents(999),
            },
            &mut uow,
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.price, Money::from_cents(250));

        let fetched = get_menu_item(item.id, &mut uow).await.unwrap().unwrap();
        assert_eq!(fetched.addons.len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_menu_item_reports_none() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher());

        let missing = update_menu_item(
            MenuItemId::new(),
            MenuItemUpdate {
                price: Some(Money::from_cents(100)),
                ..Default::default()
            },
            &mut uow,
        )
        .await
        .unwrap();
        assert!(missing.is_none());
    }
}
