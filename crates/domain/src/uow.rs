//! The unit of work: one transaction plus deferred event dispatch.

use store::{StoreError, StoreSession};

use crate::dispatch::Dispatcher;
use crate::events::DomainEvent;

/// Bounds one logical business operation.
///
/// Wraps a store session and a queue of domain events. Events recorded
/// with [`add_event`](UnitOfWork::add_event) are dispatched if and only
/// if the commit succeeds, in the order they were queued. Dropping the
/// unit of work without committing rolls the transaction back on every
/// exit path, including errors — nothing is dispatched.
///
/// A dispatch failure after a successful commit is a partial-failure
/// state: the writes are durable but a notification may be lost. Those
/// failures are logged and counted rather than surfaced, since the
/// business operation itself completed.
pub struct UnitOfWork<S: StoreSession> {
    session: S,
    events: Vec<DomainEvent>,
    dispatcher: Dispatcher,
}

impl<S: StoreSession> UnitOfWork<S> {
    /// Wraps a freshly begun session.
    pub fn new(session: S, dispatcher: Dispatcher) -> Self {
        Self {
            session,
            events: Vec::new(),
            dispatcher,
        }
    }

    /// The transactional store handle.
    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    /// Queues a domain event for post-commit dispatch. Never fails.
    pub fn add_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    /// Commits the transaction, then flushes queued events in order.
    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.session.commit().await?;

        for event in &self.events {
            if let Err(error) = self.dispatcher.dispatch(event).await {
                metrics::counter!("events_dispatch_failures_total").increment(1);
                tracing::error!(
                    event_type = event.event_type(),
                    %error,
                    "event dispatch failed after commit"
                );
            }
        }
        Ok(())
    }

    /// Rolls the transaction back explicitly. Queued events are
    /// discarded.
    pub async fn rollback(mut self) -> Result<(), StoreError> {
        self.events.clear();
        self.session.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::{Money, OrderId};
    use store::{MemoryStore, NewMenuItem, SessionFactory};

    use super::*;
    use crate::dispatch::{InMemoryCustomerNotifier, InMemoryEventBus};
    use crate::events::{OrderCreatedData, OrderStatusUpdatedData};
    use store::OrderStatus;

    fn fixture() -> (Dispatcher, InMemoryCustomerNotifier, InMemoryEventBus) {
        let notifier = InMemoryCustomerNotifier::new();
        let bus = InMemoryEventBus::new();
        let dispatcher = Dispatcher::new(Arc::new(notifier.clone()), Arc::new(bus.clone()));
        (dispatcher, notifier, bus)
    }

    fn created_event(total_cents: i64) -> DomainEvent {
        DomainEvent::OrderCreated(OrderCreatedData {
            order_id: OrderId::new(),
            recipient: "brian@example.com".into(),
            first_name: "Brian".into(),
            order_total: Money::from_cents(total_cents),
        })
    }

    #[tokio::test]
    async fn events_flush_in_order_after_commit() {
        let store = MemoryStore::new();
        let (dispatcher, _notifier, bus) = fixture();

        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher);
        uow.add_event(created_event(1199));
        uow.add_event(DomainEvent::OrderStatusUpdated(OrderStatusUpdatedData {
            order_id: OrderId::new(),
            status: OrderStatus::Preparing,
        }));
        uow.commit().await.unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "OrderCreated");
        assert_eq!(published[1].0, "OrderStatusUpdated");
    }

    #[tokio::test]
    async fn nothing_dispatches_without_commit() {
        let store = MemoryStore::new();
        let (dispatcher, notifier, bus) = fixture();

        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher.clone());
        uow.add_event(created_event(1199));
        uow.rollback().await.unwrap();

        assert!(notifier.notifications().is_empty());
        assert!(bus.published().is_empty());

        // dropping without commit behaves the same
        {
            let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher);
            uow.add_event(created_event(500));
        }
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back_writes() {
        let store = MemoryStore::new();
        let (dispatcher, _, _) = fixture();

        {
            let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher);
            uow.session()
                .create_menu_item(NewMenuItem {
                    name: "Hamburger".into(),
                    description: None,
                    size: String::new(),
                    price: Money::from_cents(899),
                })
                .await
                .unwrap();
            // error path: uow dropped without commit
        }

        let mut session = store.begin().await.unwrap();
        assert!(session.fetch_menu_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatch_failure_does_not_fail_the_commit() {
        let store = MemoryStore::new();
        let (dispatcher, notifier, bus) = fixture();

        let mut uow = UnitOfWork::new(store.begin().await.unwrap(), dispatcher);
        uow.session()
            .create_menu_item(NewMenuItem {
                name: "Hamburger".into(),
                description: None,
                size: String::new(),
                price: Money::from_cents(899),
            })
            .await
            .unwrap();
        uow.add_event(created_event(899));

        notifier.set_fail_next(true);
        uow.commit().await.unwrap();

        // the write is durable even though the notification was lost
        let mut session = store.begin().await.unwrap();
        assert_eq!(session.fetch_menu_items().await.unwrap().len(), 1);
        assert!(notifier.notifications().is_empty());
        assert!(bus.published().is_empty());
    }
}
