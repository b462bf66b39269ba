//! Event dispatch collaborators.
//!
//! The unit of work flushes committed events here. Both collaborators
//! are external systems and only their interfaces live in this crate: a
//! customer notifier (email) and an event bus. The in-memory
//! implementations record what they were handed, for tests and for
//! running without external infrastructure.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::events::{DomainEvent, OrderCreatedData};

/// Errors from the dispatch collaborators.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("customer notifier error: {0}")]
    Notifier(String),

    #[error("event bus error: {0}")]
    Bus(String),

    #[error("event payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sends order notifications to customers.
#[async_trait]
pub trait CustomerNotifier: Send + Sync {
    /// Tells the customer their order was received.
    async fn order_received(&self, data: &OrderCreatedData) -> Result<(), DispatchError>;
}

/// Publishes domain events to the message bus.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError>;
}

/// Fans a committed event out to the collaborators.
///
/// Every event goes to the bus; order-created events additionally go to
/// the customer notifier.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn CustomerNotifier>,
    bus: Arc<dyn EventBus>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn CustomerNotifier>, bus: Arc<dyn EventBus>) -> Self {
        Self { notifier, bus }
    }

    /// Delivers one event to every interested collaborator.
    pub async fn dispatch(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        if let DomainEvent::OrderCreated(data) = event {
            self.notifier.order_received(data).await?;
        }
        self.bus.publish(event.event_type(), event.payload()?).await
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    notifications: Vec<OrderCreatedData>,
    fail_next: bool,
}

/// In-memory customer notifier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerNotifier {
    state: Arc<RwLock<NotifierState>>,
}

impl InMemoryCustomerNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail the next delivery.
    pub fn set_fail_next(&self, fail: bool) {
        self.state.write().unwrap().fail_next = fail;
    }

    /// The notifications delivered so far.
    pub fn notifications(&self) -> Vec<OrderCreatedData> {
        self.state.read().unwrap().notifications.clone()
    }
}

#[async_trait]
impl CustomerNotifier for InMemoryCustomerNotifier {
    async fn order_received(&self, data: &OrderCreatedData) -> Result<(), DispatchError> {
        let mut state = self.state.write().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(DispatchError::Notifier("delivery failed".to_string()));
        }
        state.notifications.push(data.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BusState {
    published: Vec<(String, serde_json::Value)>,
    fail_next: bool,
}

/// In-memory event bus.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<RwLock<BusState>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the bus to fail the next publish.
    pub fn set_fail_next(&self, fail: bool) {
        self.state.write().unwrap().fail_next = fail;
    }

    /// `(event_type, payload)` pairs published so far, in order.
    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.state.read().unwrap().published.clone()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        let mut state = self.state.write().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(DispatchError::Bus("publish failed".to_string()));
        }
        state.published.push((event_type.to_string(), payload));
        Ok(())
    }
}
