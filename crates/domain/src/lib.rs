//! Domain layer: order composition, pricing, the unit of work and the
//! service functions the HTTP surface calls.
//!
//! Resolution of an order request against the catalog is read-only; the
//! composed order is persisted by the caller inside a [`UnitOfWork`],
//! whose commit also flushes queued [`DomainEvent`]s to the dispatch
//! collaborators.

pub mod catalog;
pub mod compose;
pub mod dispatch;
pub mod drivers;
pub mod events;
pub mod orders;
pub mod pricing;
pub mod uow;

pub use compose::{ComposeError, ComposedOrder, OrderRequest, ResolvedAddOn, ResolvedLine, compose};
pub use dispatch::{
    CustomerNotifier, DispatchError, Dispatcher, EventBus, InMemoryCustomerNotifier,
    InMemoryEventBus,
};
pub use events::{DomainEvent, OrderCreatedData, OrderStatusUpdatedData};
pub use orders::OrderUpdateError;
pub use uow::UnitOfWork;
