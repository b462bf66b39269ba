//! HTTP API for the order-management backend.
//!
//! Thin collaborator over the domain layer: parses and validates
//! requests, runs each operation inside a unit of work, and serializes
//! results. Money fields travel as decimal strings and timestamps as
//! ISO-8601.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{Dispatcher, InMemoryCustomerNotifier, InMemoryEventBus, UnitOfWork};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryStore, SessionFactory};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Shared application state: the store factory and the event dispatch
/// collaborators, built once at bootstrap and injected here.
pub struct AppState<F: SessionFactory> {
    store: F,
    dispatcher: Dispatcher,
}

impl<F: SessionFactory> AppState<F> {
    pub fn new(store: F, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Opens a unit of work for one request.
    pub async fn unit_of_work(&self) -> Result<UnitOfWork<F::Session>, ApiError> {
        Ok(UnitOfWork::new(
            self.store.begin().await?,
            self.dispatcher.clone(),
        ))
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<F: SessionFactory + 'static>(
    state: Arc<AppState<F>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/menuitems",
            get(routes::menu::list_menu_items::<F>).post(routes::menu::create_menu_item::<F>),
        )
        .route(
            "/menuitems/{id}",
            get(routes::menu::get_menu_item::<F>).put(routes::menu::update_menu_item::<F>),
        )
        .route(
            "/menuitems/{id}/addons",
            get(routes::menu::list_menu_item_addons::<F>)
                .post(routes::menu::create_menu_item_addon::<F>),
        )
        .route("/addons", get(routes::menu::list_addons::<F>))
        .route(
            "/addons/{id}",
            get(routes::menu::get_addon::<F>).put(routes::menu::update_addon::<F>),
        )
        .route("/orders", axum::routing::post(routes::orders::create::<F>))
        .route(
            "/orders/{id_or_status}",
            get(routes::orders::get_or_list::<F>).put(routes::orders::update_status::<F>),
        )
        .route(
            "/drivers",
            get(routes::drivers::list::<F>).post(routes::drivers::create::<F>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state on the in-memory store with in-memory
/// dispatch collaborators, returning the collaborators for inspection.
pub fn create_default_state() -> (
    Arc<AppState<MemoryStore>>,
    InMemoryCustomerNotifier,
    InMemoryEventBus,
) {
    let notifier = InMemoryCustomerNotifier::new();
    let bus = InMemoryEventBus::new();
    let dispatcher = Dispatcher::new(Arc::new(notifier.clone()), Arc::new(bus.clone()));
    let state = Arc::new(AppState::new(MemoryStore::new(), dispatcher));
    (state, notifier, bus)
}
