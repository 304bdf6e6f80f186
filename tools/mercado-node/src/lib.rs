//! Farmers' marketplace web server: public listings, the free-plan cap on
//! active products, and admin-driven premium subscriptions.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use mercado_common::category;
use mercado_common::producer::demo_producer;

pub mod clock;
pub mod config;
pub mod error;
pub mod forms;
pub mod routes;
pub mod store;
pub mod views;

use clock::Clock;
use config::PremiumSettings;
use store::{Store, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub premium: Arc<PremiumSettings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, premium: PremiumSettings) -> Self {
        Self {
            store,
            clock,
            premium: Arc::new(premium),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/categoria/{id}", get(routes::by_category))
        .route(
            "/publicar",
            get(routes::publish_start).post(routes::submit_product),
        )
        .route("/publicar/paso2", post(routes::publish_details))
        .route("/vender/{id}", get(routes::mark_sold))
        .route(
            "/mis-productos",
            get(routes::my_products_form).post(routes::my_products),
        )
        .route(
            "/productos/{id}/editar",
            get(routes::edit_form).post(routes::edit_product),
        )
        .route("/productos/{id}/retirar", get(routes::withdraw))
        .route("/admin/activar-por-telefono", get(routes::activate))
        .route("/admin/actualizar-suscripciones", get(routes::sweep))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create tables and seed reference data. Safe to run on every start.
pub async fn prepare(store: &dyn Store, seed_demo: bool) -> Result<(), StoreError> {
    store.migrate().await?;

    let names: Vec<&str> = category::seed_names().collect();
    let added = store.seed_categories(&names).await?;
    if added > 0 {
        info!(added, "Seeded categories");
    }

    if seed_demo && store.seed_producer(demo_producer()).await? {
        info!("Seeded demo producer");
    }
    Ok(())
}
