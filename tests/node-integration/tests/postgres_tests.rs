#![cfg(feature = "postgres-tests")]

//! Runs against a real database. Needs `DATABASE_URL`; each test uses its own
//! phone numbers so runs can share one database.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;

use mercado_common::error::MarketError;
use mercado_common::phone::Phone;
use mercado_common::producer::NewProducer;
use mercado_common::product::{ProductDetails, ProductId};
use mercado_node::store::{PgStore, Store, StoreError};
use mercado_node_integration::harness::{epoch, TestApp};

async fn pg_store() -> Arc<PgStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    Arc::new(PgStore::connect(&url, 4).unwrap())
}

/// A phone nobody else in this run has used.
fn unique_phone(prefix: u32) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("{prefix}{:08}", nanos % 100_000_000)
}

#[tokio::test]
async fn router_walkthrough_on_postgres() {
    let app = TestApp::with_store(pg_store().await).await;
    let phone = unique_phone(31);

    let reply = app.publish(&phone, "Ana PG", "Producto A PG", "Frutas").await;
    assert!(reply.is_redirect_to("/"), "{reply:?}");
    let reply = app.publish(&phone, "Ana PG", "Producto B PG", "Frutas").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app
        .get(&format!("/admin/activar-por-telefono?tel={phone}&meses=1"))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let reply = app.publish(&phone, "Ana PG", "Producto B PG", "Frutas").await;
    assert!(reply.is_redirect_to("/"));

    let reply = app.get(&format!("/mis-productos?tel={phone}")).await;
    assert!(reply.body.contains("Producto A PG"));
    assert!(reply.body.contains("Producto B PG"));

    let health = app.get("/health").await;
    assert!(health.body.contains("postgres"));
}

#[tokio::test]
async fn unknown_category_rolls_back_new_producer() {
    let store = pg_store().await;
    store.migrate().await.unwrap();
    let phone: Phone = unique_phone(32).parse().unwrap();

    let producer = NewProducer::new("Rollback", "", phone.clone()).unwrap();
    let details = ProductDetails::new(
        "Nada",
        1.0,
        "kg",
        1.0,
        "",
        mercado_common::category::CategoryId(i64::MAX),
    )
    .unwrap();
    let err = store.submit_product(producer, details, epoch()).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rule(MarketError::UnknownCategory(_))
    ));
    assert!(store.producer_by_phone(&phone).await.unwrap().is_none());
}

#[tokio::test]
async fn ownership_and_sweep_on_postgres() {
    let store = pg_store().await;
    let app = TestApp::with_store(store.clone()).await;
    let owner = unique_phone(33);
    let stranger: Phone = unique_phone(34).parse().unwrap();

    app.publish(&owner, "Dueño", "Leña seca", "Insumos").await;
    let id = ProductId(app.product_id(&owner, "Leña seca").await);

    let err = store.withdraw_product(id, &stranger).await.unwrap_err();
    assert!(matches!(err, StoreError::Rule(MarketError::Unauthorized)));

    let owner_phone: Phone = owner.parse().unwrap();
    let withdrawn = store.withdraw_product(id, &owner_phone).await.unwrap();
    assert!(!withdrawn.is_available());

    store
        .activate_premium(&owner_phone, 1, epoch())
        .await
        .unwrap();
    let lapsed = store
        .sweep_expired(epoch() + chrono::Duration::days(31))
        .await
        .unwrap();
    assert!(lapsed.iter().any(|p| p.phone == owner_phone));
    let producer = store.producer_by_phone(&owner_phone).await.unwrap().unwrap();
    assert!(!producer.premium);
}
