use axum::http::StatusCode;

use mercado_common::phone::Phone;
use mercado_node_integration::harness::TestApp;

const PHONE: &str = "3001112222";

async fn is_premium(app: &TestApp, phone: &str) -> bool {
    let phone: Phone = phone.parse().unwrap();
    app.store
        .producer_by_phone(&phone)
        .await
        .unwrap()
        .map(|p| p.premium)
        .unwrap_or(false)
}

/// Free listing, refused second listing, activation, second listing, expiry.
#[tokio::test]
async fn premium_lifecycle_walkthrough() {
    let app = TestApp::new().await;

    let reply = app.publish(PHONE, "Ana", "Producto A", "Frutas").await;
    assert!(reply.is_redirect_to("/"));

    let reply = app.publish(PHONE, "Ana", "Producto B", "Frutas").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app
        .get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses=1"))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("¡Activado! Ana es Premium por 1 meses."));
    assert!(is_premium(&app, PHONE).await);

    let reply = app.publish(PHONE, "Ana", "Producto B", "Frutas").await;
    assert!(reply.is_redirect_to("/"));
    let body = app.get("/").await.body;
    assert!(body.contains("Producto A"));
    assert!(body.contains("Producto B"));
    assert!(body.contains("⭐ Premium"));

    app.advance_days(31);
    let reply = app.get("/admin/actualizar-suscripciones").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("1 suscripciones desactivadas por vencimiento."));
    assert!(!is_premium(&app, PHONE).await);

    // Existing listings stay up; new ones are capped again.
    let reply = app.publish(PHONE, "Ana", "Producto C", "Frutas").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(app.get("/").await.body.contains("Producto B"));
}

#[tokio::test]
async fn premium_producer_has_no_cap() {
    let app = TestApp::new().await;
    app.publish(PHONE, "Ana", "Producto 1", "Frutas").await;
    app.get(&format!("/admin/activar-por-telefono?tel={PHONE}"))
        .await;

    for n in 2..=5 {
        let reply = app
            .publish(PHONE, "Ana", &format!("Producto {n}"), "Frutas")
            .await;
        assert!(reply.is_redirect_to("/"), "product {n}: {reply:?}");
    }
    let phone: Phone = PHONE.parse().unwrap();
    let (_, products) = app.store.products_by_phone(&phone).await.unwrap();
    assert_eq!(products.len(), 5);
}

#[tokio::test]
async fn activation_without_phone_shows_usage() {
    let app = TestApp::new().await;
    let reply = app.get("/admin/activar-por-telefono").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Uso:"));
}

#[tokio::test]
async fn activation_errors() {
    let app = TestApp::new().await;

    let reply = app
        .get("/admin/activar-por-telefono?tel=3209990000&meses=1")
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("Publica al menos un producto primero."));

    app.publish(PHONE, "Ana", "Producto A", "Frutas").await;
    for meses in ["0", "-1", "uno"] {
        let reply = app
            .get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses={meses}"))
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "meses={meses}");
    }
    assert!(!is_premium(&app, PHONE).await);
}

/// Expiry is activation + 30 days per month, and only strictly after that.
#[tokio::test]
async fn sweep_respects_paid_months() {
    let app = TestApp::new().await;
    app.publish(PHONE, "Ana", "Producto A", "Frutas").await;
    app.publish("3104445555", "Luis", "Producto L", "Miel").await;
    app.get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses=2"))
        .await;
    app.get("/admin/activar-por-telefono?tel=3104445555&meses=1")
        .await;

    app.advance_days(30);
    let reply = app.get("/admin/actualizar-suscripciones").await;
    assert!(reply.body.contains("0 suscripciones desactivadas"));

    app.advance_days(1);
    let reply = app.get("/admin/actualizar-suscripciones").await;
    assert!(reply.body.contains("1 suscripciones desactivadas"));
    assert!(is_premium(&app, PHONE).await);
    assert!(!is_premium(&app, "3104445555").await);

    app.advance_days(30);
    let reply = app.get("/admin/actualizar-suscripciones").await;
    assert!(reply.body.contains("1 suscripciones desactivadas"));
    assert!(!is_premium(&app, PHONE).await);

    // Nothing left to sweep.
    let reply = app.get("/admin/actualizar-suscripciones").await;
    assert!(reply.body.contains("0 suscripciones desactivadas"));
}

#[tokio::test]
async fn reactivation_restarts_the_period() {
    let app = TestApp::new().await;
    app.publish(PHONE, "Ana", "Producto A", "Frutas").await;
    app.get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses=1"))
        .await;

    app.advance_days(25);
    app.get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses=1"))
        .await;

    app.advance_days(10);
    app.get("/admin/actualizar-suscripciones").await;
    assert!(is_premium(&app, PHONE).await);
}

/// Activations too long to date are refused and leave the sweep working.
#[tokio::test]
async fn oversized_activation_is_rejected() {
    let app = TestApp::new().await;
    app.publish(PHONE, "Ana", "Producto A", "Frutas").await;

    for meses in ["4000000", "1201", "4294967295"] {
        let reply = app
            .get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses={meses}"))
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "meses={meses}");
        assert!(reply.body.contains("entre 1 y 1200"));
    }
    assert!(!is_premium(&app, PHONE).await);

    let reply = app
        .get(&format!("/admin/activar-por-telefono?tel={PHONE}&meses=1200"))
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = app.get("/admin/actualizar-suscripciones").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("0 suscripciones desactivadas"));

    let reply = app.get(&format!("/mis-productos?tel={PHONE}")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("⭐ Premium"));
}
