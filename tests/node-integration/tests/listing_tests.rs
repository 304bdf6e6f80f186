use axum::http::StatusCode;

use mercado_node_integration::harness::TestApp;

const ANA: &str = "3001112222";
const LUIS: &str = "3104445555";

#[tokio::test]
async fn empty_market_shows_placeholder() {
    let app = TestApp::new().await;
    let reply = app.get("/").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Todos los productos"));
    assert!(reply.body.contains("No hay productos"));
}

#[tokio::test]
async fn published_product_appears_on_listing() {
    let app = TestApp::new().await;

    let reply = app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;
    assert!(reply.is_redirect_to("/"), "{reply:?}");

    let body = app.get("/").await.body;
    assert!(body.contains("Tomate chonto"));
    assert!(body.contains("$5.000"));
    assert!(body.contains("Ana"));
    assert!(body.contains("La Esperanza"));
    assert!(body.contains("wa.me/3001112222"));
}

/// Free plan: the second simultaneous listing is refused with the upsell page.
#[tokio::test]
async fn second_free_listing_is_refused() {
    let app = TestApp::new().await;
    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;

    let reply = app.publish(ANA, "Ana", "Papa criolla", "Tubérculos").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.body.contains("Límite alcanzado"));
    assert!(reply.body.contains("https://wa.me/573143539351?text="));
    assert!(reply.body.contains("$10.000"));

    let body = app.get("/").await.body;
    assert!(body.contains("Tomate chonto"));
    assert!(!body.contains("Papa criolla"));
}

#[tokio::test]
async fn selling_frees_the_slot() {
    let app = TestApp::new().await;
    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;
    let id = app.product_id(ANA, "Tomate chonto").await;

    let reply = app.get(&format!("/vender/{id}")).await;
    assert!(reply.is_redirect_to("/"));
    assert!(!app.get("/").await.body.contains("Tomate chonto"));

    // Selling twice is harmless.
    assert!(app.get(&format!("/vender/{id}")).await.is_redirect_to("/"));

    let reply = app.publish(ANA, "Ana", "Papa criolla", "Tubérculos").await;
    assert!(reply.is_redirect_to("/"));
    assert!(app.get("/").await.body.contains("Papa criolla"));
}

#[tokio::test]
async fn selling_unknown_product_still_redirects() {
    let app = TestApp::new().await;
    assert!(app.get("/vender/999").await.is_redirect_to("/"));
}

#[tokio::test]
async fn category_page_filters_listing() {
    let app = TestApp::new().await;
    app.publish(ANA, "Ana", "Mango tommy", "Frutas").await;
    app.publish(LUIS, "Luis", "Miel de abejas", "Miel").await;

    let frutas = app.category_id("Frutas").await;
    let reply = app.get(&format!("/categoria/{frutas}")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("🍎 Frutas"));
    assert!(reply.body.contains("Mango tommy"));
    assert!(!reply.body.contains("Miel de abejas"));

    let reply = app.get("/categoria/999").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("No hay productos"));
}

/// Premium producers are listed ahead of newer free listings.
#[tokio::test]
async fn premium_listings_come_first() {
    let app = TestApp::new().await;
    app.publish(LUIS, "Luis", "Queso campesino", "Lácteos").await;
    app.get(&format!("/admin/activar-por-telefono?tel={LUIS}&meses=1"))
        .await;

    app.advance_days(1);
    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;

    let body = app.get("/").await.body;
    let queso = body.find("Queso campesino").unwrap();
    let tomate = body.find("Tomate chonto").unwrap();
    assert!(queso < tomate, "premium listing should be first");
}

#[tokio::test]
async fn newest_free_listing_first() {
    let app = TestApp::new().await;
    app.publish(LUIS, "Luis", "Queso campesino", "Lácteos").await;
    app.advance_days(1);
    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;

    let body = app.get("/").await.body;
    assert!(body.find("Tomate chonto").unwrap() < body.find("Queso campesino").unwrap());
}

#[tokio::test]
async fn unknown_category_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let reply = app
        .post(
            "/publicar",
            &[
                ("productor_nombre", "Ana"),
                ("productor_telefono", ANA),
                ("nombre", "Tomate"),
                ("categoria_id", "999"),
                ("cantidad", "1"),
                ("unidad", "kg"),
                ("precio", "1000"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    // No producer row was left behind.
    let reply = app.get(&format!("/mis-productos?tel={ANA}")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_submission_is_bad_request() {
    let app = TestApp::new().await;
    let verduras = app.category_id("Verduras").await.to_string();

    for (phone, quantity, price) in [("12", "1", "1000"), (ANA, "cero", "1000"), (ANA, "1", "-5")] {
        let reply = app
            .post(
                "/publicar",
                &[
                    ("productor_nombre", "Ana"),
                    ("productor_telefono", phone),
                    ("nombre", "Tomate"),
                    ("categoria_id", &verduras),
                    ("cantidad", quantity),
                    ("unidad", "kg"),
                    ("precio", price),
                ],
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{phone} {quantity} {price}");
    }
    assert!(app.get("/").await.body.contains("No hay productos"));
}

#[tokio::test]
async fn existing_producer_keeps_identity() {
    let app = TestApp::new().await;
    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;
    let id = app.product_id(ANA, "Tomate chonto").await;
    app.get(&format!("/vender/{id}")).await;

    app.publish("300 111 2222", "Otra Persona", "Papa criolla", "Tubérculos")
        .await;
    let body = app.get("/").await.body;
    assert!(body.contains("Papa criolla"));
    assert!(body.contains("Ana"));
    assert!(!body.contains("Otra Persona"));
}

#[tokio::test]
async fn publish_flow_prefills_known_producer() {
    let app = TestApp::new().await;

    let reply = app.get("/publicar").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("action=\"/publicar/paso2\""));

    let reply = app.post("/publicar/paso2", &[("telefono", "3009998888")]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("value=\"3009998888\""));
    assert!(!reply.body.contains("hola de nuevo"));

    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;
    let reply = app.post("/publicar/paso2", &[("telefono", ANA)]).await;
    assert!(reply.body.contains("hola de nuevo, Ana"));
    assert!(reply.body.contains("solo puedes tener 1 producto activo"));

    let reply = app.post("/publicar/paso2", &[("telefono", "abc")]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_memory_backend() {
    let app = TestApp::new().await;
    let reply = app.get("/health").await;
    assert_eq!(reply.status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "memory");
}

#[tokio::test]
async fn tiny_quantity_is_not_listed_as_zero() {
    let app = TestApp::new().await;
    let insumos = app.category_id("Insumos").await.to_string();
    let reply = app
        .post(
            "/publicar",
            &[
                ("productor_nombre", "Ana"),
                ("productor_telefono", ANA),
                ("nombre", "Semilla de azafrán"),
                ("categoria_id", &insumos),
                ("cantidad", "0.0004"),
                ("unidad", "kg"),
                ("precio", "90000"),
            ],
        )
        .await;
    assert!(reply.is_redirect_to("/"), "{reply:?}");

    let body = app.get("/").await.body;
    assert!(body.contains("0.0004 kg"));
    assert!(!body.contains(">0 kg"));
}

/// A producer whose listings are all sold is still recognised, without the
/// free-plan warning.
#[tokio::test]
async fn publish_flow_recognises_producer_with_nothing_active() {
    let app = TestApp::new().await;
    app.publish(ANA, "Ana", "Tomate chonto", "Verduras").await;
    let id = app.product_id(ANA, "Tomate chonto").await;
    app.get(&format!("/vender/{id}")).await;

    let reply = app.post("/publicar/paso2", &[("telefono", ANA)]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("hola de nuevo, Ana"));
    assert!(!reply.body.contains("solo puedes tener 1 producto activo"));
}
