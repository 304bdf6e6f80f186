use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use mercado_common::category::CategoryId;
use mercado_common::error::MarketError;
use mercado_common::listing::active_count;
use mercado_common::phone::Phone;
use mercado_common::product::ProductId;

use crate::error::AppError;
use crate::forms::{
    parse_months, presented_phone, ActivateQuery, EditForm, PhoneForm, PhoneQuery, SubmitForm,
};
use crate::store::StoreError;
use crate::views::{
    phone_query, render, CapacityPage, EditProductPage, IndexPage, MessagePage, MyProductsPage,
    PublishDetailsPage, PublishStartPage,
};
use crate::AppState;

type Page = Result<Html<String>, AppError>;

fn owner_list(phone: &Phone) -> Redirect {
    Redirect::to(&format!("/mis-productos?tel={}", phone_query(phone)))
}

// ─── Public listing ─────────────────────────────────────────────────────────

pub async fn index(State(state): State<AppState>) -> Page {
    let categories = state.store.categories().await?;
    let listings = state.store.list_available(None).await?;
    render(&IndexPage::new(&categories, None, &listings))
}

pub async fn by_category(State(state): State<AppState>, Path(id): Path<i64>) -> Page {
    let category = CategoryId(id);
    let categories = state.store.categories().await?;
    let listings = state.store.list_available(Some(category)).await?;
    render(&IndexPage::new(&categories, Some(category), &listings))
}

// ─── Publish flow ───────────────────────────────────────────────────────────

pub async fn publish_start() -> Page {
    render(&PublishStartPage {})
}

pub async fn publish_details(State(state): State<AppState>, Form(form): Form<PhoneForm>) -> Page {
    let phone = Phone::parse(&form.telefono)?;
    let known = match state.store.producer_by_phone(&phone).await? {
        Some(_) => Some(state.store.products_by_phone(&phone).await?),
        None => None,
    };
    let categories = state.store.categories().await?;
    let page = PublishDetailsPage::new(
        &phone,
        known
            .as_ref()
            .map(|(producer, products)| (producer, active_count(products))),
        &categories,
    );
    render(&page)
}

pub async fn submit_product(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> Result<Response, AppError> {
    let (producer, details) = form.parse()?;
    let phone = producer.phone.clone();

    match state
        .store
        .submit_product(producer, details, state.clock.now())
        .await
    {
        Ok(product) => {
            info!(product = %product.id, %phone, "Product published");
            Ok(Redirect::to("/").into_response())
        }
        Err(StoreError::Rule(MarketError::CapacityExceeded { active, limit })) => {
            info!(%phone, active, limit, "Free-plan limit reached");
            let page = render(&CapacityPage::new(&state.premium))?;
            Ok((StatusCode::FORBIDDEN, page).into_response())
        }
        Err(StoreError::Rule(rule)) => Err(rule.into()),
        Err(e) => Err(AppError::Submission(e)),
    }
}

pub async fn mark_sold(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let id = ProductId(id);
    if state.store.mark_sold(id).await? {
        info!(product = %id, "Product marked sold");
    }
    Ok(Redirect::to("/"))
}

// ─── Owner pages ────────────────────────────────────────────────────────────

async fn owner_page(state: &AppState, raw_phone: &str) -> Page {
    let phone = Phone::parse(raw_phone)?;
    let (producer, products) = state.store.products_by_phone(&phone).await?;
    render(&MyProductsPage::new(&producer, &products))
}

pub async fn my_products_form(
    State(state): State<AppState>,
    Query(query): Query<PhoneQuery>,
) -> Page {
    match query.tel.as_deref().map(str::trim) {
        Some(tel) if !tel.is_empty() => owner_page(&state, tel).await,
        _ => render(&MyProductsPage::lookup_form()),
    }
}

pub async fn my_products(State(state): State<AppState>, Form(form): Form<PhoneForm>) -> Page {
    owner_page(&state, &form.telefono).await
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PhoneQuery>,
    headers: HeaderMap,
) -> Page {
    let id = ProductId(id);
    let phone = presented_phone(&headers, query.tel.as_deref())?;
    let owned = state
        .store
        .product(id)
        .await?
        .ok_or(MarketError::ProductNotFound(id))?;
    owned.owner.authorize(&phone)?;
    let categories = state.store.categories().await?;
    render(&EditProductPage::new(&owned.product, &phone, &categories))
}

pub async fn edit_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Form(form): Form<EditForm>,
) -> Result<Redirect, AppError> {
    let phone = presented_phone(&headers, Some(&form.telefono))?;
    let details = form.product.parse()?;
    let product = state
        .store
        .update_product(ProductId(id), &phone, details)
        .await?;
    info!(product = %product.id, %phone, "Product updated");
    Ok(owner_list(&phone))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PhoneQuery>,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let phone = presented_phone(&headers, query.tel.as_deref())?;
    let product = state.store.withdraw_product(ProductId(id), &phone).await?;
    info!(product = %product.id, %phone, "Product withdrawn");
    Ok(owner_list(&phone))
}

// ─── Admin ──────────────────────────────────────────────────────────────────

pub async fn activate(State(state): State<AppState>, Query(query): Query<ActivateQuery>) -> Page {
    let tel = match query.tel.as_deref().map(str::trim) {
        Some(tel) if !tel.is_empty() => tel,
        _ => {
            return render(&MessagePage::new(
                "ℹ️",
                "Activar Premium",
                "Uso: /admin/activar-por-telefono?tel=3001234567&meses=1",
            ))
        }
    };
    let phone = Phone::parse(tel)?;
    let months = parse_months(query.meses.as_deref())?;
    let producer = state
        .store
        .activate_premium(&phone, months, state.clock.now())
        .await?;
    info!(producer = %producer.id, %phone, months, "Premium activated");
    render(&MessagePage::new(
        "✅",
        "Premium activado",
        format!("¡Activado! {} es Premium por {months} meses.", producer.name),
    ))
}

pub async fn sweep(State(state): State<AppState>) -> Page {
    let lapsed = state.store.sweep_expired(state.clock.now()).await?;
    for producer in &lapsed {
        info!(producer = %producer.id, phone = %producer.phone, "Premium expired");
    }
    info!(count = lapsed.len(), "Subscription sweep finished");
    render(&MessagePage::new(
        "🔄",
        "Suscripciones actualizadas",
        format!("{} suscripciones desactivadas por vencimiento.", lapsed.len()),
    ))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "backend": state.store.backend() }))
}
