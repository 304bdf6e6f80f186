//! Server-rendered pages. Templates live in `templates/`; the structs here
//! are flat, pre-formatted view models so the templates stay logic-free.

use askama::Template;
use axum::response::Html;
use chrono::{DateTime, Utc};

use mercado_common::category::{Category, CategoryId};
use mercado_common::currency::{format_cop, format_quantity};
use mercado_common::listing::{Listing, FREE_PLAN_ACTIVE_LIMIT};
use mercado_common::phone::Phone;
use mercado_common::producer::Producer;
use mercado_common::product::Product;

use crate::config::PremiumSettings;
use crate::error::AppError;

pub fn render(page: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Query-string form of a phone (`+` must not turn into a space).
pub fn phone_query(phone: &Phone) -> String {
    phone.as_str().replace('+', "%2B")
}

// ─── Shared pieces ──────────────────────────────────────────────────────────

pub struct CategoryOption {
    pub id: i64,
    pub name: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: &[Category], selected: Option<CategoryId>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| {
                let style = c.style();
                CategoryOption {
                    id: c.id.0,
                    name: c.name.clone(),
                    icon: style.icon,
                    color: style.color,
                    selected: selected == Some(c.id),
                }
            })
            .collect()
    }
}

pub struct ListingCard {
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub price: String,
    pub description: String,
    pub producer: String,
    pub farm: String,
    pub whatsapp: String,
    pub premium: bool,
    pub category: String,
    pub icon: &'static str,
    pub color: &'static str,
}

impl From<&Listing> for ListingCard {
    fn from(listing: &Listing) -> Self {
        let style = listing.category.style();
        let product = &listing.product;
        ListingCard {
            name: product.name.clone(),
            quantity: format_quantity(product.quantity),
            unit: product.unit.clone(),
            price: format_cop(product.price),
            description: product.description.clone().unwrap_or_default(),
            producer: listing.producer_name.clone(),
            farm: listing.farm.clone().unwrap_or_default(),
            whatsapp: listing.phone.whatsapp_digits().to_string(),
            premium: listing.premium,
            category: listing.category.name.clone(),
            icon: style.icon,
            color: style.color,
        }
    }
}

// ─── Pages ──────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub heading: String,
    pub categories: Vec<CategoryOption>,
    pub listings: Vec<ListingCard>,
}

impl IndexPage {
    pub fn new(categories: &[Category], selected: Option<CategoryId>, listings: &[Listing]) -> Self {
        let heading = selected
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map(|c| format!("{} {}", c.style().icon, c.name))
            .unwrap_or_else(|| "Todos los productos".to_string());
        IndexPage {
            heading,
            categories: CategoryOption::list(categories, selected),
            listings: listings.iter().map(ListingCard::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "publish.html")]
pub struct PublishStartPage {}

#[derive(Template)]
#[template(path = "publish_details.html")]
pub struct PublishDetailsPage {
    pub phone: String,
    pub name: String,
    pub farm: String,
    pub existing: bool,
    pub premium: bool,
    pub at_free_limit: bool,
    pub categories: Vec<CategoryOption>,
}

impl PublishDetailsPage {
    pub fn new(
        phone: &Phone,
        producer: Option<(&Producer, u64)>,
        categories: &[Category],
    ) -> Self {
        let (name, farm, premium, active) = match producer {
            Some((p, active)) => (
                p.name.clone(),
                p.farm.clone().unwrap_or_default(),
                p.premium,
                active,
            ),
            None => (String::new(), String::new(), false, 0),
        };
        PublishDetailsPage {
            phone: phone.to_string(),
            name,
            farm,
            existing: producer.is_some(),
            premium,
            at_free_limit: !premium && active >= FREE_PLAN_ACTIVE_LIMIT,
            categories: CategoryOption::list(categories, None),
        }
    }
}

pub struct OwnedRow {
    pub id: i64,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub price: String,
    pub status: &'static str,
    pub available: bool,
    pub created: String,
}

impl From<&Product> for OwnedRow {
    fn from(product: &Product) -> Self {
        OwnedRow {
            id: product.id.0,
            name: product.name.clone(),
            quantity: format_quantity(product.quantity),
            unit: product.unit.clone(),
            price: format_cop(product.price),
            status: product.status.label(),
            available: product.is_available(),
            created: format_date(product.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "my_products.html")]
pub struct MyProductsPage {
    pub found: bool,
    pub phone: String,
    pub phone_query: String,
    pub producer: String,
    pub premium: bool,
    pub premium_until: String,
    pub products: Vec<OwnedRow>,
}

impl MyProductsPage {
    pub fn lookup_form() -> Self {
        MyProductsPage {
            found: false,
            phone: String::new(),
            phone_query: String::new(),
            producer: String::new(),
            premium: false,
            premium_until: String::new(),
            products: Vec::new(),
        }
    }

    pub fn new(producer: &Producer, products: &[Product]) -> Self {
        MyProductsPage {
            found: true,
            phone: producer.phone.to_string(),
            phone_query: phone_query(&producer.phone),
            producer: producer.name.clone(),
            premium: producer.premium,
            premium_until: producer
                .subscription_expires_at()
                .map(format_date)
                .unwrap_or_default(),
            products: products.iter().map(OwnedRow::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "edit_product.html")]
pub struct EditProductPage {
    pub id: i64,
    pub phone: String,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub price: String,
    pub description: String,
    pub categories: Vec<CategoryOption>,
}

impl EditProductPage {
    pub fn new(product: &Product, phone: &Phone, categories: &[Category]) -> Self {
        EditProductPage {
            id: product.id.0,
            phone: phone.to_string(),
            name: product.name.clone(),
            quantity: product.quantity.to_string(),
            unit: product.unit.clone(),
            price: product.price.to_string(),
            description: product.description.clone().unwrap_or_default(),
            categories: CategoryOption::list(categories, Some(product.category_id)),
        }
    }
}

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessagePage {
    pub icon: &'static str,
    pub title: String,
    pub body: String,
}

impl MessagePage {
    pub fn new(icon: &'static str, title: impl Into<String>, body: impl Into<String>) -> Self {
        MessagePage {
            icon,
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "capacity.html")]
pub struct CapacityPage {
    pub limit: u64,
    pub price: String,
    pub whatsapp_url: String,
}

impl CapacityPage {
    pub fn new(settings: &PremiumSettings) -> Self {
        let price = format_cop(settings.monthly_price as f64);
        let text = format!("Hola, quiero activar mi plan Premium de {price} mensuales")
            .replace(' ', "%20")
            .replace('$', "%24");
        CapacityPage {
            limit: FREE_PLAN_ACTIVE_LIMIT,
            price,
            whatsapp_url: format!("https://wa.me/{}?text={text}", settings.contact),
        }
    }
}
