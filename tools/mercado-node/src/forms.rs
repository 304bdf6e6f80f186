//! Form and query payloads. Fields arrive as strings and are validated here so
//! a bad number becomes a 400 page instead of an extractor rejection.

use axum::http::{header, HeaderMap};
use serde::Deserialize;

use mercado_common::category::CategoryId;
use mercado_common::error::MarketError;
use mercado_common::phone::Phone;
use mercado_common::producer::NewProducer;
use mercado_common::product::ProductDetails;
use mercado_common::subscription;

#[derive(Debug, Deserialize)]
pub struct PhoneForm {
    #[serde(default)]
    pub telefono: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneQuery {
    pub tel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateQuery {
    pub tel: Option<String>,
    pub meses: Option<String>,
}

/// Second step of the publish flow.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub productor_nombre: String,
    #[serde(default)]
    pub productor_finca: String,
    #[serde(default)]
    pub productor_telefono: String,
    #[serde(flatten)]
    pub product: ProductFields,
}

#[derive(Debug, Deserialize)]
pub struct ProductFields {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub cantidad: String,
    #[serde(default)]
    pub unidad: String,
    #[serde(default)]
    pub precio: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub categoria_id: String,
}

/// Edit form. `telefono` is the owner's phone unless a bearer header is sent.
#[derive(Debug, Deserialize)]
pub struct EditForm {
    #[serde(default)]
    pub telefono: String,
    #[serde(flatten)]
    pub product: ProductFields,
}

fn parse_number(raw: &str, field: &'static str) -> Result<f64, MarketError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| MarketError::invalid(field, "must be a number"))
}

impl ProductFields {
    pub fn parse(&self) -> Result<ProductDetails, MarketError> {
        let category = self
            .categoria_id
            .trim()
            .parse::<i64>()
            .map_err(|_| MarketError::invalid("category", "must be chosen from the list"))?;
        ProductDetails::new(
            &self.nombre,
            parse_number(&self.cantidad, "quantity")?,
            &self.unidad,
            parse_number(&self.precio, "price")?,
            &self.descripcion,
            CategoryId(category),
        )
    }
}

impl SubmitForm {
    pub fn parse(&self) -> Result<(NewProducer, ProductDetails), MarketError> {
        let phone = Phone::parse(&self.productor_telefono)?;
        let producer = NewProducer::new(&self.productor_nombre, &self.productor_finca, phone)?;
        Ok((producer, self.product.parse()?))
    }
}

/// Months for an activation; absent or blank means one.
pub fn parse_months(raw: Option<&str>) -> Result<u32, MarketError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| MarketError::InvalidMonths)
            .and_then(subscription::validate_months),
    }
}

/// The phone a caller presents for a gated operation. An
/// `Authorization: Bearer <phone>` header takes precedence over `fallback`.
/// The scheme name is case-insensitive.
pub fn presented_phone(headers: &HeaderMap, fallback: Option<&str>) -> Result<Phone, MarketError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty());

    let raw = bearer
        .or(fallback.map(str::trim).filter(|raw| !raw.is_empty()))
        .ok_or(MarketError::Unauthorized)?;
    Phone::parse(raw).map_err(|_| MarketError::Unauthorized)
}
