use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use mercado_common::error::MarketError;

use crate::store::StoreError;
use crate::views::MessagePage;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Rule(#[from] MarketError),

    #[error("malformed input: {0}")]
    Malformed(String),

    /// Anything unexpected while saving a new product. The transaction has
    /// already been rolled back when this is built.
    #[error("product submission failed: {0}")]
    Submission(StoreError),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Rule(rule) => AppError::Rule(rule),
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rule(rule) if rule.is_malformed_input() => StatusCode::BAD_REQUEST,
            AppError::Rule(MarketError::CapacityExceeded { .. } | MarketError::Unauthorized) => {
                StatusCode::FORBIDDEN
            }
            AppError::Rule(MarketError::ProducerNotFound | MarketError::ProductNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Rule(_) | AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::Submission(_) | AppError::Store(_) | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn page(&self) -> MessagePage {
        match self {
            AppError::Rule(MarketError::CapacityExceeded { limit, .. }) => MessagePage::new(
                "❌",
                "Límite alcanzado",
                format!("En el plan Gratis solo puedes tener {limit} producto activo."),
            ),
            AppError::Rule(MarketError::Unauthorized) => MessagePage::new(
                "🔒",
                "No autorizado",
                "El celular no coincide con el del productor de este producto.",
            ),
            AppError::Rule(MarketError::ProducerNotFound) => MessagePage::new(
                "❌",
                "Productor no encontrado",
                "Publica al menos un producto primero.",
            ),
            AppError::Rule(MarketError::ProductNotFound(_)) => {
                MessagePage::new("❌", "Producto no encontrado", "El producto no existe.")
            }
            AppError::Rule(MarketError::InvalidPhone) => MessagePage::new(
                "📞",
                "Celular inválido",
                "Escribe un número de 7 a 15 dígitos.",
            ),
            AppError::Rule(MarketError::InvalidMonths) => MessagePage::new(
                "📅",
                "Meses inválidos",
                "Los meses deben ser un número entero entre 1 y 1200.",
            ),
            AppError::Rule(MarketError::UnknownCategory(_)) => MessagePage::new(
                "⚠️",
                "Categoría inválida",
                "Elige una de las categorías de la lista.",
            ),
            AppError::Rule(MarketError::InvalidField { field, reason }) => MessagePage::new(
                "⚠️",
                "Datos inválidos",
                format!("Revisa el campo {field}: {reason}."),
            ),
            AppError::Malformed(detail) => {
                MessagePage::new("⚠️", "Datos inválidos", detail.clone())
            }
            AppError::Submission(_) => MessagePage::new(
                "❌",
                "Error al guardar",
                "Error al guardar. Verifica los datos.",
            ),
            AppError::Store(_) | AppError::Template(_) => MessagePage::new(
                "❌",
                "Error",
                "Ocurrió un error inesperado. Intenta de nuevo.",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let page = self.page();
        match askama::Template::render(&page) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, page.body).into_response(),
        }
    }
}
