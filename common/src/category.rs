use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product category. Seeded at startup and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn style(&self) -> CategoryStyle {
        style_for(&self.name)
    }
}

/// Display metadata for a category. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

const DEFAULT_STYLE: CategoryStyle = CategoryStyle {
    icon: "📦",
    color: "#eeeeee",
};

/// The seed list, in display order.
pub const CATALOG: [(&str, CategoryStyle); 15] = [
    ("Alimentos", CategoryStyle { icon: "🍲", color: "#fff3e0" }),
    ("Frutas", CategoryStyle { icon: "🍎", color: "#ffecd2" }),
    ("Verduras", CategoryStyle { icon: "🥬", color: "#e8f5e9" }),
    ("Tubérculos", CategoryStyle { icon: "🥔", color: "#fff8e1" }),
    ("Lácteos", CategoryStyle { icon: "🥛", color: "#f3e5f5" }),
    ("Huevos", CategoryStyle { icon: "🥚", color: "#e3f2fd" }),
    ("Miel", CategoryStyle { icon: "🍯", color: "#fff3e0" }),
    ("Carnes", CategoryStyle { icon: "🥩", color: "#ffebee" }),
    ("Granos", CategoryStyle { icon: "🌾", color: "#f1f8e9" }),
    ("Artesanías", CategoryStyle { icon: "🧺", color: "#f8bbd0" }),
    ("Insumos", CategoryStyle { icon: "🌱", color: "#e8f5e9" }),
    ("Herramientas", CategoryStyle { icon: "🛠️", color: "#f5f5f5" }),
    ("Servicios", CategoryStyle { icon: "👨‍🌾", color: "#e3f2fd" }),
    ("Maquinaria", CategoryStyle { icon: "🚜", color: "#ffe0b2" }),
    ("Otros", CategoryStyle { icon: "📦", color: "#eeeeee" }),
];

/// Names to seed, in catalog order.
pub fn seed_names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(name, _)| *name)
}

/// Look up the style for a category name, falling back to the "Otros" look.
pub fn style_for(name: &str) -> CategoryStyle {
    CATALOG
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, style)| *style)
        .unwrap_or(DEFAULT_STYLE)
}
