//! Catalog Product

use serde::{Deserialize, Serialize};

/// Canonical catalog product as read from the catalog feed.
///
/// `sku` is the canonical identity. `sku_master`, when present, is the SKU
/// under which this product's master box (case/carton) is sold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogProduct {
    pub sku: String,
    pub sku_master: Option<String>,
    pub sku_primario: Option<String>,
    pub category: Option<String>,
    pub package_type: Option<String>,
    pub brand: Option<String>,
    pub language: Option<String>,
    pub units_per_display: Option<i32>,
    pub items_per_master_box: Option<i32>,
    pub product_name: Option<String>,
    pub master_box_name: Option<String>,
    pub is_active: bool,
}

impl CatalogProduct {
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sku: sku.into(), sku_master: None, sku_primario: None, category: None, package_type: None,
            brand: None, language: None, units_per_display: None, items_per_master_box: None,
            product_name: Some(name.into()), master_box_name: None, is_active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = Some(category.into()); self }
    pub fn with_sku_primario(mut self, sku: impl Into<String>) -> Self { self.sku_primario = Some(sku.into()); self }
    pub fn with_units_per_display(mut self, units: i32) -> Self { self.units_per_display = Some(units); self }
    pub fn inactive(mut self) -> Self { self.is_active = false; self }

    pub fn with_master_box(mut self, sku_master: impl Into<String>, items_per_master_box: i32, name: impl Into<String>) -> Self {
        self.sku_master = Some(sku_master.into());
        self.items_per_master_box = Some(items_per_master_box);
        self.master_box_name = Some(name.into());
        self
    }

    /// Name shown on a fact line. Master-box sales prefer the box name.
    pub fn display_name(&self, is_master_box: bool) -> Option<&str> {
        let product_name = self.product_name.as_deref();
        if is_master_box { self.master_box_name.as_deref().or(product_name) } else { product_name }
    }
}
