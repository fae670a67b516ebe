//! Sales Fact (derived, one per billable order line item)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::MatchType;

/// Resolved, unit-converted sale of one order line item.
///
/// `order_item_id` is the identity key; a refresh replaces the whole set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFact {
    pub order_item_id: i64,
    pub order_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub source: Option<String>,
    pub channel_id: Option<i64>,
    pub channel_name: Option<String>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_rut: Option<String>,

    pub original_sku: Option<String>,
    /// `None` means the line still needs a manual mapping.
    pub catalog_sku: Option<String>,
    pub sku_primario: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub package_type: Option<String>,
    pub brand: Option<String>,
    pub language: Option<String>,
    pub match_type: MatchType,
    pub mapping_rule_name: Option<String>,
    pub is_master_box: bool,

    pub quantity_multiplier: i64,
    pub conversion_factor: i64,
    pub original_units_sold: i64,
    pub units_sold: i64,

    pub unit_price: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub total: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub invoice_status: Option<String>,
}

impl SalesFact {
    pub fn is_unmapped(&self) -> bool { self.match_type == MatchType::Unmapped }
}
