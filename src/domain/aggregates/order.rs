//! Orders and order line items consumed from the sales channels

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{ACCEPTED_INVOICE_STATUSES, CANCELLED_STATUS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_date: DateTime<Utc>,
    pub channel_id: Option<i64>,
    pub customer_id: Option<Uuid>,
    /// Channel identifier: POS/ERP, webstore, marketplace, manual...
    pub source: Option<String>,
    pub invoice_status: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: Uuid,
    pub product_sku: Option<String>,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub total: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)] pub struct Channel { pub id: i64, pub name: String }
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)] pub struct Customer { pub id: Uuid, pub name: Option<String>, pub rut: Option<String> }

impl Order {
    pub fn new(id: Uuid, order_date: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            id, order_date, channel_id: None, customer_id: None, source: Some(source.into()),
            invoice_status: Some("accepted".into()), status: Some("completed".into()),
        }
    }

    pub fn with_invoice_status(mut self, status: impl Into<String>) -> Self { self.invoice_status = Some(status.into()); self }
    pub fn with_status(mut self, status: impl Into<String>) -> Self { self.status = Some(status.into()); self }

    /// Only accepted, non-cancelled orders count as sales.
    pub fn is_billable(&self) -> bool {
        let accepted = self.invoice_status.as_deref().map(str::trim)
            .is_some_and(|s| ACCEPTED_INVOICE_STATUSES.iter().any(|a| a.eq_ignore_ascii_case(s)));
        let cancelled = self.status.as_deref().is_some_and(|s| s.trim().eq_ignore_ascii_case(CANCELLED_STATUS));
        accepted && !cancelled
    }
}

impl OrderLineItem {
    pub fn new(id: i64, order_id: Uuid, sku: impl Into<String>, quantity: i32) -> Self {
        Self {
            id, order_id, product_sku: Some(sku.into()), product_name: None, quantity,
            unit_price: None, subtotal: None, total: None, tax_amount: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self { self.product_name = Some(name.into()); self }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_billable_statuses() {
        let order = Order::new(Uuid::nil(), Utc::now(), "relbase");
        assert!(order.is_billable());
        assert!(order.clone().with_invoice_status("accepted_objection").is_billable());
        assert!(!order.clone().with_invoice_status("rejected").is_billable());
        assert!(!order.clone().with_status("cancelled").is_billable());
        let mut pending = order;
        pending.invoice_status = None;
        assert!(!pending.is_billable());
    }
}
