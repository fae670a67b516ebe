//! PostgreSQL snapshot source and fact sink

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use crate::domain::aggregates::{CatalogProduct, Channel, Customer, MappingRule, Order, OrderLineItem, SalesFact};
use crate::store::{FactSink, Snapshot, SnapshotSource};
use crate::EngineError;

/// Postgres caps bind parameters at 65535 per statement.
const INSERT_CHUNK: usize = 1_000;

#[derive(Clone)]
pub struct PgSnapshotSource { pool: PgPool }

impl PgSnapshotSource {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl SnapshotSource for PgSnapshotSource {
    /// Reads every dataset inside one repeatable-read transaction so the
    /// pass sees a single consistent point in time.
    async fn load(&self) -> crate::Result<Snapshot> {
        let mut tx = self.pool.begin().await.map_err(EngineError::Snapshot)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY").execute(&mut *tx).await.map_err(EngineError::Snapshot)?;

        let products = sqlx::query_as::<_, CatalogProduct>(
            "SELECT sku, sku_master, sku_primario, category, package_type, brand, language, units_per_display, items_per_master_box, product_name, master_box_name, is_active FROM products ORDER BY sku")
            .fetch_all(&mut *tx).await.map_err(EngineError::Snapshot)?;
        let mapping_rules = sqlx::query_as::<_, MappingRule>(
            "SELECT id, source_pattern, pattern_type, source_filter, target_sku, quantity_multiplier, rule_name, is_active, priority FROM sku_mappings WHERE is_active ORDER BY id")
            .fetch_all(&mut *tx).await.map_err(EngineError::Snapshot)?;
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, order_date, channel_id, customer_id, source, invoice_status, status FROM orders")
            .fetch_all(&mut *tx).await.map_err(EngineError::Snapshot)?;
        let order_items = sqlx::query_as::<_, OrderLineItem>(
            "SELECT id, order_id, product_sku, product_name, quantity, unit_price, subtotal, total, tax_amount FROM order_items ORDER BY id")
            .fetch_all(&mut *tx).await.map_err(EngineError::Snapshot)?;
        let channels = sqlx::query_as::<_, Channel>("SELECT id, name FROM channels")
            .fetch_all(&mut *tx).await.map_err(EngineError::Snapshot)?;
        let customers = sqlx::query_as::<_, Customer>("SELECT id, name, rut FROM customers")
            .fetch_all(&mut *tx).await.map_err(EngineError::Snapshot)?;
        tx.commit().await.map_err(EngineError::Snapshot)?;

        tracing::debug!(products = products.len(), rules = mapping_rules.len(), orders = orders.len(), items = order_items.len(), "loaded input snapshot");
        Ok(Snapshot { products, mapping_rules, orders, order_items, channels, customers, taken_at: Some(Utc::now()) })
    }
}

/// Writes each published fact set into `sales_facts` as one transaction, so
/// SQL readers see either the previous set or the new one.
#[derive(Clone)]
pub struct PgFactSink { pool: PgPool }

impl PgFactSink {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl FactSink for PgFactSink {
    async fn replace_all(&self, version: u64, refreshed_at: DateTime<Utc>, facts: &[SalesFact]) -> crate::Result<()> {
        let mut tx = self.pool.begin().await.map_err(EngineError::Persist)?;
        sqlx::query("DELETE FROM sales_facts").execute(&mut *tx).await.map_err(EngineError::Persist)?;

        for chunk in facts.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO sales_facts (order_item_id, order_id, order_date, source, channel_id, channel_name, customer_id, customer_name, customer_rut, \
                 original_sku, catalog_sku, sku_primario, product_name, category, package_type, brand, language, match_type, mapping_rule_name, is_master_box, \
                 quantity_multiplier, conversion_factor, original_units_sold, units_sold, unit_price, subtotal, total, tax_amount, invoice_status) ");
            qb.push_values(chunk, |mut b, f| {
                b.push_bind(f.order_item_id).push_bind(f.order_id).push_bind(f.order_date).push_bind(f.source.clone())
                    .push_bind(f.channel_id).push_bind(f.channel_name.clone()).push_bind(f.customer_id).push_bind(f.customer_name.clone())
                    .push_bind(f.customer_rut.clone()).push_bind(f.original_sku.clone()).push_bind(f.catalog_sku.clone())
                    .push_bind(f.sku_primario.clone()).push_bind(f.product_name.clone()).push_bind(f.category.clone())
                    .push_bind(f.package_type.clone()).push_bind(f.brand.clone()).push_bind(f.language.clone())
                    .push_bind(f.match_type.as_str()).push_bind(f.mapping_rule_name.clone()).push_bind(f.is_master_box)
                    .push_bind(f.quantity_multiplier).push_bind(f.conversion_factor).push_bind(f.original_units_sold).push_bind(f.units_sold)
                    .push_bind(f.unit_price).push_bind(f.subtotal).push_bind(f.total).push_bind(f.tax_amount).push_bind(f.invoice_status.clone());
            });
            qb.build().execute(&mut *tx).await.map_err(EngineError::Persist)?;
        }

        sqlx::query("INSERT INTO sales_fact_refreshes (version, row_count, refreshed_at) VALUES ($1, $2, $3)")
            .bind(i64::try_from(version).unwrap_or(i64::MAX)).bind(facts.len() as i64).bind(refreshed_at)
            .execute(&mut *tx).await.map_err(EngineError::Persist)?;
        tx.commit().await.map_err(EngineError::Persist)?;
        tracing::debug!(version, rows = facts.len(), "persisted sales facts");
        Ok(())
    }
}
