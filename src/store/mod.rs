//! Input snapshots and fact persistence
//!
//! The engine reads its six input datasets in bulk at the start of a refresh
//! and never writes them. Facts may optionally be persisted after each pass.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::aggregates::{CatalogProduct, Channel, Customer, MappingRule, Order, OrderLineItem, SalesFact};

pub mod memory;
pub mod postgres;

pub use memory::InMemorySnapshotSource;
pub use postgres::{PgFactSink, PgSnapshotSource};

/// Point-in-time copy of every input dataset.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub products: Vec<CatalogProduct>,
    pub mapping_rules: Vec<MappingRule>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderLineItem>,
    pub channels: Vec<Channel>,
    pub customers: Vec<Customer>,
    pub taken_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn load(&self) -> crate::Result<Snapshot>;
}

/// Durable target for published fact sets. Replaces the previous set entirely.
#[async_trait]
pub trait FactSink: Send + Sync {
    async fn replace_all(&self, version: u64, refreshed_at: DateTime<Utc>, facts: &[SalesFact]) -> crate::Result<()>;
}
