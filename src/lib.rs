//! Sales Fact Resolution Engine
//!
//! Resolves raw, multi-channel point-of-sale line items to canonical catalog
//! products and publishes one sales fact per order line item.
//!
//! ## Features
//! - Four-path SKU resolution (direct, master box, mapped, mapped master box)
//! - Pack multiplier aggregation across mapping rules
//! - Master-box / display unit conversion
//! - Full-refresh materialization with atomic publication
//! - PostgreSQL snapshot source and fact sink

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod notify;
pub mod scheduler;
pub mod store;

pub use config::{Config, ConfigError};
pub use domain::aggregates::{CatalogProduct, MappingRule, Order, OrderLineItem, SalesFact};
pub use domain::value_objects::{MatchType, Sku};
pub use engine::{FactQuery, FactSet, FactStore, RefreshReport, RefreshRequest, RefreshService};
pub use store::{FactSink, Snapshot, SnapshotSource};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to load input snapshot: {0}")]
    Snapshot(#[source] sqlx::Error),

    #[error("failed to persist sales facts: {0}")]
    Persist(#[source] sqlx::Error),

    #[error("refresh cancelled before publication")]
    Cancelled,

    #[error("resolution worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
