//! Sales fact resolution engine
pub mod catalog;
pub mod conversion;
pub mod mapping;
pub mod materializer;
pub mod multiplier;
pub mod published;
pub mod refresh;
pub mod resolver;

pub use catalog::CatalogIndex;
pub use conversion::{conversion_factor, convert_units};
pub use mapping::{MappingIndex, SkippedRules};
pub use materializer::{materialize, MaterializeStats, Materialized};
pub use multiplier::{aggregate_multiplier, aggregate_multiplier_raw};
pub use published::{FactQuery, FactSet, FactStore};
pub use refresh::{RefreshReport, RefreshRequest, RefreshService};
pub use resolver::{Resolution, SkuResolver};
