//! Aggregates module
pub mod product;
pub mod mapping_rule;
pub mod order;
pub mod sales_fact;

pub use product::CatalogProduct;
pub use mapping_rule::{MappingRule, PatternType};
pub use order::{Channel, Customer, Order, OrderLineItem};
pub use sales_fact::SalesFact;
