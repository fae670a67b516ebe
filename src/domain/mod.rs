//! Domain model: catalog, mapping rules, orders and the derived sales facts
pub mod aggregates;
pub mod events;
pub mod value_objects;
