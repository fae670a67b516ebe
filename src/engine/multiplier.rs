//! Multiplier Aggregator
//!
//! A pack SKU is encoded as several rules sharing one pattern. Its effective
//! multiplier is the sum over every applicable rule, independent of which
//! single rule is shown for display.

use crate::domain::value_objects::Sku;
use crate::engine::mapping::MappingIndex;

/// Effective quantity multiplier for a raw SKU; 1 when no rule applies.
pub fn aggregate_multiplier(rules: &MappingIndex, sku: &Sku, source: Option<&str>) -> i64 {
    let mut matched = false;
    let total = rules.matching(sku, source).fold(0i64, |acc, rule| {
        matched = true;
        acc.saturating_add(i64::from(rule.quantity_multiplier))
    });
    if matched { total } else { 1 }
}

/// Same as [`aggregate_multiplier`] for an un-normalized SKU string.
pub fn aggregate_multiplier_raw(rules: &MappingIndex, raw_sku: &str, source: Option<&str>) -> i64 {
    Sku::new(raw_sku).map(|sku| aggregate_multiplier(rules, &sku, source)).unwrap_or(1)
}
