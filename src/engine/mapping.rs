//! Mapping Rule Store: active exact-pattern rules grouped by source pattern

use std::collections::HashMap;
use serde::Serialize;
use crate::domain::aggregates::{MappingRule, PatternType};
use crate::domain::value_objects::Sku;

/// Rules left out of the index and why.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SkippedRules {
    pub inactive: usize,
    pub unsupported_pattern: usize,
    pub invalid: usize,
}

/// Active exact rules per normalized pattern, each group ordered by rule id.
#[derive(Debug, Default)]
pub struct MappingIndex {
    by_pattern: HashMap<Sku, Vec<MappingRule>>,
    skipped: SkippedRules,
}

impl MappingIndex {
    pub fn build(rules: impl IntoIterator<Item = MappingRule>) -> Self {
        let mut index = Self::default();
        for rule in rules {
            if !rule.is_active { index.skipped.inactive += 1; continue; }
            if let PatternType::Unsupported(kind) = rule.pattern_type() {
                tracing::debug!(rule_id = rule.id, pattern_type = %kind, "mapping rule pattern type not supported");
                index.skipped.unsupported_pattern += 1;
                continue;
            }
            let pattern = match Sku::new(&rule.source_pattern) {
                Ok(pattern) if rule.quantity_multiplier >= 1 && Sku::new(&rule.target_sku).is_ok() => pattern,
                _ => {
                    tracing::warn!(rule_id = rule.id, multiplier = rule.quantity_multiplier, "skipping invalid mapping rule");
                    index.skipped.invalid += 1;
                    continue;
                }
            };
            index.by_pattern.entry(pattern).or_default().push(rule);
        }
        for group in index.by_pattern.values_mut() {
            group.sort_by_key(|r| r.id);
        }
        index
    }

    /// All indexed rules sharing `sku` as pattern, lowest id first.
    pub fn rules_for(&self, sku: &Sku) -> &[MappingRule] { self.by_pattern.get(sku).map(Vec::as_slice).unwrap_or(&[]) }

    /// Every active rule for `sku` that applies to the order's source, lowest id first.
    pub fn matching<'a>(&'a self, sku: &Sku, source: Option<&'a str>) -> impl Iterator<Item = &'a MappingRule> + 'a {
        self.rules_for(sku).iter().filter(move |r| r.applies_to_source(source))
    }

    /// Rule used for display attribution: the lowest id.
    pub fn display_rule(&self, sku: &Sku, source: Option<&str>) -> Option<&MappingRule> {
        self.rules_for(sku).iter().find(|r| r.applies_to_source(source))
    }

    pub fn skipped(&self) -> SkippedRules { self.skipped }
    pub fn pattern_count(&self) -> usize { self.by_pattern.len() }
}
