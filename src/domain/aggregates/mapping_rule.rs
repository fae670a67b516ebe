//! SKU Mapping Rule

use serde::{Deserialize, Serialize};

/// Curated rule translating a raw/legacy channel SKU into a catalog SKU.
///
/// Several active rules may share one `source_pattern`: a pack SKU expands
/// into every target, each contributing its own multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MappingRule {
    pub id: i64,
    pub source_pattern: String,
    pub pattern_type: String,
    pub source_filter: Option<String>,
    pub target_sku: String,
    pub quantity_multiplier: i32,
    pub rule_name: Option<String>,
    pub is_active: bool,
    pub priority: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternType {
    Exact,
    /// Reserved pattern kinds (prefix, contains, regex...). Never matched.
    Unsupported(String),
}

impl MappingRule {
    pub fn exact(id: i64, pattern: impl Into<String>, target_sku: impl Into<String>, multiplier: i32) -> Self {
        Self {
            id, source_pattern: pattern.into(), pattern_type: "exact".into(), source_filter: None,
            target_sku: target_sku.into(), quantity_multiplier: multiplier, rule_name: None, is_active: true, priority: 0,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self { self.rule_name = Some(name.into()); self }
    pub fn for_source(mut self, source: impl Into<String>) -> Self { self.source_filter = Some(source.into()); self }
    pub fn inactive(mut self) -> Self { self.is_active = false; self }

    pub fn pattern_type(&self) -> PatternType {
        match self.pattern_type.trim().to_ascii_lowercase().as_str() {
            "exact" => PatternType::Exact,
            other => PatternType::Unsupported(other.to_string()),
        }
    }

    /// Rules without a source filter apply to every channel.
    pub fn applies_to_source(&self, source: Option<&str>) -> bool {
        match (self.source_filter.as_deref().map(str::trim), source) {
            (None, _) | (Some(""), _) => true,
            (Some(filter), Some(source)) => filter.eq_ignore_ascii_case(source.trim()),
            (Some(_), None) => false,
        }
    }
}
