//! SKU Resolver
//!
//! Resolution paths, first match wins:
//! 1. raw SKU is an active catalog `sku`            -> `direct`
//! 2. raw SKU is an active catalog `sku_master`     -> `caja_master`
//! 3. some rule targets an active `sku`             -> `sku_mapping`
//! 4. some rule targets an active `sku_master`      -> `sku_mapping_caja_master`
//! 5. otherwise                                     -> `unmapped`
//!
//! Rules are scanned lowest id first. Any rule resolving to a plain product
//! beats every rule resolving to a master box. The lowest-id rule is only used
//! for `rule_name`. Category and naming always come from the resolved product.

use crate::domain::aggregates::{CatalogProduct, MappingRule};
use crate::domain::value_objects::{MatchType, Sku};
use crate::engine::catalog::CatalogIndex;
use crate::engine::mapping::MappingIndex;

/// Outcome of resolving one raw SKU.
#[derive(Clone, Copy, Debug)]
pub struct Resolution<'a> {
    pub match_type: MatchType,
    pub product: Option<&'a CatalogProduct>,
    /// Display rule for the mapped paths.
    pub rule: Option<&'a MappingRule>,
}

impl<'a> Resolution<'a> {
    pub fn unmapped() -> Self { Self { match_type: MatchType::Unmapped, product: None, rule: None } }
    pub fn is_master_box(&self) -> bool { self.match_type.is_master_box() }
    pub fn catalog_sku(&self) -> Option<&'a str> { self.product.map(|p| p.sku.as_str()) }
    pub fn category(&self) -> Option<&'a str> { self.product.and_then(|p| p.category.as_deref()) }
    pub fn rule_name(&self) -> Option<&'a str> { self.rule.and_then(|r| r.rule_name.as_deref()) }

    /// Product name for display; unmapped lines keep the name the channel sent.
    pub fn product_name<'b>(&self, fallback: Option<&'b str>) -> Option<&'b str>
    where
        'a: 'b,
    {
        match self.product {
            Some(p) => p.display_name(self.is_master_box()),
            None => fallback,
        }
    }
}

#[derive(Clone, Copy)]
pub struct SkuResolver<'a> {
    catalog: &'a CatalogIndex,
    rules: &'a MappingIndex,
}

impl<'a> SkuResolver<'a> {
    pub fn new(catalog: &'a CatalogIndex, rules: &'a MappingIndex) -> Self { Self { catalog, rules } }

    pub fn resolve(&self, raw_sku: &str, source: Option<&str>) -> Resolution<'a> {
        match Sku::new(raw_sku) {
            Ok(sku) => self.resolve_sku(&sku, source),
            Err(_) => Resolution::unmapped(),
        }
    }

    pub fn resolve_sku(&self, sku: &Sku, source: Option<&str>) -> Resolution<'a> {
        if let Some(product) = self.catalog.by_sku(sku) {
            return Resolution { match_type: MatchType::Direct, product: Some(product), rule: None };
        }
        if let Some(product) = self.catalog.by_master_sku(sku) {
            return Resolution { match_type: MatchType::CajaMaster, product: Some(product), rule: None };
        }
        let rules = self.rules.rules_for(sku);
        let Some(display_rule) = rules.iter().find(|r| r.applies_to_source(source)) else {
            return Resolution::unmapped();
        };
        let targets = move || rules.iter().filter(move |r| r.applies_to_source(source)).filter_map(|r| Sku::new(&r.target_sku).ok());
        if let Some(product) = targets().find_map(|t| self.catalog.by_sku(&t)) {
            return Resolution { match_type: MatchType::SkuMapping, product: Some(product), rule: Some(display_rule) };
        }
        if let Some(product) = targets().find_map(|t| self.catalog.by_master_sku(&t)) {
            return Resolution { match_type: MatchType::SkuMappingCajaMaster, product: Some(product), rule: Some(display_rule) };
        }
        tracing::trace!(sku = %sku, rule_id = display_rule.id, "no mapping rule target in catalog");
        Resolution::unmapped()
    }
}
