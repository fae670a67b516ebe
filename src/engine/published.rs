//! Published fact view: a versioned, immutable fact set behind a swappable reference

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::SalesFact;
use crate::domain::value_objects::MatchType;

/// One complete, never-mutated generation of sales facts.
#[derive(Debug)]
pub struct FactSet {
    version: u64,
    refreshed_at: Option<DateTime<Utc>>,
    facts: Vec<SalesFact>,
    by_item: HashMap<i64, usize>,
}

impl FactSet {
    pub fn empty() -> Self { Self { version: 0, refreshed_at: None, facts: vec![], by_item: HashMap::new() } }

    fn new(version: u64, refreshed_at: DateTime<Utc>, facts: Vec<SalesFact>) -> Self {
        let by_item = facts.iter().enumerate().map(|(i, f)| (f.order_item_id, i)).collect();
        Self { version, refreshed_at: Some(refreshed_at), facts, by_item }
    }

    pub fn version(&self) -> u64 { self.version }
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> { self.refreshed_at }
    pub fn facts(&self) -> &[SalesFact] { &self.facts }
    pub fn len(&self) -> usize { self.facts.len() }
    pub fn is_empty(&self) -> bool { self.facts.is_empty() }
    pub fn get(&self, order_item_id: i64) -> Option<&SalesFact> { self.by_item.get(&order_item_id).map(|&i| &self.facts[i]) }

    pub fn query<'a>(&'a self, query: &'a FactQuery) -> impl Iterator<Item = &'a SalesFact> + 'a {
        self.facts.iter().filter(move |f| query.matches(f))
    }
}

/// Row filter over the dimensions downstream aggregation slices by.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FactQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub channel_id: Option<i64>,
    pub sku_primario: Option<String>,
    pub source: Option<String>,
    pub match_type: Option<MatchType>,
}

impl FactQuery {
    pub fn matches(&self, fact: &SalesFact) -> bool {
        fn eq_opt(want: &Option<String>, have: &Option<String>) -> bool {
            want.as_deref().map_or(true, |w| have.as_deref().is_some_and(|h| h.eq_ignore_ascii_case(w)))
        }
        self.from.map_or(true, |from| fact.order_date >= from)
            && self.to.map_or(true, |to| fact.order_date <= to)
            && self.channel_id.map_or(true, |id| fact.channel_id == Some(id))
            && self.match_type.map_or(true, |m| fact.match_type == m)
            && eq_opt(&self.category, &fact.category)
            && eq_opt(&self.sku_primario, &fact.sku_primario)
            && eq_opt(&self.source, &fact.source)
    }
}

/// Holder of the live fact set.
///
/// Readers clone the current `Arc` and keep a consistent generation for as
/// long as they hold it. The write lock is taken only for the pointer swap.
#[derive(Debug)]
pub struct FactStore {
    current: RwLock<Arc<FactSet>>,
}

impl Default for FactStore { fn default() -> Self { Self::new() } }

impl FactStore {
    pub fn new() -> Self { Self { current: RwLock::new(Arc::new(FactSet::empty())) } }

    pub fn current(&self) -> Arc<FactSet> { Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner)) }

    pub fn next_version(&self) -> u64 { self.current().version() + 1 }

    /// Atomically replace the live set; returns the newly published generation.
    pub fn publish(&self, version: u64, refreshed_at: DateTime<Utc>, facts: Vec<SalesFact>) -> Arc<FactSet> {
        let next = Arc::new(FactSet::new(version, refreshed_at, facts));
        let previous = std::mem::replace(&mut *self.current.write().unwrap_or_else(PoisonError::into_inner), Arc::clone(&next));
        tracing::debug!(version, previous = previous.version(), rows = next.len(), "published fact set");
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn fact(id: i64, category: Option<&str>, source: &str, match_type: MatchType) -> SalesFact {
        SalesFact {
            order_item_id: id, order_id: Uuid::nil(), order_date: Utc.with_ymd_and_hms(2025, 11, id as u32, 0, 0, 0).unwrap(),
            source: Some(source.into()), channel_id: Some(1), channel_name: None, customer_id: None, customer_name: None, customer_rut: None,
            original_sku: None, catalog_sku: None, sku_primario: None, product_name: None, category: category.map(Into::into),
            package_type: None, brand: None, language: None, match_type, mapping_rule_name: None, is_master_box: false,
            quantity_multiplier: 1, conversion_factor: 1, original_units_sold: 1, units_sold: 1,
            unit_price: None, subtotal: None, total: None, tax_amount: None, invoice_status: None,
        }
    }

    #[test]
    fn test_readers_keep_their_generation() {
        let store = FactStore::new();
        let before = store.current();
        assert_eq!(before.version(), 0);
        let published = store.publish(store.next_version(), Utc::now(), vec![fact(1, Some("BARRAS"), "relbase", MatchType::Direct)]);
        assert_eq!(published.version(), 1);
        assert!(before.is_empty());
        assert_eq!(store.current().len(), 1);
        assert!(store.current().get(1).is_some());
        assert!(store.current().get(2).is_none());
    }

    #[test]
    fn test_query_filters() {
        let store = FactStore::new();
        store.publish(1, Utc::now(), vec![
            fact(1, Some("BARRAS"), "relbase", MatchType::Direct),
            fact(2, Some("GRANOLAS"), "shopify", MatchType::SkuMapping),
            fact(3, None, "shopify", MatchType::Unmapped),
        ]);
        let set = store.current();
        let q = FactQuery { category: Some("barras".into()), ..Default::default() };
        assert_eq!(set.query(&q).count(), 1);
        let q = FactQuery { source: Some("shopify".into()), match_type: Some(MatchType::Unmapped), ..Default::default() };
        assert_eq!(set.query(&q).map(|f| f.order_item_id).collect::<Vec<_>>(), vec![3]);
        let q = FactQuery { from: Some(Utc.with_ymd_and_hms(2025, 11, 2, 0, 0, 0).unwrap()), ..Default::default() };
        assert_eq!(set.query(&q).count(), 2);
        assert_eq!(set.query(&FactQuery::default()).count(), 3);
    }
}
