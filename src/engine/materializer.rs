//! Fact Materializer: turns one input snapshot into the complete fact set
//!
//! Pure and deterministic. Every line item resolves independently, so the
//! pass is a parallel map followed by a sort on the identity key.

use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{Channel, Customer, Order, OrderLineItem, SalesFact};
use crate::domain::value_objects::{MatchType, Sku};
use crate::engine::catalog::CatalogIndex;
use crate::engine::conversion::{conversion_factor, convert_units};
use crate::engine::mapping::{MappingIndex, SkippedRules};
use crate::engine::multiplier::aggregate_multiplier;
use crate::engine::resolver::{Resolution, SkuResolver};
use crate::store::Snapshot;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeStats {
    pub catalog_products: usize,
    pub billable_orders: usize,
    pub line_items: usize,
    /// Line items whose order is missing, not billable or after `as_of`.
    pub excluded_items: usize,
    pub match_counts: BTreeMap<MatchType, usize>,
    pub skipped_rules: SkippedRules,
}

#[derive(Debug)]
pub struct Materialized {
    pub facts: Vec<SalesFact>,
    pub stats: MaterializeStats,
}

/// Everything one line item needs besides itself; shared read-only by workers.
struct Context<'a> {
    resolver: SkuResolver<'a>,
    rules: &'a MappingIndex,
    orders: HashMap<Uuid, &'a Order>,
    channels: HashMap<i64, &'a Channel>,
    customers: HashMap<Uuid, &'a Customer>,
}

pub fn materialize(snapshot: Snapshot, as_of: Option<DateTime<Utc>>) -> Materialized {
    let Snapshot { products, mapping_rules, orders, order_items, channels, customers, .. } = snapshot;
    let catalog = CatalogIndex::build(products);
    let rules = MappingIndex::build(mapping_rules);

    let billable: HashMap<Uuid, &Order> = orders.iter()
        .filter(|o| o.is_billable() && as_of.map_or(true, |cutoff| o.order_date <= cutoff))
        .map(|o| (o.id, o))
        .collect();
    let ctx = Context {
        resolver: SkuResolver::new(&catalog, &rules),
        rules: &rules,
        orders: billable,
        channels: channels.iter().map(|c| (c.id, c)).collect(),
        customers: customers.iter().map(|c| (c.id, c)).collect(),
    };

    let mut facts: Vec<SalesFact> = order_items.par_iter().filter_map(|item| ctx.fact_for(item)).collect();
    facts.sort_by_key(|f| f.order_item_id);

    let mut match_counts: BTreeMap<MatchType, usize> = MatchType::ALL.into_iter().map(|m| (m, 0)).collect();
    for fact in &facts {
        *match_counts.entry(fact.match_type).or_default() += 1;
    }
    let stats = MaterializeStats {
        catalog_products: catalog.len(),
        billable_orders: ctx.orders.len(),
        line_items: order_items.len(),
        excluded_items: order_items.len() - facts.len(),
        match_counts,
        skipped_rules: rules.skipped(),
    };
    Materialized { facts, stats }
}

impl<'a> Context<'a> {
    fn fact_for(&self, item: &OrderLineItem) -> Option<SalesFact> {
        let order = self.orders.get(&item.order_id)?;
        let source = order.source.as_deref();
        let sku = Sku::parse(item.product_sku.as_deref());

        let (resolution, multiplier) = match &sku {
            Some(sku) => (self.resolver.resolve_sku(sku, source), aggregate_multiplier(self.rules, sku, source)),
            None => (Resolution::unmapped(), 1),
        };
        let is_master_box = resolution.is_master_box();
        let quantity = i64::from(item.quantity);
        let product = resolution.product;
        let channel = order.channel_id.and_then(|id| self.channels.get(&id));
        let customer = order.customer_id.and_then(|id| self.customers.get(&id));

        Some(SalesFact {
            order_item_id: item.id,
            order_id: order.id,
            order_date: order.order_date,
            source: order.source.clone(),
            channel_id: order.channel_id,
            channel_name: channel.map(|c| c.name.clone()),
            customer_id: order.customer_id,
            customer_name: customer.and_then(|c| c.name.clone()),
            customer_rut: customer.and_then(|c| c.rut.clone()),
            original_sku: item.product_sku.clone(),
            catalog_sku: resolution.catalog_sku().map(str::to_string),
            sku_primario: product.and_then(|p| p.sku_primario.clone()),
            product_name: resolution.product_name(item.product_name.as_deref()).map(str::to_string),
            category: resolution.category().map(str::to_string),
            package_type: product.and_then(|p| p.package_type.clone()),
            brand: product.and_then(|p| p.brand.clone()),
            language: product.and_then(|p| p.language.clone()),
            match_type: resolution.match_type,
            mapping_rule_name: resolution.rule_name().map(str::to_string),
            is_master_box,
            quantity_multiplier: multiplier,
            conversion_factor: conversion_factor(is_master_box, product),
            original_units_sold: quantity,
            units_sold: convert_units(quantity, multiplier, is_master_box, product),
            unit_price: item.unit_price,
            subtotal: item.subtotal,
            total: item.total,
            tax_amount: item.tax_amount,
            invoice_status: order.invoice_status.clone(),
        })
    }
}
