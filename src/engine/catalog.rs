//! Catalog Store: read-only index of active products by SKU and master-box SKU

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use crate::domain::aggregates::CatalogProduct;
use crate::domain::value_objects::Sku;

/// Arena of active products with two lookup spaces.
///
/// The SKU and master-box spaces are kept separate; callers decide the order
/// in which they are consulted.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    products: Vec<CatalogProduct>,
    by_sku: HashMap<Sku, usize>,
    by_master: HashMap<Sku, usize>,
}

impl CatalogIndex {
    pub fn build(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        let mut index = Self::default();
        let mut duplicates = 0usize;
        let mut master_collisions = 0usize;
        for product in products.into_iter().filter(|p| p.is_active) {
            let Ok(sku) = Sku::new(&product.sku) else {
                tracing::debug!(sku = %product.sku, "skipping catalog product with unusable sku");
                continue;
            };
            if index.by_sku.contains_key(&sku) { duplicates += 1; continue; }
            let slot = index.products.len();
            index.by_sku.insert(sku, slot);
            if let Some(master) = Sku::parse(product.sku_master.as_deref()) {
                // first product claiming a master box owns it
                match index.by_master.entry(master) {
                    Entry::Occupied(owner) => {
                        tracing::debug!(sku_master = %owner.key(), sku = %product.sku, "master box already claimed");
                        master_collisions += 1;
                    }
                    Entry::Vacant(slot_entry) => { slot_entry.insert(slot); }
                }
            }
            index.products.push(product);
        }
        if duplicates > 0 {
            tracing::warn!(duplicates, "catalog contains duplicate active skus; first occurrence kept");
        }
        if master_collisions > 0 {
            tracing::warn!(master_collisions, "several active products claim the same master box sku; first claim kept");
        }
        index
    }

    pub fn by_sku(&self, sku: &Sku) -> Option<&CatalogProduct> { self.by_sku.get(sku).map(|&i| &self.products[i]) }
    pub fn by_master_sku(&self, sku: &Sku) -> Option<&CatalogProduct> { self.by_master.get(sku).map(|&i| &self.products[i]) }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(s: &str) -> Sku { Sku::new(s).unwrap() }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let index = CatalogIndex::build(vec![CatalogProduct::new("bakc_u04010", "Barra").with_master_box("BAKC_C02810", 140, "Caja")]);
        assert_eq!(index.by_sku(&sku("BAKC_U04010")).unwrap().sku, "bakc_u04010");
        assert!(index.by_master_sku(&sku("bakc_c02810")).is_some());
    }

    #[test]
    fn test_index_spaces_are_disjoint() {
        let index = CatalogIndex::build(vec![CatalogProduct::new("A1", "A").with_master_box("M1", 12, "Box")]);
        assert!(index.by_sku(&sku("M1")).is_none());
        assert!(index.by_master_sku(&sku("A1")).is_none());
    }

    #[test]
    fn test_inactive_products_not_indexed() {
        let index = CatalogIndex::build(vec![
            CatalogProduct::new("A1", "A").inactive().with_master_box("M1", 12, "Box"),
            CatalogProduct::new("B1", "B"),
        ]);
        assert_eq!(index.len(), 1);
        assert!(index.by_sku(&sku("A1")).is_none());
        assert!(index.by_master_sku(&sku("M1")).is_none());
    }

    #[test]
    fn test_duplicate_sku_keeps_first() {
        let index = CatalogIndex::build(vec![
            CatalogProduct::new("A1", "first").with_category("BARRAS"),
            CatalogProduct::new("a1", "second").with_category("GRANOLAS"),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.by_sku(&sku("A1")).unwrap().category.as_deref(), Some("BARRAS"));
    }

    #[test]
    fn test_master_box_collision_keeps_first_claim() {
        let index = CatalogIndex::build(vec![
            CatalogProduct::new("A1", "A").with_master_box("M1", 12, "Box A"),
            CatalogProduct::new("B1", "B").with_master_box("m1", 24, "Box B"),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.by_master_sku(&sku("M1")).unwrap().sku, "A1");
        assert!(index.by_sku(&sku("B1")).is_some());
    }
}
