//! Unit Conversion Calculator

use crate::domain::aggregates::CatalogProduct;

/// Units represented by one ordered unit of the resolved product.
///
/// Master-box lines use `items_per_master_box`, every other line uses
/// `units_per_display`. Missing or non-positive factors count as 1.
pub fn conversion_factor(is_master_box: bool, product: Option<&CatalogProduct>) -> i64 {
    let factor = product.and_then(|p| if is_master_box { p.items_per_master_box } else { p.units_per_display });
    match factor {
        Some(f) if f >= 1 => i64::from(f),
        _ => 1,
    }
}

/// `order_quantity × multiplier × conversion_factor`.
pub fn convert_units(order_quantity: i64, multiplier: i64, is_master_box: bool, product: Option<&CatalogProduct>) -> i64 {
    order_quantity.saturating_mul(multiplier).saturating_mul(conversion_factor(is_master_box, product))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> CatalogProduct {
        CatalogProduct::new("BAKC_U04010", "Barra Keto Cacao").with_units_per_display(5).with_master_box("BAKC_C02810", 140, "Caja Master")
    }

    #[test]
    fn test_master_box_uses_items_per_master_box() {
        assert_eq!(conversion_factor(true, Some(&bar())), 140);
        assert_eq!(convert_units(2, 1, true, Some(&bar())), 280);
    }

    #[test]
    fn test_regular_line_uses_units_per_display() {
        assert_eq!(conversion_factor(false, Some(&bar())), 5);
        assert_eq!(convert_units(3, 2, false, Some(&bar())), 30);
    }

    #[test]
    fn test_missing_factors_fall_back_to_one() {
        let plain = CatalogProduct::new("X", "x");
        assert_eq!(conversion_factor(true, Some(&plain)), 1);
        assert_eq!(conversion_factor(false, Some(&plain)), 1);
        assert_eq!(convert_units(7, 1, false, None), 7);
        let zero = plain.with_units_per_display(0);
        assert_eq!(conversion_factor(false, Some(&zero)), 1);
    }

    #[test]
    fn test_saturates_instead_of_overflowing() {
        assert_eq!(convert_units(i64::MAX, 2, true, Some(&bar())), i64::MAX);
    }
}
