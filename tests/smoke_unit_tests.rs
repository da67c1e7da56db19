//! Smoke Screen Unit tests for inventory ledger components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path plus the validator's refusal cases.

use std::collections::HashMap;

use stock_ledger::{
    cart::{Cart, CartLine},
    catalog::ProductSnapshot,
    error::LedgerError,
    ledger::TransactionKind,
    types::Money,
    utils::new_uuid_to_bech32,
    validate::{PricePolicy, validate_cart},
};

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("prod_");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("prod_1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Test that the function handles empty strings appropriately
    #[test]
    fn handles_empty_hrp() {
        // Empty string should fail
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Test that multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("txn_").unwrap();
        let id2 = new_uuid_to_bech32("txn_").unwrap();
        let id3 = new_uuid_to_bech32("txn_").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    /// Test that different HRPs produce different encoded strings
    #[test]
    fn different_hrps_produce_different_encodings() {
        let product_id = new_uuid_to_bech32("prod_").unwrap();
        let customer_id = new_uuid_to_bech32("cust_").unwrap();

        assert!(product_id.starts_with("prod_"));
        assert!(customer_id.starts_with("cust_"));
        assert_ne!(product_id, customer_id);
    }
}

// MONEY TESTS
#[cfg(test)]
mod money_tests {
    use super::*;

    /// Test that minor units render as a major.minor decimal string
    #[test]
    fn renders_fixed_point() {
        assert_eq!(Money::from_minor(10_000).to_string(), "100.00");
        assert_eq!(Money::from_minor(1).to_string(), "0.01");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    /// Test that a line total is exact integer arithmetic
    #[test]
    fn line_totals_have_no_drift() {
        let unit = Money::from_minor(1999); // 19.99
        let mut total = Money::ZERO;
        for _ in 0..1000 {
            total = total.checked_add(unit).unwrap();
        }

        assert_eq!(total, Money::from_minor(1_999_000));
        assert_eq!(unit.checked_mul_quantity(1000), Some(total));
    }

    /// Test that overflow is reported, not wrapped
    #[test]
    fn overflow_returns_none() {
        assert_eq!(Money::from_minor(i64::MAX).checked_mul_quantity(3), None);
    }
}

// CART MODULE TESTS
#[cfg(test)]
mod cart_tests {
    use super::*;

    /// Test that a cart built from raw lines collapses duplicate products
    #[test]
    fn from_lines_collapses_duplicates() {
        let cart = Cart::from_lines(vec![
            CartLine::new("prod_a", 1, Money::from_minor(1000)),
            CartLine::new("prod_b", 2, Money::from_minor(500)),
            CartLine::new("prod_a", 4, Money::from_minor(950)),
        ]);

        assert_eq!(cart.len(), 2);
        let line_a = cart
            .lines()
            .iter()
            .find(|line| line.product_id == "prod_a")
            .unwrap();
        assert_eq!(line_a.quantity, 4);
        assert_eq!(line_a.unit_amount, Money::from_minor(950));
    }

    /// Test that an empty cart reports as empty
    #[test]
    fn new_cart_is_empty() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.len(), 0);
    }
}

// VALIDATOR TESTS
#[cfg(test)]
mod validate_tests {
    use super::*;

    /// Snapshot lookup over a plain map, standing in for the catalog
    fn snapshot_fn(
        snapshots: &HashMap<String, ProductSnapshot>,
    ) -> impl Fn(&str) -> Result<Option<ProductSnapshot>, LedgerError> + '_ {
        move |product_id| Ok(snapshots.get(product_id).cloned())
    }

    fn beans_snapshot(stock: u32) -> (String, ProductSnapshot) {
        (
            "prod_beans".to_string(),
            ProductSnapshot {
                product_id: "prod_beans".to_string(),
                quantity_in_stock: stock,
                cost_price: Money::from_minor(1500),
                sale_price: Money::from_minor(2500),
            },
        )
    }

    /// Test that an empty cart is rejected before anything else
    #[test]
    fn empty_cart_is_rejected() {
        let snapshots = HashMap::new();
        let result = validate_cart(
            &Cart::new(),
            TransactionKind::Sale,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        );

        assert!(matches!(result, Err(LedgerError::EmptyCart)));
    }

    /// Test that a line for a product missing from the catalog is rejected
    #[test]
    fn unknown_product_is_rejected() {
        let snapshots = HashMap::new();
        let cart = Cart::new().with_line(CartLine::new("prod_ghost", 1, Money::from_minor(100)));

        let result = validate_cart(
            &cart,
            TransactionKind::Sale,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        );

        assert!(matches!(
            result,
            Err(LedgerError::UnknownProduct { product_id }) if product_id == "prod_ghost"
        ));
    }

    /// Test that a zero quantity is rejected
    #[test]
    fn zero_quantity_is_rejected() {
        let snapshots = HashMap::from([beans_snapshot(10)]);
        let cart = Cart::new().with_line(CartLine::new("prod_beans", 0, Money::from_minor(2500)));

        let result = validate_cart(
            &cart,
            TransactionKind::Sale,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        );

        assert!(matches!(result, Err(LedgerError::InvalidQuantity { .. })));
    }

    /// Test that a negative unit amount is rejected
    #[test]
    fn negative_amount_is_rejected() {
        let snapshots = HashMap::from([beans_snapshot(10)]);
        let cart = Cart::new().with_line(CartLine::new("prod_beans", 1, Money::from_minor(-1)));

        let result = validate_cart(
            &cart,
            TransactionKind::Purchase,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        );

        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }

    /// Test that overselling is rejected with the exact shortfall
    #[test]
    fn oversell_reports_requested_and_available() {
        let snapshots = HashMap::from([beans_snapshot(2)]);
        let cart = Cart::new().with_line(CartLine::new("prod_beans", 5, Money::from_minor(2500)));

        let result = validate_cart(
            &cart,
            TransactionKind::Sale,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        );

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientStock {
                requested: 5,
                available: 2,
                ..
            })
        ));
    }

    /// Test that purchases have no stock ceiling
    #[test]
    fn purchases_ignore_stock_levels() {
        let snapshots = HashMap::from([beans_snapshot(0)]);
        let cart =
            Cart::new().with_line(CartLine::new("prod_beans", 10_000, Money::from_minor(1400)));

        let validated = validate_cart(
            &cart,
            TransactionKind::Purchase,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        )
        .unwrap();

        assert_eq!(validated.lines[0].quantity, 10_000);
    }

    /// Test that a sale line resolves the catalog cost price, while a
    /// purchase line's cost is the keyed-in amount itself
    #[test]
    fn resolved_cost_depends_on_kind() {
        let snapshots = HashMap::from([beans_snapshot(10)]);
        let cart = Cart::new().with_line(CartLine::new("prod_beans", 2, Money::from_minor(2600)));

        let sale = validate_cart(
            &cart,
            TransactionKind::Sale,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        )
        .unwrap();
        assert_eq!(sale.lines[0].unit_cost_at_time, Money::from_minor(1500));

        let purchase = validate_cart(
            &cart,
            TransactionKind::Purchase,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        )
        .unwrap();
        assert_eq!(purchase.lines[0].unit_cost_at_time, Money::from_minor(2600));
    }

    /// Test the FloorAtCost policy boundary: below cost fails, at cost passes
    #[test]
    fn floor_at_cost_boundary() {
        let snapshots = HashMap::from([beans_snapshot(10)]);

        let below = Cart::new().with_line(CartLine::new("prod_beans", 1, Money::from_minor(1499)));
        let result = validate_cart(
            &below,
            TransactionKind::Sale,
            PricePolicy::FloorAtCost,
            snapshot_fn(&snapshots),
        );
        assert!(matches!(
            result,
            Err(LedgerError::PriceBelowCost {
                offered,
                cost,
                ..
            }) if offered == Money::from_minor(1499) && cost == Money::from_minor(1500)
        ));

        let at_cost =
            Cart::new().with_line(CartLine::new("prod_beans", 1, Money::from_minor(1500)));
        assert!(
            validate_cart(
                &at_cost,
                TransactionKind::Sale,
                PricePolicy::FloorAtCost,
                snapshot_fn(&snapshots),
            )
            .is_ok()
        );
    }

    /// Test that the validated total is the exact line sum
    #[test]
    fn validated_total_is_exact() {
        let mut snapshots = HashMap::from([beans_snapshot(100)]);
        snapshots.insert(
            "prod_filters".to_string(),
            ProductSnapshot {
                product_id: "prod_filters".to_string(),
                quantity_in_stock: 100,
                cost_price: Money::from_minor(200),
                sale_price: Money::from_minor(450),
            },
        );

        let cart = Cart::new()
            .with_line(CartLine::new("prod_beans", 4, Money::from_minor(2500)))
            .with_line(CartLine::new("prod_filters", 3, Money::from_minor(450)));

        let validated = validate_cart(
            &cart,
            TransactionKind::Sale,
            PricePolicy::Unrestricted,
            snapshot_fn(&snapshots),
        )
        .unwrap();

        // 4 x 25.00 + 3 x 4.50 = 113.50
        assert_eq!(validated.total_amount().unwrap(), Money::from_minor(11_350));
    }
}
