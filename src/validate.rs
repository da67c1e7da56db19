//! Line item validation against a catalog snapshot.
//!
//! Pure checks, no side effects. The snapshot is read fresh at validation
//! time, which narrows but does not close the window before commit; the
//! authoritative stock check runs again inside the executor's atomic scope,
//! so this pass is advisory and exists to fail early with a useful error.

use crate::cart::Cart;
use crate::catalog::ProductSnapshot;
use crate::error::LedgerError;
use crate::ledger::TransactionKind;
use crate::types::Money;

/// What the operator may do to a sale line's unit price relative to the
/// catalog. The source system allowed free overrides with a non-negativity
/// check only; `FloorAtCost` is the stricter stance for installations that
/// never sell below cost.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PricePolicy {
    #[default]
    Unrestricted,
    FloorAtCost,
}

/// A cart line resolved against the catalog: carries the product's cost
/// price as of validation alongside the operator-supplied amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_amount: Money,
    pub unit_cost_at_time: Money,
}

/// Output of validation; the executor's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
    pub kind: TransactionKind,
    pub lines: Vec<ValidatedLine>,
}

impl ValidatedCart {
    /// Σ(quantity × unit_amount) in checked fixed-point arithmetic.
    pub fn total_amount(&self) -> Result<Money, LedgerError> {
        let mut total = Money::ZERO;
        for line in &self.lines {
            let line_total = line
                .unit_amount
                .checked_mul_quantity(line.quantity)
                .ok_or(LedgerError::Overflow)?;
            total = total.checked_add(line_total).ok_or(LedgerError::Overflow)?;
        }
        Ok(total)
    }
}

pub fn validate_cart<F>(
    cart: &Cart,
    kind: TransactionKind,
    policy: PricePolicy,
    snapshot: F,
) -> Result<ValidatedCart, LedgerError>
where
    F: Fn(&str) -> Result<Option<ProductSnapshot>, LedgerError>,
{
    if cart.is_empty() {
        return Err(LedgerError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart.len());
    for line in cart.lines() {
        let Some(snap) = snapshot(&line.product_id)? else {
            return Err(LedgerError::UnknownProduct {
                product_id: line.product_id.clone(),
            });
        };
        if line.quantity == 0 {
            return Err(LedgerError::InvalidQuantity {
                product_id: line.product_id.clone(),
            });
        }
        if line.unit_amount.is_negative() {
            return Err(LedgerError::InvalidAmount {
                product_id: line.product_id.clone(),
            });
        }

        // Sale-only rules: the price policy and the stock ceiling.
        // Purchases restock, so neither applies.
        let unit_cost_at_time = match kind {
            TransactionKind::Sale => {
                if policy == PricePolicy::FloorAtCost && line.unit_amount < snap.cost_price {
                    return Err(LedgerError::PriceBelowCost {
                        product_id: line.product_id.clone(),
                        offered: line.unit_amount,
                        cost: snap.cost_price,
                    });
                }
                if line.quantity > snap.quantity_in_stock {
                    return Err(LedgerError::InsufficientStock {
                        product_id: line.product_id.clone(),
                        requested: line.quantity,
                        available: snap.quantity_in_stock,
                    });
                }
                snap.cost_price
            }
            // For purchases the keyed-in amount is itself the cost.
            TransactionKind::Purchase => line.unit_amount,
        };

        lines.push(ValidatedLine {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_amount: line.unit_amount,
            unit_cost_at_time,
        });
    }

    Ok(ValidatedCart { kind, lines })
}
