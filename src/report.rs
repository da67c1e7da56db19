//! Read-only reporting over committed ledger state.
//!
//! Readers consume headers, lines and current product rows; they never
//! write. Profit figures come from the amounts captured on sale lines at
//! commit time, so later catalog price changes cannot revise history.

use std::collections::{BTreeMap, HashSet};

use sled::{Db, Tree};

use crate::catalog::{PRODUCTS_TREE, Product};
use crate::error::LedgerError;
use crate::ledger::{
    TRANSACTION_LINES_TREE, TRANSACTIONS_TREE, TransactionHeader, TransactionKind, TransactionLine,
};
use crate::types::Money;
use crate::utils;

/// One row of the per-product profit report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfitByProduct {
    pub product_id: String,
    pub product_name: String,
    pub units_sold: u64,
    pub revenue: Money,
    /// Σ((unit_amount - unit_cost_at_time) × quantity) over sale lines.
    pub profit: Money,
}

/// A product at or under its low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockProduct {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub quantity_in_stock: u32,
    pub low_stock_threshold: u32,
}

pub struct ReportReader {
    products: Tree,
    transactions: Tree,
    lines: Tree,
}

#[derive(Default)]
struct ProfitAccum {
    units_sold: u64,
    revenue: Money,
    profit: Money,
}

impl ReportReader {
    pub fn new(db: &Db) -> Result<Self, LedgerError> {
        Ok(Self {
            products: db.open_tree(PRODUCTS_TREE)?,
            transactions: db.open_tree(TRANSACTIONS_TREE)?,
            lines: db.open_tree(TRANSACTION_LINES_TREE)?,
        })
    }

    /// Per-product units sold, revenue and actual profit, most profitable
    /// first. Purchases are not profit-bearing and are skipped.
    pub fn profit_by_product(&self) -> Result<Vec<ProfitByProduct>, LedgerError> {
        let mut sale_ids = HashSet::new();
        for entry in self.transactions.iter() {
            let (_, value) = entry?;
            let header: TransactionHeader = utils::from_cbor(&value)?;
            if header.kind == TransactionKind::Sale {
                sale_ids.insert(header.id);
            }
        }

        let mut accums: BTreeMap<String, ProfitAccum> = BTreeMap::new();
        for entry in self.lines.iter() {
            let (_, value) = entry?;
            let line: TransactionLine = utils::from_cbor(&value)?;
            if !sale_ids.contains(&line.transaction_id) {
                continue;
            }

            let line_revenue = line.line_total().ok_or(LedgerError::Overflow)?;
            let line_profit = line
                .unit_margin()
                .and_then(|margin| margin.checked_mul_quantity(line.quantity))
                .ok_or(LedgerError::Overflow)?;

            let accum = accums.entry(line.product_id).or_default();
            accum.units_sold += u64::from(line.quantity);
            accum.revenue = accum
                .revenue
                .checked_add(line_revenue)
                .ok_or(LedgerError::Overflow)?;
            accum.profit = accum
                .profit
                .checked_add(line_profit)
                .ok_or(LedgerError::Overflow)?;
        }

        let mut rows = Vec::with_capacity(accums.len());
        for (product_id, accum) in accums {
            let Some(bytes) = self.products.get(product_id.as_bytes())? else {
                return Err(LedgerError::UnknownProduct { product_id });
            };
            let product: Product = utils::from_cbor(&bytes)?;

            rows.push(ProfitByProduct {
                product_id,
                product_name: product.name,
                units_sold: accum.units_sold,
                revenue: accum.revenue,
                profit: accum.profit,
            });
        }
        rows.sort_by(|a, b| b.profit.cmp(&a.profit));
        Ok(rows)
    }

    /// Products whose stock has fallen to or under their threshold, most
    /// depleted first.
    pub fn low_stock(&self) -> Result<Vec<LowStockProduct>, LedgerError> {
        let mut rows = Vec::new();
        for entry in self.products.iter() {
            let (_, value) = entry?;
            let product: Product = utils::from_cbor(&value)?;
            if product.quantity_in_stock <= product.low_stock_threshold {
                rows.push(LowStockProduct {
                    product_id: product.id,
                    name: product.name,
                    sku: product.sku,
                    quantity_in_stock: product.quantity_in_stock,
                    low_stock_threshold: product.low_stock_threshold,
                });
            }
        }
        rows.sort_by_key(|row| row.quantity_in_stock);
        Ok(rows)
    }
}
