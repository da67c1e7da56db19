//! Durable ledger records: transaction headers and their lines.
//!
//! Both record kinds are append-only. A header and its lines are written
//! together inside one atomic commit and no code path updates or deletes
//! them afterwards; reports trust the captured amounts forever.

use chrono::Utc;

use crate::types::{Money, TimeStamp};

pub const TRANSACTIONS_TREE: &str = "transactions";
pub const TRANSACTION_LINES_TREE: &str = "transaction_lines";

/// Which way stock and money move, and which party store the counterparty
/// id resolves against.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    #[n(0)]
    Sale,
    #[n(1)]
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Purchase => "purchase",
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    #[n(0)]
    pub id: String, // bech32, "txn_" prefix
    #[n(1)]
    pub kind: TransactionKind,
    #[n(2)]
    pub counterparty_id: String,
    #[n(3)]
    pub occurred_at: TimeStamp<Utc>,
    /// Σ(quantity × unit_amount) over the lines, fixed at commit time.
    #[n(4)]
    pub total_amount: Money,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct TransactionLine {
    #[n(0)]
    pub transaction_id: String,
    #[n(1)]
    pub product_id: String,
    #[n(2)]
    pub quantity: u32,
    /// Sale price for sale lines, cost for purchase lines; whatever the
    /// operator keyed in, captured as-is.
    #[n(3)]
    pub unit_amount: Money,
    /// The product's catalog cost price at the moment of commit. Profit for
    /// a sale line is `unit_amount - unit_cost_at_time`, computable forever
    /// regardless of later catalog changes.
    #[n(4)]
    pub unit_cost_at_time: Money,
}

impl TransactionLine {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_amount.checked_mul_quantity(self.quantity)
    }
    pub fn unit_margin(&self) -> Option<Money> {
        self.unit_amount.checked_sub(self.unit_cost_at_time)
    }
}

/// What a successful commit hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub transaction_id: String,
    pub total_amount: Money,
}

// Line keys are `{transaction_id}/{index:04}` so a prefix scan returns one
// commit's lines in insertion order.
pub(crate) fn line_key(transaction_id: &str, index: usize) -> Vec<u8> {
    format!("{transaction_id}/{index:04}").into_bytes()
}
