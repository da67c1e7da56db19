//! Service layer API for ledger commit operations
use std::sync::Arc;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use tracing::{debug, info};

use crate::cart::{Cart, CartLine};
use crate::catalog::{PRODUCTS_TREE, Product};
use crate::error::LedgerError;
use crate::ledger::{
    CommitReceipt, TRANSACTION_LINES_TREE, TRANSACTIONS_TREE, TransactionHeader, TransactionKind,
    TransactionLine, line_key,
};
use crate::party::PartyStore;
use crate::types::{Money, TimeStamp};
use crate::utils;
use crate::validate::{PricePolicy, ValidatedCart, validate_cart};

// Closure-local shorthand for aborting the atomic unit with a domain error.
fn abort<A>(err: LedgerError) -> Result<A, ConflictableTransactionError<LedgerError>> {
    Err(ConflictableTransactionError::Abort(err))
}

pub struct LedgerService {
    instance: Arc<Db>,
    products: Tree,
    transactions: Tree,
    lines: Tree,
    parties: PartyStore,
    price_policy: PricePolicy,
}

impl LedgerService {
    pub fn new(instance: Arc<Db>) -> Result<Self, LedgerError> {
        Self::with_price_policy(instance, PricePolicy::default())
    }

    pub fn with_price_policy(
        instance: Arc<Db>,
        price_policy: PricePolicy,
    ) -> Result<Self, LedgerError> {
        let products = instance.open_tree(PRODUCTS_TREE)?;
        let transactions = instance.open_tree(TRANSACTIONS_TREE)?;
        let lines = instance.open_tree(TRANSACTION_LINES_TREE)?;
        let parties = PartyStore::new(&instance)?;

        Ok(Self {
            instance,
            products,
            transactions,
            lines,
            parties,
            price_policy,
        })
    }

    /// Record a sale to `customer_id`: one header, one line per cart entry
    /// with the catalog cost captured at commit, and a stock decrement per
    /// product. All of it lands, or none of it does.
    pub fn record_sale(
        &self,
        customer_id: &str,
        lines: Vec<CartLine>,
    ) -> Result<CommitReceipt, LedgerError> {
        self.record(TransactionKind::Sale, customer_id, lines)
    }

    /// Record a purchase from `supplier_id`. Same commit contract as a sale,
    /// with stock incremented instead and no stock ceiling.
    pub fn record_purchase(
        &self,
        supplier_id: &str,
        lines: Vec<CartLine>,
    ) -> Result<CommitReceipt, LedgerError> {
        self.record(TransactionKind::Purchase, supplier_id, lines)
    }

    fn record(
        &self,
        kind: TransactionKind,
        counterparty_id: &str,
        lines: Vec<CartLine>,
    ) -> Result<CommitReceipt, LedgerError> {
        let cart = Cart::from_lines(lines);

        if !self.parties.counterparty_exists(kind, counterparty_id)? {
            return Err(LedgerError::UnknownCounterparty {
                party_id: counterparty_id.to_owned(),
            });
        }

        // Advisory pass against a fresh snapshot; the authoritative stock
        // check runs again inside the atomic scope in commit().
        let validated = validate_cart(&cart, kind, self.price_policy, |product_id| {
            let Some(bytes) = self.products.get(product_id.as_bytes())? else {
                return Ok(None);
            };
            let product: Product = utils::from_cbor(&bytes)?;
            Ok(Some(product.snapshot()))
        })
        .inspect_err(|err| debug!(kind = kind.as_str(), %err, "cart rejected"))?;

        self.commit(&validated, counterparty_id)
    }

    /// All-or-nothing commit of header, lines and stock deltas inside one
    /// store transaction over the three trees. Any domain failure aborts the
    /// whole unit; a conflicting concurrent commit makes the store re-run
    /// the closure against committed state, so the stock re-check below is
    /// the authoritative one even when the validated cart has gone stale.
    pub fn commit(
        &self,
        validated: &ValidatedCart,
        counterparty_id: &str,
    ) -> Result<CommitReceipt, LedgerError> {
        // Minted once, outside the closure: a store-level retry re-runs with
        // the same identity and timestamp.
        let transaction_id = utils::new_uuid_to_bech32("txn_")?;
        let occurred_at = TimeStamp::new();

        let outcome = (&self.products, &self.transactions, &self.lines).transaction(
            |(products, transactions, lines_tree)| {
                let mut total = Money::ZERO;
                let mut captured = Vec::with_capacity(validated.lines.len());

                for line in &validated.lines {
                    let Some(bytes) = products.get(line.product_id.as_bytes())? else {
                        return abort(LedgerError::UnknownProduct {
                            product_id: line.product_id.clone(),
                        });
                    };
                    let mut product: Product = match utils::from_cbor(&bytes) {
                        Ok(product) => product,
                        Err(err) => return abort(err),
                    };

                    // Re-check stock and capture the cost price in the same
                    // read, inside the atomic scope.
                    let unit_cost_at_time = match validated.kind {
                        TransactionKind::Sale => {
                            if line.quantity > product.quantity_in_stock {
                                return abort(LedgerError::InsufficientStock {
                                    product_id: line.product_id.clone(),
                                    requested: line.quantity,
                                    available: product.quantity_in_stock,
                                });
                            }
                            product.quantity_in_stock -= line.quantity;
                            product.cost_price
                        }
                        TransactionKind::Purchase => {
                            let Some(raised) =
                                product.quantity_in_stock.checked_add(line.quantity)
                            else {
                                return abort(LedgerError::Overflow);
                            };
                            product.quantity_in_stock = raised;
                            line.unit_amount
                        }
                    };

                    let Some(line_total) = line.unit_amount.checked_mul_quantity(line.quantity)
                    else {
                        return abort(LedgerError::Overflow);
                    };
                    let Some(summed) = total.checked_add(line_total) else {
                        return abort(LedgerError::Overflow);
                    };
                    total = summed;

                    captured.push(TransactionLine {
                        transaction_id: transaction_id.clone(),
                        product_id: line.product_id.clone(),
                        quantity: line.quantity,
                        unit_amount: line.unit_amount,
                        unit_cost_at_time,
                    });

                    match utils::to_cbor(&product) {
                        Ok(encoded) => products.insert(line.product_id.as_bytes(), encoded)?,
                        Err(err) => return abort(err),
                    };
                }

                let header = TransactionHeader {
                    id: transaction_id.clone(),
                    kind: validated.kind,
                    counterparty_id: counterparty_id.to_owned(),
                    occurred_at: occurred_at.clone(),
                    total_amount: total,
                };
                match utils::to_cbor(&header) {
                    Ok(encoded) => transactions.insert(transaction_id.as_bytes(), encoded)?,
                    Err(err) => return abort(err),
                };

                for (index, line) in captured.iter().enumerate() {
                    match utils::to_cbor(line) {
                        Ok(encoded) => lines_tree.insert(line_key(&transaction_id, index), encoded)?,
                        Err(err) => return abort(err),
                    };
                }

                Ok(CommitReceipt {
                    transaction_id: transaction_id.clone(),
                    total_amount: total,
                })
            },
        );

        match outcome {
            Ok(receipt) => {
                info!(
                    id = %receipt.transaction_id,
                    kind = validated.kind.as_str(),
                    total = %receipt.total_amount,
                    lines = validated.lines.len(),
                    "transaction committed"
                );
                Ok(receipt)
            }
            Err(TransactionError::Abort(err)) => {
                debug!(kind = validated.kind.as_str(), %err, "commit aborted");
                Err(err)
            }
            Err(TransactionError::Storage(err)) => Err(LedgerError::Storage(err)),
        }
    }

    /// Load one committed transaction with its lines, in insertion order.
    pub fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<(TransactionHeader, Vec<TransactionLine>)>, LedgerError> {
        let Some(bytes) = self.transactions.get(transaction_id.as_bytes())? else {
            return Ok(None);
        };
        let header: TransactionHeader = utils::from_cbor(&bytes)?;

        let mut lines = Vec::new();
        for entry in self.lines.scan_prefix(format!("{transaction_id}/").as_bytes()) {
            let (_, value) = entry?;
            lines.push(utils::from_cbor::<TransactionLine>(&value)?);
        }
        Ok(Some((header, lines)))
    }

    /// Committed headers, newest first, optionally narrowed by kind and/or
    /// counterparty.
    pub fn list_transactions(
        &self,
        kind: Option<TransactionKind>,
        counterparty_id: Option<&str>,
    ) -> Result<Vec<TransactionHeader>, LedgerError> {
        let mut headers = Vec::new();
        for entry in self.transactions.iter() {
            let (_, value) = entry?;
            let header: TransactionHeader = utils::from_cbor(&value)?;
            if kind.is_some_and(|k| k != header.kind) {
                continue;
            }
            if counterparty_id.is_some_and(|c| c != header.counterparty_id) {
                continue;
            }
            headers.push(header);
        }
        headers.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(headers)
    }

    pub fn db(&self) -> &Arc<Db> {
        &self.instance
    }
}
