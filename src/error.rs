use crate::types::Money;

/// Everything the ledger can refuse to do, in a shape callers can match on.
/// Validation variants are reported before any durable write; anything that
/// surfaces from inside a commit has already been rolled back in full.
#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("cart has no lines")]
    EmptyCart,
    #[error("product {product_id} does not exist in the catalog")]
    UnknownProduct { product_id: String },
    #[error("counterparty {party_id} does not exist")]
    UnknownCounterparty { party_id: String },
    #[error("line for {product_id} has a zero quantity")]
    InvalidQuantity { product_id: String },
    #[error("line for {product_id} has a negative amount")]
    InvalidAmount { product_id: String },
    #[error("price {offered} for {product_id} is below catalog cost {cost}")]
    PriceBelowCost {
        product_id: String,
        offered: Money,
        cost: Money,
    },
    #[error("not enough stock for {product_id}. requested: {requested}, available: {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    #[error("counterparty {party_id} is referenced by committed transactions")]
    CounterpartyInUse { party_id: String },
    #[error("money or stock arithmetic overflowed")]
    Overflow,
    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("stored record could not be decoded: {0}")]
    Codec(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
