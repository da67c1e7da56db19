//! Utility functions for identifier minting and serialization

use bech32::Bech32m;
use uuid7::uuid7;

use crate::error::LedgerError;

// construct a unique record id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

pub(crate) fn to_cbor<T>(value: &T) -> Result<Vec<u8>, LedgerError>
where
    T: minicbor::Encode<()>,
{
    minicbor::to_vec(value).map_err(|e| LedgerError::Codec(e.to_string()))
}

pub(crate) fn from_cbor<'b, T>(bytes: &'b [u8]) -> Result<T, LedgerError>
where
    T: minicbor::Decode<'b, ()>,
{
    minicbor::decode(bytes).map_err(|e| LedgerError::Codec(e.to_string()))
}
