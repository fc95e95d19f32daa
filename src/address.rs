//! Address Format Resolver
//!
//! Validates an address against a network and classifies its script type.
//! Pure and deterministic: no I/O, no provider round-trip.

use crate::error::{AdapterError, AdapterResult};
use crate::network::Network;
use bitcoin::address::{Address, AddressType, NetworkUnchecked};
use bitcoin::secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Serialize};

/// Semantic script-type classification of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFormat {
    #[serde(rename = "legacy")]
    Legacy,
    #[serde(rename = "p2sh-p2wpkh")]
    P2shP2wpkh,
    #[serde(rename = "p2wsh")]
    P2wsh,
    #[serde(rename = "segwit")]
    Segwit,
    #[serde(rename = "taproot")]
    Taproot,
}

impl AddressFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFormat::Legacy => "legacy",
            AddressFormat::P2shP2wpkh => "p2sh-p2wpkh",
            AddressFormat::P2wsh => "p2wsh",
            AddressFormat::Segwit => "segwit",
            AddressFormat::Taproot => "taproot",
        }
    }

    /// Fixed script-type table: p2pkh, p2sh, p2wsh, p2wpkh, p2tr.
    fn from_address_type(kind: AddressType) -> Option<Self> {
        match kind {
            AddressType::P2pkh => Some(AddressFormat::Legacy),
            AddressType::P2sh => Some(AddressFormat::P2shP2wpkh),
            AddressType::P2wsh => Some(AddressFormat::P2wsh),
            AddressType::P2wpkh => Some(AddressFormat::Segwit),
            AddressType::P2tr => Some(AddressFormat::Taproot),
            _ => None,
        }
    }
}

impl std::fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Resolve the format of `address` on `network`.
///
/// Fails with [`AdapterError::InvalidAddress`] when the address does not
/// parse, belongs to another network, or has an unsupported script type.
pub fn resolve_format(address: &str, network: Network) -> AdapterResult<AddressFormat> {
    let unchecked: Address<NetworkUnchecked> = address.parse().map_err(|_| AdapterError::invalid_address())?;

    let valid = match network {
        Network::Regtest => is_valid_for_regtest(&unchecked),
        _ => unchecked.is_valid_for_network(network.to_bitcoin()),
    };
    if !valid {
        return Err(AdapterError::invalid_address());
    }

    unchecked
        .assume_checked()
        .address_type()
        .and_then(AddressFormat::from_address_type)
        .ok_or_else(AdapterError::invalid_address)
}

// Base58 regtest addresses share the testnet version bytes, while bech32
// regtest addresses use their own `bcrt` prefix. So legacy encodings must
// look like testnet and bech32 encodings must look like regtest.
fn is_valid_for_regtest(unchecked: &Address<NetworkUnchecked>) -> bool {
    let bech32 = unchecked.clone().assume_checked().script_pubkey().is_witness_program();
    if bech32 {
        unchecked.is_valid_for_network(bitcoin::Network::Regtest)
    } else {
        unchecked.is_valid_for_network(bitcoin::Network::Testnet)
    }
}

/// Hex x-only key for a compressed (33 byte) or x-only (32 byte) public key.
pub fn x_only_key(public_key_hex: &str) -> Option<String> {
    let bytes = hex::decode(public_key_hex.trim()).ok()?;
    let x = match bytes.len() {
        33 => &bytes[1..],
        32 => &bytes[..],
        _ => return None,
    };
    XOnlyPublicKey::from_slice(x).ok().map(|key| hex::encode(key.serialize()))
}
