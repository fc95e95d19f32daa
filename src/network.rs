//! Network - which Bitcoin chain a connection and its signing calls target

use crate::error::{AdapterError, AdapterResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    /// Internal validation only. Browser extensions do not expose regtest.
    Regtest,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self { Network::Mainnet => "mainnet", Network::Testnet => "testnet", Network::Regtest => "regtest" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "livenet" => Some(Network::Mainnet),
            "testnet" => Some(Network::Testnet),
            "regtest" => Some(Network::Regtest),
            _ => None,
        }
    }

    pub fn to_bitcoin(&self) -> bitcoin::Network {
        match self { Network::Mainnet => bitcoin::Network::Bitcoin, Network::Testnet => bitcoin::Network::Testnet, Network::Regtest => bitcoin::Network::Regtest }
    }

    /// Name the injected extensions use for this network (`livenet`/`testnet`).
    pub fn extension_name(&self) -> AdapterResult<&'static str> {
        match self {
            Network::Mainnet => Ok("livenet"),
            Network::Testnet => Ok("testnet"),
            Network::Regtest => Err(AdapterError::Generic("Regtest is not supported by browser wallets".into())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}
