//! OKX adapter
//!
//! OKX exposes one namespace per network and connects by prompting, so
//! there is no read-only path. Signing is scoped: each input the caller
//! wants signed is listed explicitly together with the owning address.

use super::{finish_message, finish_psbt, MessageScheme, NativeSignOptions, ProviderKind, PsbtSignOptions, WalletAddress, WalletProvider};
use crate::address::resolve_format;
use crate::error::{AdapterError, AdapterResult, ExtensionResult};
use crate::network::Network;
use crate::psbt::{self, SignedResult};
use async_trait::async_trait;
use bitcoin::Psbt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Account returned by the OKX `connect` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxAccount {
    pub address: String,
    pub public_key: String,
}

/// Native surface of the injected OKX extension. `network` selects the
/// per-network namespace (`livenet` or `testnet`).
#[async_trait]
pub trait OkxApi: Send + Sync {
    fn is_installed(&self) -> bool;
    async fn connect(&self, network: &str) -> ExtensionResult<Option<OkxAccount>>;
    async fn sign_psbt(&self, network: &str, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String>;
    async fn sign_message(&self, network: &str, message: &str, scheme: &str) -> ExtensionResult<String>;
}

pub struct OkxProvider {
    api: Arc<dyn OkxApi>,
}

impl OkxProvider {
    pub fn new(api: Arc<dyn OkxApi>) -> Self { Self { api } }

    fn ensure_installed(&self) -> AdapterResult<()> {
        if self.api.is_installed() { Ok(()) } else { Err(AdapterError::not_installed(ProviderKind::Okx)) }
    }
}

#[async_trait]
impl WalletProvider for OkxProvider {
    fn kind(&self) -> ProviderKind { ProviderKind::Okx }

    fn is_installed(&self) -> bool { self.api.is_installed() }

    async fn get_addresses(&self, network: Network, _read_only: bool) -> AdapterResult<Vec<WalletAddress>> {
        self.ensure_installed()?;
        let target = network.extension_name()?;

        let account = self.api.connect(target).await.map_err(AdapterError::from_extension)?;
        let Some(account) = account.filter(|a| !a.address.is_empty()) else {
            return Ok(Vec::new());
        };
        let format = resolve_format(&account.address, network)?;
        Ok(vec![WalletAddress { public_key: account.public_key, address: account.address, format }])
    }

    async fn sign_psbt(&self, psbt: &Psbt, options: &PsbtSignOptions) -> AdapterResult<SignedResult> {
        self.ensure_installed()?;
        options.validate()?;
        let target = options.network.extension_name()?;
        let response = self.api.sign_psbt(target, &psbt::to_hex(psbt), &options.native(true)).await;
        finish_psbt(ProviderKind::Okx, response, options.extract_tx)
    }

    async fn sign_message(&self, message: &str, scheme: MessageScheme, network: Network) -> AdapterResult<SignedResult> {
        self.ensure_installed()?;
        let target = network.extension_name()?;
        let response = self.api.sign_message(target, message, scheme.as_str()).await;
        finish_message(ProviderKind::Okx, response)
    }
}
