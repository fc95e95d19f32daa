//! Wizz adapter
//!
//! Same account and signing surface as UniSat but without an account-change
//! listener, so a Wizz connection never live-updates. Wizz rejections are
//! not `Error` instances; only a structured `4001` counts as cancellation.

use super::{finish_message, finish_psbt, first_address, MessageScheme, NativeSignOptions, ProviderKind, PsbtSignOptions, WalletAddress, WalletProvider};
use crate::error::{AdapterError, AdapterResult, ExtensionResult};
use crate::network::Network;
use crate::psbt::{self, SignedResult};
use async_trait::async_trait;
use bitcoin::Psbt;
use std::sync::Arc;

/// Native surface of the injected Wizz extension
#[async_trait]
pub trait WizzApi: Send + Sync {
    fn is_installed(&self) -> bool;
    async fn get_network(&self) -> ExtensionResult<String>;
    /// Resolves with the network the extension ended up on
    async fn switch_network(&self, network: &str) -> ExtensionResult<String>;
    async fn request_accounts(&self) -> ExtensionResult<Vec<String>>;
    async fn get_accounts(&self) -> ExtensionResult<Vec<String>>;
    async fn get_public_key(&self) -> ExtensionResult<String>;
    async fn sign_psbt(&self, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String>;
    async fn sign_message(&self, message: &str, scheme: &str) -> ExtensionResult<String>;
}

pub struct WizzProvider {
    api: Arc<dyn WizzApi>,
}

impl WizzProvider {
    pub fn new(api: Arc<dyn WizzApi>) -> Self { Self { api } }

    fn ensure_installed(&self) -> AdapterResult<()> {
        if self.api.is_installed() { Ok(()) } else { Err(AdapterError::not_installed(ProviderKind::Wizz)) }
    }
}

#[async_trait]
impl WalletProvider for WizzProvider {
    fn kind(&self) -> ProviderKind { ProviderKind::Wizz }

    fn is_installed(&self) -> bool { self.api.is_installed() }

    async fn get_addresses(&self, network: Network, read_only: bool) -> AdapterResult<Vec<WalletAddress>> {
        self.ensure_installed()?;
        let target = network.extension_name()?;

        let connected = self.api.get_network().await.map_err(AdapterError::from_extension)?;
        if connected != target {
            let switched = self.api.switch_network(target).await.map_err(AdapterError::from_extension)?;
            if switched != target {
                return Err(AdapterError::Generic(format!("WIZZ stayed on {} instead of {}", switched, target)));
            }
        }

        let accounts = match read_only {
            true => self.api.get_accounts().await,
            false => self.api.request_accounts().await,
        }
        .map_err(AdapterError::from_extension)?;
        if accounts.is_empty() {
            return Ok(Vec::new());
        }
        let public_key = self.api.get_public_key().await.map_err(AdapterError::from_extension)?;
        first_address(&accounts, public_key, network)
    }

    async fn sign_psbt(&self, psbt: &Psbt, options: &PsbtSignOptions) -> AdapterResult<SignedResult> {
        self.ensure_installed()?;
        options.validate()?;
        let response = self.api.sign_psbt(&psbt::to_hex(psbt), &options.native(false)).await;
        finish_psbt(ProviderKind::Wizz, response, options.extract_tx)
    }

    async fn sign_message(&self, message: &str, scheme: MessageScheme, _network: Network) -> AdapterResult<SignedResult> {
        self.ensure_installed()?;
        let response = self.api.sign_message(message, scheme.as_str()).await;
        finish_message(ProviderKind::Wizz, response)
    }

    fn supports_read_only(&self) -> bool { true }
}
