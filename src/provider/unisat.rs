//! UniSat adapter
//!
//! UniSat rejects with structured `{code, message}` objects, signs PSBTs
//! without input scoping, and emits `accountsChanged` when the user switches
//! account inside the extension.

use super::{finish_message, finish_psbt, first_address, AccountsListener, ListenerId, MessageScheme, NativeSignOptions, ProviderKind, PsbtSignOptions, WalletAddress, WalletProvider};
use crate::error::{AdapterError, AdapterResult, ExtensionResult};
use crate::network::Network;
use crate::psbt::{self, SignedResult};
use async_trait::async_trait;
use bitcoin::Psbt;
use std::sync::Arc;
use std::time::Duration;

/// Account-change event name
pub const ACCOUNTS_CHANGED: &str = "accountsChanged";

/// Native surface of the injected UniSat extension
#[async_trait]
pub trait UnisatApi: Send + Sync {
    fn is_installed(&self) -> bool;
    /// Extension finished injecting and can answer account queries
    fn is_ready(&self) -> bool;
    async fn get_network(&self) -> ExtensionResult<String>;
    async fn switch_network(&self, network: &str) -> ExtensionResult<()>;
    async fn request_accounts(&self) -> ExtensionResult<Vec<String>>;
    async fn get_accounts(&self) -> ExtensionResult<Vec<String>>;
    async fn get_public_key(&self) -> ExtensionResult<String>;
    async fn sign_psbt(&self, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String>;
    async fn sign_message(&self, message: &str, scheme: &str) -> ExtensionResult<String>;
    fn add_listener(&self, event: &str, listener: AccountsListener) -> ListenerId;
    fn remove_listener(&self, event: &str, id: ListenerId);
}

pub struct UnisatProvider {
    api: Arc<dyn UnisatApi>,
}

impl UnisatProvider {
    pub fn new(api: Arc<dyn UnisatApi>) -> Self { Self { api } }

    fn ensure_installed(&self) -> AdapterResult<()> {
        if self.api.is_installed() { Ok(()) } else { Err(AdapterError::not_installed(ProviderKind::Unisat)) }
    }
}

#[async_trait]
impl WalletProvider for UnisatProvider {
    fn kind(&self) -> ProviderKind { ProviderKind::Unisat }

    fn is_installed(&self) -> bool { self.api.is_installed() }

    async fn get_addresses(&self, network: Network, read_only: bool) -> AdapterResult<Vec<WalletAddress>> {
        self.ensure_installed()?;
        let target = network.extension_name()?;

        let connected = self.api.get_network().await.map_err(AdapterError::from_extension)?;
        if connected != target {
            tracing::debug!("UniSat on {}, switching to {}", connected, target);
            self.api.switch_network(target).await.map_err(AdapterError::from_extension)?;
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
        finish_psbt(ProviderKind::Unisat, response, options.extract_tx)
    }

    async fn sign_message(&self, message: &str, scheme: MessageScheme, _network: Network) -> AdapterResult<SignedResult> {
        self.ensure_installed()?;
        let response = self.api.sign_message(message, scheme.as_str()).await;
        finish_message(ProviderKind::Unisat, response)
    }

    fn supports_read_only(&self) -> bool { true }

    async fn wait_until_ready(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.api.is_installed() && self.api.is_ready() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    fn supports_live_updates(&self) -> bool { true }

    fn subscribe_accounts(&self, listener: AccountsListener) -> Option<ListenerId> {
        if !self.api.is_installed() {
            return None;
        }
        Some(self.api.add_listener(ACCOUNTS_CHANGED, listener))
    }

    fn unsubscribe_accounts(&self, id: ListenerId) {
        self.api.remove_listener(ACCOUNTS_CHANGED, id);
    }
}
