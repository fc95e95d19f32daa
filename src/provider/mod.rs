//! Provider Capability Interface
//!
//! Every supported wallet extension is adapted to one contract,
//! [`WalletProvider`]: read addresses, sign a PSBT, sign a message. Adapters
//! are thin translators; the extension itself is injected at construction
//! through a wallet-specific API trait, so adapters never touch ambient
//! browser state and can be driven by fakes in tests.
//!
//! # Providers
//!
//! | Kind | Extension API | Read-only | Live updates | Scoped signing |
//! |------|---------------|-----------|--------------|----------------|
//! | `Unisat` | [`UnisatApi`] | yes | `accountsChanged` | no |
//! | `Wizz` | [`WizzApi`] | yes | no | no |
//! | `Okx` | [`OkxApi`] | no | no | `toSignInputs` |

mod okx;
mod unisat;
mod wizz;

pub use okx::{OkxAccount, OkxApi, OkxProvider};
pub use unisat::{UnisatApi, UnisatProvider, ACCOUNTS_CHANGED};
pub use wizz::{WizzApi, WizzProvider};

use crate::address::{resolve_format, AddressFormat};
use crate::error::{AdapterError, AdapterResult, ExtensionResult};
use crate::network::Network;
use crate::psbt::{self, SignedResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::Psbt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Supported wallet extensions. Closed set, one adapter each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind { Unisat, Wizz, Okx }

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Unisat, ProviderKind::Wizz, ProviderKind::Okx];

    pub fn as_str(&self) -> &'static str {
        match self { ProviderKind::Unisat => "unisat", ProviderKind::Wizz => "wizz", ProviderKind::Okx => "okx" }
    }

    pub fn display_name(&self) -> &'static str {
        match self { ProviderKind::Unisat => "UniSat", ProviderKind::Wizz => "WIZZ", ProviderKind::Okx => "OKX" }
    }

    pub fn install_url(&self) -> &'static str {
        match self {
            ProviderKind::Unisat => "https://unisat.io/download",
            ProviderKind::Wizz => "https://wizzwallet.io",
            ProviderKind::Okx => "https://www.okx.com/web3",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.display_name()) }
}

/// One account reported by a provider, already format-resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress {
    pub public_key: String,
    pub address: String,
    pub format: AddressFormat,
}

/// Message signature scheme identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageScheme { Bip322Simple }

impl MessageScheme {
    pub fn as_str(&self) -> &'static str {
        match self { MessageScheme::Bip322Simple => "bip322-simple" }
    }
}

/// Provider-level PSBT signing parameters, resolved by the signing pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsbtSignOptions {
    pub finalize: bool,
    pub extract_tx: bool,
    pub network: Network,
    /// Address that owns the inputs being signed
    pub address: String,
    /// Input indices to sign. Only honoured by providers that scope signing.
    pub signing_indexes: Vec<usize>,
    pub sighash: Option<u32>,
}

impl PsbtSignOptions {
    /// Extraction needs finalized inputs, so `extract_tx` without `finalize`
    /// can never succeed.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.extract_tx && !self.finalize {
            return Err(AdapterError::ExtractTxFromNonFinalizedPsbt);
        }
        Ok(())
    }

    pub(crate) fn native(&self, scoped: bool) -> NativeSignOptions {
        let to_sign_inputs = if scoped {
            self.signing_indexes
                .iter()
                .map(|&index| ToSignInput {
                    index,
                    address: Some(self.address.clone()),
                    sighash_types: self.sighash.map(|s| vec![s]),
                })
                .collect()
        } else {
            Vec::new()
        };
        NativeSignOptions { auto_finalized: self.finalize, to_sign_inputs }
    }
}

/// Options object extensions accept alongside a PSBT hex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeSignOptions {
    pub auto_finalized: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_sign_inputs: Vec<ToSignInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToSignInput {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sighash_types: Option<Vec<u32>>,
}

/// Callback invoked by an extension with the new account list
pub type AccountsListener = Arc<dyn Fn(Vec<String>) + Send + Sync>;

/// Handle returned when a listener is registered, needed to remove it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The uniform contract every wallet adapter implements.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn is_installed(&self) -> bool;

    /// Read the wallet's accounts on `network`, switching the extension's
    /// network first when it differs. An empty vec means no account.
    async fn get_addresses(&self, network: Network, read_only: bool) -> AdapterResult<Vec<WalletAddress>>;

    async fn sign_psbt(&self, psbt: &Psbt, options: &PsbtSignOptions) -> AdapterResult<SignedResult>;

    async fn sign_message(&self, message: &str, scheme: MessageScheme, network: Network) -> AdapterResult<SignedResult>;

    /// Whether accounts can be read without prompting the user.
    fn supports_read_only(&self) -> bool { false }

    /// Poll the extension's readiness signal, giving up after `timeout`.
    async fn wait_until_ready(&self, _timeout: Duration, _poll_interval: Duration) -> bool { self.is_installed() }

    fn supports_live_updates(&self) -> bool { false }

    /// Register an account-change listener. `None` when unsupported.
    fn subscribe_accounts(&self, _listener: AccountsListener) -> Option<ListenerId> { None }

    fn unsubscribe_accounts(&self, _id: ListenerId) {}
}

/// Turn the first reported account into a resolved [`WalletAddress`].
///
/// Resolver failures propagate unchanged: they are internal errors, not
/// provider ones.
pub(crate) fn first_address(accounts: &[String], public_key: String, network: Network) -> AdapterResult<Vec<WalletAddress>> {
    let Some(address) = accounts.first().filter(|a| !a.is_empty()) else {
        return Ok(Vec::new());
    };
    let format = resolve_format(address, network)?;
    Ok(vec![WalletAddress { public_key, address: address.clone(), format }])
}

/// Map an extension's PSBT signing response into the caller-facing result.
///
/// An empty payload without a rejection is still a failure.
pub(crate) fn finish_psbt(kind: ProviderKind, response: ExtensionResult<String>, extract_tx: bool) -> AdapterResult<SignedResult> {
    let fallback = format!("Failed to sign psbt hex using {}", kind.display_name());
    let signed = response.map_err(|e| AdapterError::from_signing(e, &fallback))?;
    if signed.trim().is_empty() {
        return Err(AdapterError::SigningError(fallback));
    }
    psbt::settle(&signed, extract_tx)
}

/// Map an extension's base64 message signature into a [`SignedResult`].
pub(crate) fn finish_message(kind: ProviderKind, response: ExtensionResult<String>) -> AdapterResult<SignedResult> {
    let fallback = format!("Failed to sign message using {}", kind.display_name());
    let signature = response.map_err(|e| AdapterError::from_signing(e, &fallback))?;
    if signature.trim().is_empty() {
        return Err(AdapterError::SigningError(fallback));
    }
    let raw = STANDARD
        .decode(signature.trim())
        .map_err(|_| AdapterError::SigningError(format!("{}: signature is not base64", fallback)))?;
    Ok(SignedResult { hex: hex::encode(raw), base64: Some(signature) })
}

/// Static map from [`ProviderKind`] to its adapter
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn WalletProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self { Self::default() }

    /// Register an adapter under its own kind, replacing any previous one.
    pub fn register(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn with_unisat(self, api: Arc<dyn UnisatApi>) -> Self { self.register(Arc::new(UnisatProvider::new(api))) }
    pub fn with_wizz(self, api: Arc<dyn WizzApi>) -> Self { self.register(Arc::new(WizzProvider::new(api))) }
    pub fn with_okx(self, api: Arc<dyn OkxApi>) -> Self { self.register(Arc::new(OkxProvider::new(api))) }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn WalletProvider>> { self.providers.get(&kind).cloned() }
}
