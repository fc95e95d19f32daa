//! ord-connect: one contract over several Bitcoin browser wallets.
//!
//! # Architecture
//!
//! ```text
//! WalletConnector (entry point, owns WalletIdentity)
//!   │
//!   ├── ProviderRegistry
//!   │     ├── Unisat → UnisatProvider(Arc<dyn UnisatApi>)
//!   │     ├── Wizz   → WizzProvider(Arc<dyn WizzApi>)
//!   │     └── Okx    → OkxProvider(Arc<dyn OkxApi>)
//!   │           └── address::resolve_format on every returned account
//!   │
//!   ├── signing (PSBT + BIP322-simple message pipelines)
//!   │     └── psbt::settle (finalize check, extract)
//!   │
//!   └── IdentityStore (memory / JSON file, read on restore)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | connect | `connector.connect(kind, opts)` | Request accounts, race the timeout |
//! | restore | `connector.restore()` | Read-only reconnect of the stored identity |
//! | sign psbt | `connector.sign_psbt(&request)` | Validate, delegate, finalize/extract |
//! | sign message | `connector.sign_message(addr, msg)` | BIP322-simple signature (base64) |
//! | disconnect | `connector.disconnect()` | Clear identity, unsubscribe |
//!
//! # Features
//!
//! - `native` - file-backed store location and `tracing-subscriber` logging
//!
//! # Usage
//!
//! ```ignore
//! use ord_connect::{ConnectOptions, ConnectorConfig, ProviderKind, ProviderRegistry, WalletConnector};
//!
//! let registry = ProviderRegistry::new().with_unisat(unisat_api).with_okx(okx_api);
//! let connector = WalletConnector::new(registry, ConnectorConfig::mainnet());
//!
//! if connector.connect(ProviderKind::Unisat, ConnectOptions::default()).await.is_connected() {
//!     let identity = connector.identity().unwrap();
//!     let sig = connector.sign_message(&identity.address, "hello").await?;
//! }
//! ```

pub mod address;
pub mod config;
pub mod connector;
pub mod error;
pub mod network;
pub mod provider;
pub mod psbt;
pub mod signing;
pub mod store;

#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================
pub use address::{resolve_format, AddressFormat};
pub use config::ConnectorConfig;
pub use connector::{
    ConnectOptions, ConnectOutcome, ConnectionNotice, ConnectionState, RestoreOutcome, WalletConnector, WalletIdentity,
    NO_RESPONSE_ADVISORY,
};
pub use error::{AdapterError, AdapterResult, ExtensionError, ExtensionResult, USER_REJECTED_CODE};
pub use network::Network;
pub use provider::{
    AccountsListener, ListenerId, MessageScheme, NativeSignOptions, OkxAccount, OkxApi, OkxProvider, ProviderKind,
    ProviderRegistry, PsbtSignOptions, ToSignInput, UnisatApi, UnisatProvider, WalletAddress, WalletProvider, WizzApi,
    WizzProvider,
};
pub use psbt::SignedResult;
pub use signing::{SignPsbtOptions, SignPsbtRequest};
pub use store::{FileIdentityStore, IdentityStore, MemoryIdentityStore, StoreError};

#[cfg(feature = "native")]
pub use logging::{init_logging, init_logging_with, LogFormat};
