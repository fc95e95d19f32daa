//! Connection Orchestrator
//!
//! Owns the connected [`WalletIdentity`] and is the only writer of it.
//!
//! ```text
//!                 connect()
//!  Disconnected ────────────▶ Connecting ──── addresses ────▶ Connected
//!       ▲                      │     │                           │
//!       │   error / no address │     │ timeout: Pending          │
//!       ├──────────────────────┘     │ (settled in background)   │
//!       │                            ▼                           │
//!       │                  late response applied only if         │
//!       │                  its ticket is still current           │
//!       └──────────────── disconnect() / signing error ──────────┘
//! ```
//!
//! Every attempt takes a ticket. `disconnect`, `teardown` and newer attempts
//! advance the ticket, so a response belonging to a superseded attempt is
//! discarded instead of overwriting newer state.

use crate::address::{x_only_key, AddressFormat};
use crate::config::ConnectorConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::network::Network;
use crate::provider::{AccountsListener, ListenerId, ProviderKind, ProviderRegistry, WalletAddress, WalletProvider};
use crate::psbt::SignedResult;
use crate::signing::{self, SignPsbtRequest};
use crate::store::{IdentityStore, MemoryIdentityStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Shown when a provider has not answered within the connect timeout
pub const NO_RESPONSE_ADVISORY: &str = "No wallet pop-up? The extension is not responding. Try reloading your browser.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// The connected wallet. `format` always matches `address` on `network`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletIdentity {
    pub provider: ProviderKind,
    pub address: String,
    pub public_key: String,
    pub format: AddressFormat,
    /// x-only public key, taproot only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_key: Option<String>,
    pub network: Network,
    pub connected_at: DateTime<Utc>,
}

impl WalletIdentity {
    fn new(provider: ProviderKind, network: Network, account: WalletAddress) -> Self {
        let x_key = match account.format {
            AddressFormat::Taproot => x_only_key(&account.public_key),
            _ => None,
        };
        Self {
            provider,
            address: account.address,
            public_key: account.public_key,
            format: account.format,
            x_key,
            network,
            connected_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Read already-authorized accounts without prompting
    pub read_only: bool,
}

impl ConnectOptions {
    pub fn read_only() -> Self { Self { read_only: true } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(WalletIdentity),
    Failed(AdapterError),
    /// Timed out waiting; the advisory notice is set and the response will be
    /// settled in the background
    Pending,
    /// A newer attempt or a disconnect superseded this one
    Abandoned,
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool { matches!(self, ConnectOutcome::Connected(_)) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing stored, or the stored provider cannot reconnect silently
    Skipped,
    /// The extension never signalled readiness
    NotReady,
    Attempted(ConnectOutcome),
}

/// User-facing failure message with an optional install action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionNotice {
    pub message: String,
    pub install_url: Option<&'static str>,
}

struct Subscription {
    kind: ProviderKind,
    id: ListenerId,
    provider: Arc<dyn WalletProvider>,
    task: JoinHandle<()>,
}

impl Subscription {
    fn release(self) {
        self.provider.unsubscribe_accounts(self.id);
        self.task.abort();
        tracing::debug!("unsubscribed from {} account changes", self.kind);
    }
}

struct Inner {
    state: ConnectionState,
    identity: Option<WalletIdentity>,
    notice: Option<ConnectionNotice>,
    ticket: u64,
    subscription: Option<Subscription>,
}

struct Shared {
    registry: ProviderRegistry,
    config: ConnectorConfig,
    store: Arc<dyn IdentityStore>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> { self.inner.lock().unwrap_or_else(|p| p.into_inner()) }

    fn persist(&self, identity: Option<&WalletIdentity>) {
        let result = match identity {
            Some(identity) => self.store.save(identity),
            None => self.store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("identity store: {}", e);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(subscription) = inner.subscription.take() {
            subscription.release();
        }
    }
}

/// Drives connect, signing and disconnect against the registered providers.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct WalletConnector {
    shared: Arc<Shared>,
}

impl WalletConnector {
    pub fn new(registry: ProviderRegistry, config: ConnectorConfig) -> Self {
        Self::with_store(registry, config, Arc::new(MemoryIdentityStore::new()))
    }

    pub fn with_store(registry: ProviderRegistry, config: ConnectorConfig, store: Arc<dyn IdentityStore>) -> Self {
        let inner = Inner { state: ConnectionState::Disconnected, identity: None, notice: None, ticket: 0, subscription: None };
        Self { shared: Arc::new(Shared { registry, config, store, inner: Mutex::new(inner) }) }
    }

    pub fn config(&self) -> &ConnectorConfig { &self.shared.config }
    pub fn state(&self) -> ConnectionState { self.shared.lock().state }
    pub fn identity(&self) -> Option<WalletIdentity> { self.shared.lock().identity.clone() }
    pub fn last_error(&self) -> Option<ConnectionNotice> { self.shared.lock().notice.clone() }
    pub fn error_message(&self) -> Option<String> { self.shared.lock().notice.as_ref().map(|n| n.message.clone()) }
    pub fn is_subscribed(&self) -> bool { self.shared.lock().subscription.is_some() }

    /// Request addresses from `kind` and store the first as the identity.
    ///
    /// Returns `Pending` when the provider does not answer within the
    /// connect timeout. The call is not cancelled: a spawned task settles its
    /// response unless a disconnect or newer attempt has superseded it, so
    /// settlement does not depend on this future being polled to completion.
    pub async fn connect(&self, kind: ProviderKind, options: ConnectOptions) -> ConnectOutcome {
        let Some(provider) = self.shared.registry.get(kind) else {
            let ticket = self.begin_attempt(kind);
            return self.settle(ticket, kind, None, Err(AdapterError::Generic(format!("{} is not available", kind))));
        };
        let ticket = self.begin_attempt(kind);
        let network = self.shared.config.network;
        let read_only = options.read_only && provider.supports_read_only();
        tracing::info!("connecting to {} on {} (read_only={})", kind, network, read_only);

        let (tx, rx) = oneshot::channel();
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let result = provider.get_addresses(network, read_only).await;
            let Some(shared) = weak.upgrade() else {
                tracing::debug!("{} answered after the connector was dropped", kind);
                return;
            };
            let outcome = WalletConnector { shared }.settle(ticket, kind, Some(provider), result);
            if tx.send(outcome).is_err() {
                tracing::debug!("{} response settled after the caller stopped waiting", kind);
            }
        });

        let timeout = self.shared.config.connect_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => self.settle(ticket, kind, None, Err(AdapterError::Generic(format!("{} connect task failed", kind)))),
            Err(_) => {
                tracing::warn!("{} did not answer within {:?}", kind, timeout);
                let mut inner = self.shared.lock();
                if inner.ticket == ticket && inner.state == ConnectionState::Connecting {
                    inner.notice = Some(ConnectionNotice { message: NO_RESPONSE_ADVISORY.into(), install_url: None });
                }
                ConnectOutcome::Pending
            }
        }
    }

    /// Silently reconnect the stored identity after the extension reports
    /// ready. Bounded by the readiness timeout.
    pub async fn restore(&self) -> RestoreOutcome {
        let stored = match self.shared.store.load() {
            Ok(Some(identity)) => identity,
            Ok(None) => return RestoreOutcome::Skipped,
            Err(e) => {
                tracing::warn!("identity store: {}", e);
                return RestoreOutcome::Skipped;
            }
        };
        let config = &self.shared.config;
        if stored.network != config.network {
            tracing::info!("discarding stored {} identity for {}", stored.network, config.network);
            self.shared.persist(None);
            return RestoreOutcome::Skipped;
        }
        let Some(provider) = self.shared.registry.get(stored.provider) else {
            return RestoreOutcome::Skipped;
        };
        if !provider.supports_read_only() {
            return RestoreOutcome::Skipped;
        }
        if !provider.wait_until_ready(config.readiness_timeout, config.readiness_poll_interval).await {
            tracing::debug!("{} not ready after {:?}", stored.provider, config.readiness_timeout);
            self.disconnect();
            return RestoreOutcome::NotReady;
        }
        RestoreOutcome::Attempted(self.connect(stored.provider, ConnectOptions::read_only()).await)
    }

    /// Clear the identity and drop the live-update subscription. Idempotent.
    pub fn disconnect(&self) {
        let subscription = {
            let mut inner = self.shared.lock();
            inner.ticket += 1;
            inner.identity = None;
            inner.notice = None;
            inner.state = ConnectionState::Disconnected;
            inner.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.release();
        }
        self.shared.persist(None);
        tracing::info!("disconnected");
    }

    /// Stop reacting to the extension: drop the subscription and abandon any
    /// in-flight attempt. The stored identity is kept for the next restore.
    pub fn teardown(&self) {
        let subscription = {
            let mut inner = self.shared.lock();
            inner.ticket += 1;
            if inner.state == ConnectionState::Connecting {
                inner.state = if inner.identity.is_some() { ConnectionState::Connected } else { ConnectionState::Disconnected };
            }
            inner.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.release();
        }
    }

    pub async fn sign_psbt(&self, request: &SignPsbtRequest) -> AdapterResult<SignedResult> {
        let identity = self.identity().ok_or_else(|| AdapterError::Generic("No wallet is connected".into()))?;
        if request.network != identity.network {
            return Err(AdapterError::Generic(format!(
                "Network mismatch: connected on {} but request targets {}",
                identity.network, request.network
            )));
        }
        if request.provider != identity.provider {
            return Err(AdapterError::Generic(format!("{} is not the connected wallet", request.provider)));
        }
        let provider = self.provider(identity.provider)?;
        let options = signing::prepare_psbt_options(request)?;

        signing::sign_prepared_psbt(provider.as_ref(), request, &options)
            .await
            .map_err(|e| self.fail_after_signing(identity.provider, e))
    }

    /// Sign with BIP322-simple. Returns the base64 signature.
    pub async fn sign_message(&self, address: &str, message: &str) -> AdapterResult<Option<String>> {
        let identity = self.identity();
        let identity = signing::check_message_request(identity.as_ref(), address)?;
        let provider = self.provider(identity.provider)?;

        match signing::sign_message(provider.as_ref(), identity, message).await {
            Ok(signed) => Ok(signed.base64),
            Err(e) => Err(self.fail_after_signing(identity.provider, e)),
        }
    }

    fn provider(&self, kind: ProviderKind) -> AdapterResult<Arc<dyn WalletProvider>> {
        self.shared.registry.get(kind).ok_or_else(|| AdapterError::Generic(format!("{} is not available", kind)))
    }

    fn begin_attempt(&self, kind: ProviderKind) -> u64 {
        let (ticket, switched) = {
            let mut inner = self.shared.lock();
            inner.ticket += 1;
            inner.state = ConnectionState::Connecting;
            inner.notice = None;
            let switched = match &inner.subscription {
                Some(sub) if sub.kind != kind => inner.subscription.take(),
                _ => None,
            };
            (inner.ticket, switched)
        };
        if let Some(subscription) = switched {
            subscription.release();
        }
        ticket
    }

    fn settle(
        &self,
        ticket: u64,
        kind: ProviderKind,
        provider: Option<Arc<dyn WalletProvider>>,
        result: AdapterResult<Vec<WalletAddress>>,
    ) -> ConnectOutcome {
        let network = self.shared.config.network;
        let mut inner = self.shared.lock();
        if inner.ticket != ticket {
            tracing::info!("discarding superseded {} response", kind);
            return ConnectOutcome::Abandoned;
        }

        let account = match result {
            Ok(addresses) => addresses.into_iter().next().ok_or_else(|| {
                AdapterError::Generic(format!("{} returned no addresses.", kind.display_name()))
            }),
            Err(e) => Err(e),
        };

        match account {
            Ok(account) => {
                let identity = WalletIdentity::new(kind, network, account);
                tracing::info!("connected to {} as {} ({})", kind, identity.address, identity.format);
                inner.identity = Some(identity.clone());
                inner.state = ConnectionState::Connected;
                inner.notice = None;
                if let Some(provider) = provider.filter(|p| p.supports_live_updates()) {
                    self.ensure_subscribed(&mut inner, kind, provider);
                }
                drop(inner);
                self.shared.persist(Some(&identity));
                ConnectOutcome::Connected(identity)
            }
            Err(e) => {
                tracing::warn!("connect to {} failed: {}", kind, e);
                let subscription = Self::reset(&mut inner, kind, &e);
                drop(inner);
                if let Some(subscription) = subscription {
                    subscription.release();
                }
                self.shared.persist(None);
                ConnectOutcome::Failed(e)
            }
        }
    }

    fn fail_after_signing(&self, kind: ProviderKind, err: AdapterError) -> AdapterError {
        tracing::warn!("{} signing failed: {}", kind, err);
        let subscription = {
            let mut inner = self.shared.lock();
            inner.ticket += 1;
            Self::reset(&mut inner, kind, &err)
        };
        if let Some(subscription) = subscription {
            subscription.release();
        }
        self.shared.persist(None);
        err
    }

    fn reset(inner: &mut Inner, kind: ProviderKind, err: &AdapterError) -> Option<Subscription> {
        inner.identity = None;
        inner.state = ConnectionState::Disconnected;
        inner.notice = Some(ConnectionNotice { message: err.to_string(), install_url: err.install_url(kind) });
        inner.subscription.take()
    }

    /// One subscription per connector. An existing subscription for the same
    /// provider is kept.
    fn ensure_subscribed(&self, inner: &mut Inner, kind: ProviderKind, provider: Arc<dyn WalletProvider>) {
        if inner.subscription.is_some() {
            return;
        }
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<String>>();
        let listener: AccountsListener = Arc::new(move |accounts: Vec<String>| {
            let _ = tx.send(accounts);
        });
        let Some(id) = provider.subscribe_accounts(listener) else {
            return;
        };

        let weak = Arc::downgrade(&self.shared);
        let task = tokio::spawn(async move {
            while let Some(accounts) = rx.recv().await {
                let Some(shared) = weak.upgrade() else { break };
                tracing::info!("{} accounts changed ({} reported), reconnecting", kind, accounts.len());
                WalletConnector { shared }.connect(kind, ConnectOptions::default()).await;
            }
        });
        tracing::debug!("subscribed to {} account changes", kind);
        inner.subscription = Some(Subscription { kind, id, provider, task });
    }
}
