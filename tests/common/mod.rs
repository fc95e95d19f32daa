//! In-memory wallet extension shared by the integration tests.
//!
//! One `FakeWallet` implements the UniSat, Wizz and OKX extension traits so
//! the same knobs drive every provider.

#![allow(dead_code)]

use async_trait::async_trait;
use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Psbt, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use ord_connect::{
    AccountsListener, ConnectorConfig, ExtensionError, ExtensionResult, ListenerId, NativeSignOptions, OkxAccount, OkxApi,
    ProviderRegistry, UnisatApi, WizzApi,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TAPROOT: &str = "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8ztwac72sfr9rusxg3297";
pub const SEGWIT: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";
pub const TESTNET_SEGWIT: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
pub const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
pub const X_KEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
/// base64 of 0xdeadbeef
pub const SIGNATURE: &str = "3q2+7w==";

#[derive(Debug, Clone)]
pub enum SignBehavior {
    /// Return the PSBT unchanged
    Echo,
    /// Attach a final witness to every input
    Finalize,
    Reject(ExtensionError),
    Empty,
}

pub struct FakeWallet {
    installed: AtomicBool,
    ready: AtomicBool,
    network: Mutex<String>,
    accounts: Mutex<Vec<String>>,
    public_key: Mutex<String>,
    access_error: Mutex<Option<ExtensionError>>,
    delay: Mutex<Duration>,
    sign: Mutex<SignBehavior>,
    message: Mutex<ExtensionResult<String>>,
    calls: Mutex<Vec<String>>,
    last_sign_options: Mutex<Option<NativeSignOptions>>,
    listeners: Mutex<HashMap<u64, AccountsListener>>,
    next_listener: AtomicU64,
}

impl FakeWallet {
    pub fn new(network: &str, accounts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            installed: AtomicBool::new(true),
            ready: AtomicBool::new(true),
            network: Mutex::new(network.to_string()),
            accounts: Mutex::new(accounts.iter().map(|a| a.to_string()).collect()),
            public_key: Mutex::new(PUBKEY.to_string()),
            access_error: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            sign: Mutex::new(SignBehavior::Echo),
            message: Mutex::new(Ok(SIGNATURE.to_string())),
            calls: Mutex::new(Vec::new()),
            last_sign_options: Mutex::new(None),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        })
    }

    pub fn livenet(accounts: &[&str]) -> Arc<Self> { Self::new("livenet", accounts) }

    pub fn set_installed(&self, installed: bool) { self.installed.store(installed, Ordering::SeqCst); }
    pub fn set_ready(&self, ready: bool) { self.ready.store(ready, Ordering::SeqCst); }
    pub fn set_accounts(&self, accounts: &[&str]) { *self.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect(); }
    pub fn set_access_error(&self, err: Option<ExtensionError>) { *self.access_error.lock().unwrap() = err; }
    pub fn set_delay(&self, delay: Duration) { *self.delay.lock().unwrap() = delay; }
    pub fn set_sign(&self, behavior: SignBehavior) { *self.sign.lock().unwrap() = behavior; }
    pub fn set_message(&self, result: ExtensionResult<String>) { *self.message.lock().unwrap() = result; }

    pub fn network(&self) -> String { self.network.lock().unwrap().clone() }
    pub fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
    pub fn called(&self, name: &str) -> bool { self.calls().iter().any(|c| c == name) }
    pub fn last_sign_options(&self) -> Option<NativeSignOptions> { self.last_sign_options.lock().unwrap().clone() }
    pub fn listener_count(&self) -> usize { self.listeners.lock().unwrap().len() }

    /// Fire `accountsChanged` with the current accounts
    pub fn emit_accounts_changed(&self) {
        let accounts = self.accounts.lock().unwrap().clone();
        let listeners: Vec<AccountsListener> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(accounts.clone());
        }
    }

    fn record(&self, call: impl Into<String>) { self.calls.lock().unwrap().push(call.into()); }

    async fn accounts(&self, call: &str) -> ExtensionResult<Vec<String>> {
        self.record(call);
        let accounts = self.accounts.lock().unwrap().clone();
        let error = self.access_error.lock().unwrap().clone();
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match error {
            Some(err) => Err(err),
            None => Ok(accounts),
        }
    }

    fn sign(&self, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String> {
        self.record("sign_psbt");
        *self.last_sign_options.lock().unwrap() = Some(options.clone());
        match self.sign.lock().unwrap().clone() {
            SignBehavior::Echo => Ok(psbt_hex.to_string()),
            SignBehavior::Finalize => {
                let mut psbt = Psbt::deserialize(&hex::decode(psbt_hex).unwrap()).unwrap();
                for input in psbt.inputs.iter_mut() {
                    input.final_script_witness = Some(Witness::from_slice(&[vec![0x30; 71], vec![0x02; 33]]));
                }
                Ok(psbt.serialize_hex())
            }
            SignBehavior::Reject(err) => Err(err),
            SignBehavior::Empty => Ok(String::new()),
        }
    }

    fn sign_text(&self, scheme: &str) -> ExtensionResult<String> {
        self.record(format!("sign_message:{}", scheme));
        self.message.lock().unwrap().clone()
    }
}

#[async_trait]
impl UnisatApi for FakeWallet {
    fn is_installed(&self) -> bool { self.installed.load(Ordering::SeqCst) }
    fn is_ready(&self) -> bool { self.ready.load(Ordering::SeqCst) }
    async fn get_network(&self) -> ExtensionResult<String> { Ok(self.network()) }
    async fn switch_network(&self, network: &str) -> ExtensionResult<()> {
        self.record(format!("switch_network:{}", network));
        *self.network.lock().unwrap() = network.to_string();
        Ok(())
    }
    async fn request_accounts(&self) -> ExtensionResult<Vec<String>> { self.accounts("request_accounts").await }
    async fn get_accounts(&self) -> ExtensionResult<Vec<String>> { self.accounts("get_accounts").await }
    async fn get_public_key(&self) -> ExtensionResult<String> { Ok(self.public_key.lock().unwrap().clone()) }
    async fn sign_psbt(&self, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String> { self.sign(psbt_hex, options) }
    async fn sign_message(&self, _message: &str, scheme: &str) -> ExtensionResult<String> { self.sign_text(scheme) }
    fn add_listener(&self, _event: &str, listener: AccountsListener) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().insert(id, listener);
        ListenerId(id)
    }
    fn remove_listener(&self, _event: &str, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id.0);
    }
}

#[async_trait]
impl WizzApi for FakeWallet {
    fn is_installed(&self) -> bool { self.installed.load(Ordering::SeqCst) }
    async fn get_network(&self) -> ExtensionResult<String> { Ok(self.network()) }
    async fn switch_network(&self, network: &str) -> ExtensionResult<String> {
        self.record(format!("switch_network:{}", network));
        *self.network.lock().unwrap() = network.to_string();
        Ok(network.to_string())
    }
    async fn request_accounts(&self) -> ExtensionResult<Vec<String>> { self.accounts("request_accounts").await }
    async fn get_accounts(&self) -> ExtensionResult<Vec<String>> { self.accounts("get_accounts").await }
    async fn get_public_key(&self) -> ExtensionResult<String> { Ok(self.public_key.lock().unwrap().clone()) }
    async fn sign_psbt(&self, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String> { self.sign(psbt_hex, options) }
    async fn sign_message(&self, _message: &str, scheme: &str) -> ExtensionResult<String> { self.sign_text(scheme) }
}

#[async_trait]
impl OkxApi for FakeWallet {
    fn is_installed(&self) -> bool { self.installed.load(Ordering::SeqCst) }
    async fn connect(&self, network: &str) -> ExtensionResult<Option<OkxAccount>> {
        let accounts = self.accounts(&format!("connect:{}", network)).await?;
        let public_key = self.public_key.lock().unwrap().clone();
        Ok(accounts.into_iter().next().map(|address| OkxAccount { address, public_key }))
    }
    async fn sign_psbt(&self, network: &str, psbt_hex: &str, options: &NativeSignOptions) -> ExtensionResult<String> {
        self.record(format!("sign_psbt:{}", network));
        self.sign(psbt_hex, options)
    }
    async fn sign_message(&self, network: &str, _message: &str, scheme: &str) -> ExtensionResult<String> {
        self.record(format!("sign_message:{}", network));
        self.sign_text(scheme)
    }
}

/// Every provider backed by its own fake
pub struct Wallets {
    pub unisat: Arc<FakeWallet>,
    pub wizz: Arc<FakeWallet>,
    pub okx: Arc<FakeWallet>,
}

impl Wallets {
    pub fn livenet(accounts: &[&str]) -> Self {
        Self { unisat: FakeWallet::livenet(accounts), wizz: FakeWallet::livenet(accounts), okx: FakeWallet::livenet(accounts) }
    }

    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::new()
            .with_unisat(self.unisat.clone())
            .with_wizz(self.wizz.clone())
            .with_okx(self.okx.clone())
    }

    pub fn get(&self, kind: ord_connect::ProviderKind) -> &Arc<FakeWallet> {
        match kind {
            ord_connect::ProviderKind::Unisat => &self.unisat,
            ord_connect::ProviderKind::Wizz => &self.wizz,
            ord_connect::ProviderKind::Okx => &self.okx,
        }
    }
}

pub fn config() -> ConnectorConfig {
    ConnectorConfig::mainnet()
}

/// Unsigned PSBT spending `inputs` segwit outputs of 10_000 sat each
pub fn unsigned_psbt(inputs: usize) -> Psbt {
    let script = ScriptBuf::from_hex("00140000000000000000000000000000000000000000").unwrap();
    let txid = Txid::from_str("f61b1742ca13176464adb3cb66050c00787bb3a4eead37e985f2df1e37718126").unwrap();
    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: (0..inputs)
            .map(|vout| TxIn {
                previous_output: OutPoint { txid, vout: vout as u32 },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::new(),
            })
            .collect(),
        output: vec![TxOut { value: Amount::from_sat(9_000 * inputs as u64), script_pubkey: script.clone() }],
    };
    let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
    for input in psbt.inputs.iter_mut() {
        input.witness_utxo = Some(TxOut { value: Amount::from_sat(10_000), script_pubkey: script.clone() });
    }
    psbt
}
