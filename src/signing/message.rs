//! Message Signing Pipeline. Always BIP322-simple.

use crate::connector::WalletIdentity;
use crate::error::{AdapterError, AdapterResult};
use crate::provider::{MessageScheme, WalletProvider};
use crate::psbt::SignedResult;

/// A message can only be signed by the connected identity's own address.
pub fn check_message_request<'a>(identity: Option<&'a WalletIdentity>, address: &str) -> AdapterResult<&'a WalletIdentity> {
    let identity = identity.ok_or_else(|| AdapterError::Generic("No wallet is connected".into()))?;
    if identity.address != address {
        return Err(AdapterError::InvalidAddress("Address supplied is not connected address".into()));
    }
    Ok(identity)
}

pub async fn sign_message(provider: &dyn WalletProvider, identity: &WalletIdentity, message: &str) -> AdapterResult<SignedResult> {
    if provider.kind() != identity.provider {
        return Err(AdapterError::Generic(format!("Connected to {} but {} was supplied", identity.provider, provider.kind())));
    }
    tracing::debug!("signing message with {}", identity.provider);
    provider.sign_message(message, MessageScheme::Bip322Simple, identity.network).await
}
