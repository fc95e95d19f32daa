//! PSBT Signing Pipeline

use crate::error::{AdapterError, AdapterResult};
use crate::network::Network;
use crate::provider::{ProviderKind, PsbtSignOptions, WalletProvider};
use crate::psbt::SignedResult;
use bitcoin::Psbt;

/// Caller-facing signing options. `finalize` and `extract_tx` default to true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignPsbtOptions {
    pub finalize: bool,
    pub extract_tx: bool,
    /// Inputs to sign; all inputs when `None`
    pub signing_indexes: Option<Vec<usize>>,
    pub sighash: Option<u32>,
}

impl Default for SignPsbtOptions {
    fn default() -> Self { Self { finalize: true, extract_tx: true, signing_indexes: None, sighash: None } }
}

impl SignPsbtOptions {
    pub fn with_finalize(mut self, finalize: bool) -> Self { self.finalize = finalize; self }
    pub fn with_extract_tx(mut self, extract_tx: bool) -> Self { self.extract_tx = extract_tx; self }
    pub fn with_signing_indexes(mut self, indexes: Vec<usize>) -> Self { self.signing_indexes = Some(indexes); self }
    pub fn with_sighash(mut self, sighash: u32) -> Self { self.sighash = Some(sighash); self }
}

#[derive(Debug, Clone)]
pub struct SignPsbtRequest {
    pub address: String,
    pub provider: ProviderKind,
    pub network: Network,
    pub psbt: Psbt,
    pub options: SignPsbtOptions,
}

impl SignPsbtRequest {
    pub fn new(address: impl Into<String>, provider: ProviderKind, network: Network, psbt: Psbt) -> Self {
        Self { address: address.into(), provider, network, psbt, options: SignPsbtOptions::default() }
    }
    pub fn with_options(mut self, options: SignPsbtOptions) -> Self { self.options = options; self }
}

/// Explicit indexes must address existing inputs; absent means every input.
pub fn resolve_signing_indexes(psbt: &Psbt, requested: Option<&[usize]>) -> AdapterResult<Vec<usize>> {
    let count = psbt.inputs.len();
    match requested {
        None => Ok((0..count).collect()),
        Some(indexes) => {
            if let Some(bad) = indexes.iter().find(|&&i| i >= count) {
                return Err(AdapterError::Generic(format!("Signing index {} out of range for PSBT with {} inputs", bad, count)));
            }
            Ok(indexes.to_vec())
        }
    }
}

/// Validate a request and resolve it into provider options. Every failure
/// here happens before the provider is contacted.
pub fn prepare_psbt_options(request: &SignPsbtRequest) -> AdapterResult<PsbtSignOptions> {
    let opts = &request.options;
    let options = PsbtSignOptions {
        finalize: opts.finalize,
        extract_tx: opts.extract_tx,
        network: request.network,
        address: request.address.clone(),
        signing_indexes: Vec::new(),
        sighash: opts.sighash,
    };
    options.validate()?;
    let signing_indexes = resolve_signing_indexes(&request.psbt, opts.signing_indexes.as_deref())?;
    Ok(PsbtSignOptions { signing_indexes, ..options })
}

pub async fn sign_psbt(provider: &dyn WalletProvider, request: &SignPsbtRequest) -> AdapterResult<SignedResult> {
    let options = prepare_psbt_options(request)?;
    sign_prepared_psbt(provider, request, &options).await
}

/// Delegate an already prepared request. `options` must come from
/// [`prepare_psbt_options`] for the same request.
pub async fn sign_prepared_psbt(
    provider: &dyn WalletProvider,
    request: &SignPsbtRequest,
    options: &PsbtSignOptions,
) -> AdapterResult<SignedResult> {
    if provider.kind() != request.provider {
        return Err(AdapterError::Generic(format!("Request targets {} but {} was supplied", request.provider, provider.kind())));
    }
    tracing::debug!("signing psbt with {} ({} inputs)", request.provider, options.signing_indexes.len());
    provider.sign_psbt(&request.psbt, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psbt::fixtures;

    fn request(options: SignPsbtOptions) -> SignPsbtRequest {
        SignPsbtRequest::new("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", ProviderKind::Okx, Network::Mainnet, fixtures::unsigned(3))
            .with_options(options)
    }

    #[test]
    fn test_defaults() {
        let options = SignPsbtOptions::default();
        assert!(options.finalize && options.extract_tx);
        assert_eq!(options.signing_indexes, None);
    }

    #[test]
    fn test_indexes_default_to_all_inputs() {
        let prepared = prepare_psbt_options(&request(SignPsbtOptions::default())).unwrap();
        assert_eq!(prepared.signing_indexes, vec![0, 1, 2]);
        assert_eq!(prepared.address, "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq");
    }

    #[test]
    fn test_explicit_indexes_kept() {
        let prepared = prepare_psbt_options(&request(SignPsbtOptions::default().with_signing_indexes(vec![2]))).unwrap();
        assert_eq!(prepared.signing_indexes, vec![2]);
    }

    #[test]
    fn test_out_of_range_index() {
        let err = prepare_psbt_options(&request(SignPsbtOptions::default().with_signing_indexes(vec![0, 3]))).unwrap_err();
        assert!(matches!(err, AdapterError::Generic(ref m) if m.contains("out of range")));
    }

    #[test]
    fn test_illegal_combination_checked_first() {
        let options = SignPsbtOptions::default().with_finalize(false).with_signing_indexes(vec![9]);
        assert_eq!(prepare_psbt_options(&request(options)), Err(AdapterError::ExtractTxFromNonFinalizedPsbt));
    }
}
