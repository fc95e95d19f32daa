//! PSBT codec and post-signing settlement
//!
//! Wraps `bitcoin::Psbt` for the encodings extensions speak (hex in, hex out)
//! and for the finalize/extract step that follows a successful signature.

use crate::error::{AdapterError, AdapterResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::Psbt;
use serde::{Deserialize, Serialize};

/// Signed output of a PSBT or message signing call.
///
/// For an extracted transaction `base64` is `None`: only PSBTs have a
/// base64 encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedResult {
    pub hex: String,
    pub base64: Option<String>,
}

pub fn to_hex(psbt: &Psbt) -> String { psbt.serialize_hex() }

pub fn to_base64(psbt: &Psbt) -> String { STANDARD.encode(psbt.serialize()) }

pub fn from_hex(psbt_hex: &str) -> AdapterResult<Psbt> {
    let bytes = hex::decode(psbt_hex.trim()).map_err(|e| AdapterError::Generic(format!("Invalid PSBT hex: {}", e)))?;
    Psbt::deserialize(&bytes).map_err(|e| AdapterError::Generic(format!("Invalid PSBT: {}", e)))
}

pub fn from_base64(psbt_base64: &str) -> AdapterResult<Psbt> {
    let bytes = STANDARD.decode(psbt_base64.trim()).map_err(|e| AdapterError::Generic(format!("Invalid PSBT base64: {}", e)))?;
    Psbt::deserialize(&bytes).map_err(|e| AdapterError::Generic(format!("Invalid PSBT: {}", e)))
}

/// True when every input carries a final scriptSig or final witness.
pub fn is_finalized(psbt: &Psbt) -> bool {
    psbt.inputs.iter().all(|input| input.final_script_sig.is_some() || input.final_script_witness.is_some())
}

/// Turn the hex a provider returned into the caller-facing result.
///
/// With `extract_tx` the network transaction is extracted; an input that is
/// still unfinalized fails with `ExtractTxFromNonFinalizedPsbt`, any other
/// extraction failure is generic. Without it the signed PSBT is returned
/// as-is in both encodings.
pub fn settle(signed_hex: &str, extract_tx: bool) -> AdapterResult<SignedResult> {
    let signed = from_hex(signed_hex)?;

    if !extract_tx {
        return Ok(SignedResult { hex: to_hex(&signed), base64: Some(to_base64(&signed)) });
    }

    if !is_finalized(&signed) {
        return Err(AdapterError::ExtractTxFromNonFinalizedPsbt);
    }
    let tx = signed.extract_tx().map_err(|e| {
        tracing::debug!("extract_tx failed: {}", e);
        AdapterError::Generic("Failed to extract transaction from PSBT".into())
    })?;
    Ok(SignedResult { hex: serialize_hex(&tx), base64: None })
}
