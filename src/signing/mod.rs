//! Signing pipelines
//!
//! ```text
//! SignPsbtRequest ──▶ validate ──▶ resolve indexes ──▶ provider.sign_psbt ──▶ settle
//!                       │                                                    (finalize/extract)
//!                       └─▶ fails before any provider call
//!
//! (identity, address) ──▶ check ──▶ provider.sign_message(bip322-simple)
//! ```

mod message;
mod psbt;

pub use message::{check_message_request, sign_message};
pub use psbt::{prepare_psbt_options, resolve_signing_indexes, sign_prepared_psbt, sign_psbt, SignPsbtOptions, SignPsbtRequest};
