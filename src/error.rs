//! Error taxonomy shared by every provider adapter.
//!
//! Extensions reject in their own idioms (structured objects with a numeric
//! code, or bare strings). Those shapes are captured as [`ExtensionError`] at
//! the extension boundary and converted into exactly one [`AdapterError`]
//! kind inside the adapter. Nothing above the adapter sees an
//! `ExtensionError`.

use crate::provider::ProviderKind;

/// Reserved rejection code extensions use when the user dismisses a prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Result alias for adapter-facing operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Failure kinds surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("{0}")]
    NotInstalled(String),
    #[error("Request has been cancelled by the user")]
    RequestCancelledByUser,
    #[error("{0}")]
    SigningError(String),
    #[error("Cannot extract transaction from a PSBT that is not finalized")]
    ExtractTxFromNonFinalizedPsbt,
    #[error("{0}")]
    InvalidAddress(String),
    #[error("{0}")]
    Generic(String),
}

impl AdapterError {
    pub fn not_installed(kind: ProviderKind) -> Self {
        Self::NotInstalled(format!("{} not installed", kind.display_name()))
    }

    pub fn invalid_address() -> Self {
        Self::InvalidAddress("Invalid address".into())
    }

    /// Map a rejection raised while requesting or reading accounts.
    ///
    /// Cancellation maps to [`AdapterError::RequestCancelledByUser`]; anything
    /// else keeps the extension's message as a generic failure.
    pub fn from_extension(err: ExtensionError) -> Self {
        if err.is_user_rejection() {
            return Self::RequestCancelledByUser;
        }
        Self::Generic(err.into_message())
    }

    /// Map a rejection raised by a signing call.
    pub fn from_signing(err: ExtensionError, fallback: &str) -> Self {
        if err.is_user_rejection() {
            return Self::RequestCancelledByUser;
        }
        let message = err.into_message();
        if message.trim().is_empty() {
            Self::SigningError(fallback.to_string())
        } else {
            Self::SigningError(format!("{}: {}", fallback, message))
        }
    }

    /// Suggested installation action, only meaningful for `NotInstalled`.
    pub fn install_url(&self, kind: ProviderKind) -> Option<&'static str> {
        match self {
            Self::NotInstalled(_) => Some(kind.install_url()),
            _ => None,
        }
    }
}

/// Raw rejection produced by a wallet extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// Structured rejection object, possibly carrying a numeric code
    Coded { code: Option<i64>, message: String },
    /// Rejection with a bare string instead of an error object
    Plain(String),
}

impl ExtensionError {
    pub fn coded(code: i64, message: impl Into<String>) -> Self {
        Self::Coded { code: Some(code), message: message.into() }
    }

    pub fn user_rejected() -> Self {
        Self::coded(USER_REJECTED_CODE, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Coded { code: Some(USER_REJECTED_CODE), .. })
    }

    pub fn into_message(self) -> String {
        match self {
            Self::Coded { message, .. } => message,
            Self::Plain(message) => message,
        }
    }
}

impl std::fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coded { code: Some(code), message } => write!(f, "[{}] {}", code, message),
            Self::Coded { code: None, message } => write!(f, "{}", message),
            Self::Plain(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ExtensionError {}

/// Result alias for calls across the extension boundary
pub type ExtensionResult<T> = Result<T, ExtensionError>;
