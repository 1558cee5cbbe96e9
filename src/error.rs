//! Unified error types for the Cardano signer
//!
//! Every failure in the signing pipeline surfaces as a [`SignerError`]
//! carrying a machine-readable [`ErrorCode`] and a human-readable message.
//! Nothing is retried or swallowed: a sign call either succeeds or fails
//! with exactly one error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all signer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl SignerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// True when this error belongs to `kind`, counting sub-kinds
    /// (`UnexpectedPrefix` is an `InvalidEncoding`, for instance).
    pub fn is(&self, kind: ErrorCode) -> bool {
        self.code == kind || self.code.family() == kind
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMnemonic, msg)
    }

    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidEncoding, msg)
    }

    pub fn unexpected_prefix(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnexpectedPrefix, msg)
    }

    pub fn invalid_key_length(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidKeyLength, msg)
    }

    pub fn derivation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DerivationError, msg)
    }

    pub fn derivation_overflow(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DerivationOverflow, msg)
    }

    pub fn malformed_transaction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedTransaction, msg)
    }

    pub fn signing_failure(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailure, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SignerError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Boundary errors
    InvalidInput,

    // Key material errors
    InvalidMnemonic,
    InvalidEncoding,
    UnexpectedPrefix,
    InvalidKeyLength,

    // Derivation errors
    DerivationError,
    DerivationOverflow,

    // Transaction errors
    MalformedTransaction,
    SigningFailure,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Collapse sub-kinds onto the kind callers match on.
    pub fn family(self) -> ErrorCode {
        match self {
            ErrorCode::UnexpectedPrefix => ErrorCode::InvalidEncoding,
            ErrorCode::DerivationOverflow => ErrorCode::DerivationError,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::InvalidMnemonic => "invalid_mnemonic",
            ErrorCode::InvalidEncoding => "invalid_encoding",
            ErrorCode::UnexpectedPrefix => "unexpected_prefix",
            ErrorCode::InvalidKeyLength => "invalid_key_length",
            ErrorCode::DerivationError => "derivation_error",
            ErrorCode::DerivationOverflow => "derivation_overflow",
            ErrorCode::MalformedTransaction => "malformed_transaction",
            ErrorCode::SigningFailure => "signing_failure",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for signer operations
pub type SignerResult<T> = Result<T, SignerError>;

// Conversions from common error types

impl From<serde_json::Error> for SignerError {
    fn from(e: serde_json::Error) -> Self {
        SignerError::new(ErrorCode::InvalidInput, format!("JSON error: {}", e))
    }
}

impl From<hex::FromHexError> for SignerError {
    fn from(e: hex::FromHexError) -> Self {
        SignerError::new(ErrorCode::InvalidInput, format!("Hex error: {}", e))
    }
}

impl From<std::io::Error> for SignerError {
    fn from(e: std::io::Error) -> Self {
        SignerError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<bip39::Error> for SignerError {
    fn from(e: bip39::Error) -> Self {
        SignerError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<bech32::Error> for SignerError {
    fn from(e: bech32::Error) -> Self {
        SignerError::new(ErrorCode::InvalidEncoding, format!("Bech32 error: {}", e))
    }
}

impl From<minicbor::decode::Error> for SignerError {
    fn from(e: minicbor::decode::Error) -> Self {
        SignerError::new(ErrorCode::MalformedTransaction, format!("CBOR error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = SignerError::malformed_transaction("Truncated transaction")
            .with_details("expected 4 items, found 2");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("malformed_transaction"));
        assert!(json.contains("Truncated transaction"));
    }

    #[test]
    fn test_display_includes_code_and_details() {
        let err = SignerError::invalid_key_length("Raw key must be 32 bytes").with_details("got 31");
        assert_eq!(
            err.to_string(),
            "[invalid_key_length] Raw key must be 32 bytes (got 31)"
        );
    }

    #[test]
    fn test_sub_kinds_collapse_onto_family() {
        let err = SignerError::unexpected_prefix("expected xprv");
        assert!(err.is(ErrorCode::InvalidEncoding));
        assert!(err.is(ErrorCode::UnexpectedPrefix));
        assert!(!err.is(ErrorCode::InvalidKeyLength));

        let err = SignerError::derivation_overflow("kL overflowed");
        assert!(err.is(ErrorCode::DerivationError));
        assert_eq!(ErrorCode::InvalidMnemonic.family(), ErrorCode::InvalidMnemonic);
    }

    #[test]
    fn test_bip39_error_maps_to_invalid_mnemonic() {
        let err: SignerError = bip39::Error::BadWordCount(2).into();
        assert_eq!(err.code, ErrorCode::InvalidMnemonic);
    }

    #[test]
    fn test_serde_code_names_match_display() {
        let json = serde_json::to_string(&ErrorCode::DerivationOverflow).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorCode::DerivationOverflow));
    }
}
