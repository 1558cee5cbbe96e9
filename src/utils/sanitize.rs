//! Input Sanitization
//!
//! Normalizes text crossing the library boundary before it reaches the
//! decoders:
//! - Hex payloads (transactions, raw keys)
//! - Mnemonic phrases (Unicode normalization, whitespace)
//! - Bech32 strings and path strings (length limits)

use crate::error::{ErrorCode, SignerError, SignerResult};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

/// Maximum length for various input types
pub mod limits {
    /// Maximum mnemonic length (24 words + spaces, after normalization)
    pub const MAX_MNEMONIC_LENGTH: usize = 512;
    /// Maximum bech32 key string length (root_xsk is 165 characters)
    pub const MAX_BECH32_LENGTH: usize = 256;
    /// Maximum derivation path string length
    pub const MAX_PATH_LENGTH: usize = 256;
    /// Maximum size of a key file (text envelope JSON)
    pub const MAX_KEY_FILE_SIZE: usize = 4096;
}

/// Decode a hex string after trimming whitespace and an optional `0x`.
///
/// `what` names the payload in error messages. Syntax failures carry
/// `code` so callers decide which kind a bad payload is; exceeding
/// `max_bytes` is always `InvalidInput`.
pub fn decode_hex(input: &str, what: &str, code: ErrorCode, max_bytes: usize) -> SignerResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(SignerError::new(code, format!("{} is empty", what)));
    }

    if trimmed.len() / 2 > max_bytes {
        return Err(SignerError::invalid_input(format!(
            "{} exceeds {} bytes",
            what, max_bytes
        ))
        .with_details(format!("got {} hex characters", trimmed.len())));
    }

    if let Some(pos) = trimmed.find(|c: char| !c.is_ascii_hexdigit()) {
        return Err(SignerError::new(
            code,
            format!("{} is not valid hex", what),
        )
        .with_details(format!("invalid character at position {}", pos)));
    }

    if trimmed.len() % 2 != 0 {
        return Err(SignerError::new(
            code,
            format!("{} has an odd number of hex digits", what),
        ));
    }

    hex::decode(trimmed).map_err(|e| SignerError::new(code, format!("{} is not valid hex: {}", what, e)))
}

/// Normalize a mnemonic phrase: NFKD, lowercase, single spaces.
///
/// The returned buffer is wiped on drop.
pub fn normalize_mnemonic(phrase: &str) -> SignerResult<Zeroizing<String>> {
    let normalized: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect::<String>().to_lowercase());

    let mut collapsed = Zeroizing::new(String::with_capacity(normalized.len()));
    for word in normalized.split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(word);
    }

    if collapsed.is_empty() {
        return Err(SignerError::invalid_mnemonic("Mnemonic phrase is empty"));
    }

    if collapsed.len() > limits::MAX_MNEMONIC_LENGTH {
        return Err(SignerError::invalid_mnemonic(format!(
            "Mnemonic phrase exceeds {} characters",
            limits::MAX_MNEMONIC_LENGTH
        )));
    }

    Ok(collapsed)
}

/// Trim a bech32 string and enforce the length limit.
pub fn sanitize_bech32(encoded: &str) -> SignerResult<&str> {
    let trimmed = encoded.trim();

    if trimmed.is_empty() {
        return Err(SignerError::invalid_encoding("Bech32 string is empty"));
    }

    if trimmed.len() > limits::MAX_BECH32_LENGTH {
        return Err(SignerError::invalid_encoding(format!(
            "Bech32 string exceeds {} characters",
            limits::MAX_BECH32_LENGTH
        )));
    }

    Ok(trimmed)
}

/// Trim a derivation path string and enforce the length limit.
pub fn sanitize_path(path: &str) -> SignerResult<&str> {
    let trimmed = path.trim();

    if trimmed.len() > limits::MAX_PATH_LENGTH {
        return Err(SignerError::invalid_input(format!(
            "Derivation path exceeds {} characters",
            limits::MAX_PATH_LENGTH
        )));
    }

    Ok(trimmed)
}
