//! Shared types for the Cardano signer
//!
//! Data structures returned across the library boundary, serializable
//! for the CLI's JSON output.

use serde::{Deserialize, Serialize};

/// Result of one sign call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Signed transaction, hex encoded
    pub tx_hex: String,
    /// Transaction id (Blake2b-256 of the body), hex encoded
    pub tx_hash: String,
    /// Verification key of the new witness, hex encoded
    pub public_key: String,
    /// Number of vkey witnesses after signing
    pub witness_count: usize,
    /// True when a witness for the same key was replaced
    pub replaced: bool,
}

/// Result of a public-key query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    /// Verification key, hex encoded
    pub public_key: String,
    /// Blake2b-224 key hash, hex encoded
    pub key_hash: String,
    /// Derivation path used, `m` for raw keys
    pub path: String,
}
