//! Cardano Transaction Signer
//!
//! Adds a vkey witness to an already-built Cardano transaction.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: Key material intake (BIP-39 mnemonic, bech32 extended key,
//!   raw Ed25519 key) and CIP-1852 derivation paths
//! - **crypto**: BIP32-Ed25519 derivation and Ed25519 signing
//! - **tx**: Transaction codec, witness set and the signing pipeline
//! - **utils**: Settings, logging with redaction, input sanitizing, hashing
//!
//! # Security
//!
//! Secret inputs are held in `secrecy` wrappers, derived keys and seeds in
//! `zeroize` buffers. Nothing secret is cached between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use cardano_signer::{sign_with_mnemonic, Signer, KeyMaterial};
//!
//! let signed_hex = sign_with_mnemonic(phrase, "", "m/1852'/1815'/0'/0/0", &tx_hex)?;
//!
//! let signer = Signer::from_env()?;
//! let signed = signer.sign(&KeyMaterial::bech32(&root_xsk), (0, 0), &tx_hex)?;
//! println!("{} signed by {}", signed.tx_hash, signed.public_key);
//! ```

pub mod crypto;
pub mod error;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, SignerError, SignerResult};
pub use tx::signer::{
    public_key, sign_with_bech32, sign_with_mnemonic, sign_with_raw_bytes, sign_with_raw_key,
    Signer,
};
pub use types::{PublicKeyInfo, SignedTransaction};
pub use utils::config::{SignerProfile, SignerSettings};
pub use wallet::{DerivationPath, KeyMaterial, KeyPrefix, MasterKeyScheme, PathSpec};
