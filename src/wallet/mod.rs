//! Wallet Module
//!
//! Key material intake and derivation: mnemonic, bech32 and raw keys,
//! CIP-1852 paths, and resolution to a leaf signing key.

pub mod bech32_key;
pub mod derivation_path;
pub mod key_material;
pub mod mnemonic;
pub mod raw_key;

pub use bech32_key::{from_bech32, from_bech32_any, to_bech32, KeyPrefix};
pub use derivation_path::*;
pub use key_material::{resolve_public_key, resolve_signing_key, KeyMaterial};
pub use mnemonic::{from_mnemonic, from_mnemonic_with_scheme, MasterKeyScheme};
pub use raw_key::{from_raw, from_raw_hex, from_text_envelope, parse_raw_key, TextEnvelope};
