//! Cryptographic primitives
//!
//! - BIP32-Ed25519 hierarchical keys (Icarus and Ledger master keys)
//! - Ed25519 signing with normal and extended secret keys

pub mod bip32_ed25519;
pub mod ed25519;

pub use bip32_ed25519::{DerivationFault, ExtendedPrivateKey, ExtendedPublicKey, HARDENED};
pub use ed25519::{Signature, SigningKey, VerificationKey};
