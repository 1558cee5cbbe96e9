//! Mnemonic key material
//!
//! BIP-39 phrase to BIP32-Ed25519 root key. Two master-key schemes are
//! in use across Cardano wallets:
//! - Icarus (Daedalus, Yoroi, cardano-serialization-lib): PBKDF2 over the
//!   phrase entropy, 4096 rounds.
//! - Ledger (hardware wallets): standard BIP-39 seed (2048 rounds) fed
//!   through an HMAC chain.

use crate::crypto::bip32_ed25519::ExtendedPrivateKey;
use crate::error::SignerResult;
use crate::utils::sanitize::normalize_mnemonic;
use bip39::{Language, Mnemonic};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Master-key derivation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterKeyScheme {
    #[default]
    Icarus,
    Ledger,
}

impl std::str::FromStr for MasterKeyScheme {
    type Err = crate::error::SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "icarus" => Ok(MasterKeyScheme::Icarus),
            "ledger" => Ok(MasterKeyScheme::Ledger),
            other => Err(crate::error::SignerError::invalid_input(format!(
                "Unknown master key scheme '{}' (expected icarus or ledger)",
                other
            ))),
        }
    }
}

/// Root key from an English BIP-39 phrase (Icarus scheme).
pub fn from_mnemonic(phrase: &str, passphrase: &str) -> SignerResult<ExtendedPrivateKey> {
    from_mnemonic_with_scheme(phrase, passphrase, MasterKeyScheme::Icarus)
}

pub fn from_mnemonic_with_scheme(
    phrase: &str,
    passphrase: &str,
    scheme: MasterKeyScheme,
) -> SignerResult<ExtendedPrivateKey> {
    let normalized = normalize_mnemonic(phrase)?;
    let mnemonic = Zeroizing::new(Mnemonic::parse_in(Language::English, normalized.as_str())?);

    match scheme {
        MasterKeyScheme::Icarus => {
            let (entropy, len) = mnemonic.to_entropy_array();
            let entropy = Zeroizing::new(entropy);
            Ok(ExtendedPrivateKey::from_bip39_entropy(
                &entropy[..len],
                passphrase.as_bytes(),
            ))
        }
        MasterKeyScheme::Ledger => {
            let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
            Ok(ExtendedPrivateKey::from_bip39_seed(&seed[..])?)
        }
    }
}
