//! Bech32 key material
//!
//! Extended signing keys exported by Cardano tooling as bech32 strings:
//! `xprv` (cardano-serialization-lib) and the CIP-5 `*_xsk` prefixes.
//! All carry the same 96-byte payload `kL || kR || chain_code`.

use crate::crypto::bip32_ed25519::{ExtendedPrivateKey, XPRV_SIZE};
use crate::error::{SignerError, SignerResult};
use crate::utils::sanitize::sanitize_bech32;
use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Human-readable prefixes of extended signing keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPrefix {
    Xprv,
    RootXsk,
    AcctXsk,
    AddrXsk,
    StakeXsk,
}

/// Verification-key prefixes, recognized only to give a clearer error
const PUBLIC_PREFIXES: [&str; 5] = ["xpub", "root_xvk", "acct_xvk", "addr_xvk", "stake_xvk"];

impl KeyPrefix {
    pub const ALL: [KeyPrefix; 5] = [
        KeyPrefix::Xprv,
        KeyPrefix::RootXsk,
        KeyPrefix::AcctXsk,
        KeyPrefix::AddrXsk,
        KeyPrefix::StakeXsk,
    ];

    pub fn hrp(self) -> &'static str {
        match self {
            KeyPrefix::Xprv => "xprv",
            KeyPrefix::RootXsk => "root_xsk",
            KeyPrefix::AcctXsk => "acct_xsk",
            KeyPrefix::AddrXsk => "addr_xsk",
            KeyPrefix::StakeXsk => "stake_xsk",
        }
    }

    pub fn from_hrp(hrp: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.hrp() == hrp)
    }

    /// Whether keys with this prefix sit at the root of the wallet tree
    /// (so a full CIP-1852 path applies to them).
    pub fn is_root(self) -> bool {
        matches!(self, KeyPrefix::Xprv | KeyPrefix::RootXsk)
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hrp())
    }
}

impl FromStr for KeyPrefix {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hrp(s.trim()).ok_or_else(|| {
            SignerError::invalid_input(format!("Unknown extended key prefix '{}'", s.trim()))
        })
    }
}

/// Decode a bech32 extended signing key, requiring `expected_prefix`.
pub fn from_bech32(encoded: &str, expected_prefix: KeyPrefix) -> SignerResult<ExtendedPrivateKey> {
    let (prefix, key) = decode(encoded)?;
    if prefix != expected_prefix {
        return Err(SignerError::unexpected_prefix(format!(
            "Expected a '{}' key, found '{}'",
            expected_prefix, prefix
        )));
    }
    Ok(key)
}

/// Decode a bech32 extended signing key with any known signing prefix.
pub fn from_bech32_any(encoded: &str) -> SignerResult<(KeyPrefix, ExtendedPrivateKey)> {
    decode(encoded)
}

/// Encode an extended signing key under `prefix`.
pub fn to_bech32(key: &ExtendedPrivateKey, prefix: KeyPrefix) -> SignerResult<String> {
    Ok(bech32::encode(prefix.hrp(), key.as_bytes().to_base32(), Variant::Bech32)?)
}

fn decode(encoded: &str) -> SignerResult<(KeyPrefix, ExtendedPrivateKey)> {
    let encoded = sanitize_bech32(encoded)?;
    let (hrp, data, variant) = bech32::decode(encoded)?;

    if variant != Variant::Bech32 {
        return Err(SignerError::invalid_encoding(
            "Key strings use bech32, not bech32m",
        ));
    }

    let prefix = match KeyPrefix::from_hrp(&hrp) {
        Some(prefix) => prefix,
        None if PUBLIC_PREFIXES.contains(&hrp.as_str()) => {
            return Err(SignerError::unexpected_prefix(format!(
                "'{}' is a verification key and cannot sign",
                hrp
            )))
        }
        None => {
            return Err(SignerError::unexpected_prefix(format!(
                "'{}' is not an extended signing key prefix",
                hrp
            ))
            .with_details(format!(
                "expected one of {}",
                KeyPrefix::ALL.map(KeyPrefix::hrp).join(", ")
            )))
        }
    };

    let payload = Zeroizing::new(Vec::<u8>::from_base32(&data)?);
    if payload.len() != XPRV_SIZE {
        return Err(SignerError::invalid_key_length(format!(
            "Extended key payload must be {} bytes, got {}",
            XPRV_SIZE,
            payload.len()
        )));
    }

    let mut bytes = [0u8; XPRV_SIZE];
    bytes.copy_from_slice(&payload);
    let key = ExtendedPrivateKey::from_bytes(bytes);
    zeroize::Zeroize::zeroize(&mut bytes);

    Ok((prefix, key?))
}
