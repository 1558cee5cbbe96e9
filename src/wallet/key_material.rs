//! Key material resolution
//!
//! Turns one of the accepted secret forms plus a derivation path into the
//! leaf signing key. Decoding always happens before any derivation, so a
//! malformed secret is reported as such even when the path is also bad.

use super::bech32_key::{from_bech32, from_bech32_any, KeyPrefix};
use super::derivation_path::{cip1852, DerivationPath, PathSpec, HARDENED};
use super::mnemonic::{from_mnemonic_with_scheme, MasterKeyScheme};
use super::raw_key::{from_raw, parse_raw_key};
use crate::crypto::bip32_ed25519::ExtendedPrivateKey;
use crate::crypto::ed25519::{SigningKey, VerificationKey};
use crate::error::{SignerError, SignerResult};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use zeroize::Zeroizing;

/// Secret input to the signer. Never printed.
pub enum KeyMaterial {
    /// BIP-39 phrase with optional passphrase
    Mnemonic {
        phrase: SecretString,
        passphrase: SecretString,
    },
    /// Bech32 extended signing key; `prefix` pins the accepted prefix
    Bech32 {
        encoded: SecretString,
        prefix: Option<KeyPrefix>,
    },
    /// 32 raw bytes
    RawBytes(Zeroizing<Vec<u8>>),
    /// Hex, CBOR hex or text envelope
    RawText(SecretString),
}

impl KeyMaterial {
    pub fn mnemonic(phrase: &str, passphrase: &str) -> Self {
        KeyMaterial::Mnemonic {
            phrase: SecretString::from(phrase),
            passphrase: SecretString::from(passphrase),
        }
    }

    pub fn bech32(encoded: &str) -> Self {
        KeyMaterial::Bech32 {
            encoded: SecretString::from(encoded),
            prefix: None,
        }
    }

    pub fn bech32_with_prefix(encoded: &str, prefix: KeyPrefix) -> Self {
        KeyMaterial::Bech32 {
            encoded: SecretString::from(encoded),
            prefix: Some(prefix),
        }
    }

    pub fn raw_bytes(bytes: &[u8]) -> Self {
        KeyMaterial::RawBytes(Zeroizing::new(bytes.to_vec()))
    }

    pub fn raw_text(text: &str) -> Self {
        KeyMaterial::RawText(SecretString::from(text))
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            KeyMaterial::Mnemonic { .. } => "mnemonic",
            KeyMaterial::Bech32 { .. } => "bech32",
            KeyMaterial::RawBytes(_) | KeyMaterial::RawText(_) => "raw",
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, KeyMaterial::RawBytes(_) | KeyMaterial::RawText(_))
    }

    /// Bech32 prefix, pinned or read off the encoded string
    fn bech32_prefix(&self) -> Option<KeyPrefix> {
        match self {
            KeyMaterial::Bech32 { prefix: Some(prefix), .. } => Some(*prefix),
            KeyMaterial::Bech32 { encoded, prefix: None } => {
                let (hrp, _) = encoded.expose_secret().trim().rsplit_once('1')?;
                KeyPrefix::from_hrp(&hrp.to_ascii_lowercase())
            }
            _ => None,
        }
    }

    /// Path used when the caller gives none: the first external address
    /// for root keys, no derivation for raw and non-root keys.
    pub fn default_path(&self) -> PathSpec {
        if self.is_raw() || self.bech32_prefix().is_some_and(|p| !p.is_root()) {
            PathSpec::from(DerivationPath::root())
        } else {
            PathSpec::from((0u32, 0u32))
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial::{}([REDACTED])", self.kind())
    }
}

/// Decoded but not yet derived
enum DecodedKey {
    Extended(ExtendedPrivateKey),
    /// Account, address or stake level key
    NonRoot(KeyPrefix, ExtendedPrivateKey),
    Leaf(SigningKey),
}

fn decode(material: &KeyMaterial, scheme: MasterKeyScheme) -> SignerResult<DecodedKey> {
    match material {
        KeyMaterial::Mnemonic { phrase, passphrase } => Ok(DecodedKey::Extended(
            from_mnemonic_with_scheme(phrase.expose_secret(), passphrase.expose_secret(), scheme)?,
        )),
        KeyMaterial::Bech32 { encoded, prefix } => {
            let (found, key) = match prefix {
                Some(prefix) => (*prefix, from_bech32(encoded.expose_secret(), *prefix)?),
                None => from_bech32_any(encoded.expose_secret())?,
            };
            if found.is_root() {
                Ok(DecodedKey::Extended(key))
            } else {
                Ok(DecodedKey::NonRoot(found, key))
            }
        }
        KeyMaterial::RawBytes(bytes) => Ok(DecodedKey::Leaf(from_raw(bytes)?)),
        KeyMaterial::RawText(text) => Ok(DecodedKey::Leaf(parse_raw_key(text.expose_secret())?)),
    }
}

/// A path below a non-root key is relative to it, so one starting at the
/// CIP-1852 purpose cannot be meant for it.
fn check_relative_path(prefix: KeyPrefix, path: &DerivationPath) -> SignerResult<()> {
    let purpose = HARDENED | cip1852::PURPOSE;
    if path.indices().next() == Some(purpose) {
        return Err(SignerError::invalid_input(format!(
            "A full wallet path cannot be applied to a '{}' key",
            prefix
        ))
        .with_details(format!("got path {}; use m to sign with the key itself", path)));
    }
    if !path.is_empty() {
        crate::log_warn!(
            "key_material",
            "Deriving below a non-root key",
            prefix = prefix,
            path = path
        );
    }
    Ok(())
}

/// Resolve the leaf signing key for `material` at `path`.
///
/// Raw keys take no derivation: any non-empty path is rejected. Paths on
/// non-root bech32 keys are relative and may not start at the purpose.
pub fn resolve_signing_key(
    material: &KeyMaterial,
    path: &DerivationPath,
    scheme: MasterKeyScheme,
) -> SignerResult<SigningKey> {
    match decode(material, scheme)? {
        DecodedKey::Extended(root) => {
            let leaf = root.derive_path(path.indices())?;
            Ok(SigningKey::from_extended(&leaf))
        }
        DecodedKey::NonRoot(prefix, key) => {
            check_relative_path(prefix, path)?;
            let leaf = key.derive_path(path.indices())?;
            Ok(SigningKey::from_extended(&leaf))
        }
        DecodedKey::Leaf(key) if path.is_empty() => Ok(key),
        DecodedKey::Leaf(_) => Err(SignerError::derivation(
            "A raw key cannot be derived further",
        )
        .with_details(format!("got path {}", path))),
    }
}

/// Verification key of the leaf `material` resolves to at `path`.
pub fn resolve_public_key(
    material: &KeyMaterial,
    path: &DerivationPath,
    scheme: MasterKeyScheme,
) -> SignerResult<VerificationKey> {
    Ok(resolve_signing_key(material, path, scheme)?.verification_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::wallet::bech32_key::to_bech32;

    const ABANDON_ART: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";
    const ROOT_XPRV: &str = "xprv1kpll8e3uzlxjupgyujla225cc3atmcvreng88rhu8p08vn7er49a05ueamhncn0k37kt8ug7ffx525f75832sqv25ddncpu8zn8aemwvcs3ynctesnzyeuuqkjylvtzhlpqgnc2sy3dlf8zrd59ewzw93up0n5l0";
    const LEAF_PUB: &str = "63c5d69570349e4233a0575811464f0e8a3fd329abe76e9bdc3d3f1b95982179";

    fn leaf_path() -> DerivationPath {
        DerivationPath::from_index_pair(0, 0).unwrap()
    }

    #[test]
    fn test_mnemonic_and_bech32_agree() {
        let scheme = MasterKeyScheme::Icarus;
        let a = resolve_public_key(&KeyMaterial::mnemonic(ABANDON_ART, ""), &leaf_path(), scheme)
            .unwrap();
        let b = resolve_public_key(&KeyMaterial::bech32(ROOT_XPRV), &leaf_path(), scheme).unwrap();
        assert_eq!(a.to_hex(), LEAF_PUB);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pinned_prefix() {
        let material = KeyMaterial::bech32_with_prefix(ROOT_XPRV, KeyPrefix::RootXsk);
        let err = resolve_signing_key(&material, &leaf_path(), MasterKeyScheme::Icarus)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedPrefix);
    }

    fn addr_xsk() -> String {
        let root = from_bech32(ROOT_XPRV, KeyPrefix::Xprv).unwrap();
        let leaf = root.derive_path(leaf_path().indices()).unwrap();
        to_bech32(&leaf, KeyPrefix::AddrXsk).unwrap()
    }

    #[test]
    fn test_address_key_rejects_full_path() {
        let material = KeyMaterial::bech32(&addr_xsk());
        let err = resolve_signing_key(&material, &leaf_path(), MasterKeyScheme::Icarus)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let pinned = KeyMaterial::bech32_with_prefix(&addr_xsk(), KeyPrefix::AddrXsk);
        let err = resolve_signing_key(&pinned, &leaf_path(), MasterKeyScheme::Icarus)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_address_key_signs_as_itself_by_default() {
        let material = KeyMaterial::bech32(&addr_xsk());
        let path = material.default_path().resolve().unwrap();
        assert!(path.is_empty());

        let key = resolve_public_key(&material, &path, MasterKeyScheme::Icarus).unwrap();
        assert_eq!(key.to_hex(), LEAF_PUB);
    }

    #[test]
    fn test_default_paths() {
        let leaf = DerivationPath::from_index_pair(0, 0).unwrap();
        let mnemonic = KeyMaterial::mnemonic(ABANDON_ART, "");
        assert_eq!(mnemonic.default_path().resolve().unwrap(), leaf);
        assert_eq!(KeyMaterial::bech32(ROOT_XPRV).default_path().resolve().unwrap(), leaf);
        assert!(KeyMaterial::raw_bytes(&[7u8; 32]).default_path().resolve().unwrap().is_empty());
    }

    #[test]
    fn test_raw_key_with_path_is_rejected() {
        let material = KeyMaterial::raw_bytes(&[7u8; 32]);
        let err = resolve_signing_key(&material, &leaf_path(), MasterKeyScheme::Icarus)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DerivationError);

        let key = resolve_signing_key(&material, &DerivationPath::root(), MasterKeyScheme::Icarus);
        assert!(key.is_ok());
    }

    #[test]
    fn test_decode_error_wins_over_path_error() {
        let material = KeyMaterial::raw_text("abcd");
        let err = resolve_signing_key(&material, &leaf_path(), MasterKeyScheme::Icarus)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidKeyLength);
    }

    #[test]
    fn test_empty_path_signs_with_root() {
        let material = KeyMaterial::mnemonic(ABANDON_ART, "");
        let key = resolve_public_key(&material, &DerivationPath::root(), MasterKeyScheme::Icarus)
            .unwrap();
        assert_eq!(
            key.to_hex(),
            "51aa1dcac6324b41cb184e27589a208b7f1c941c620e1e0d10414c979989a7c2"
        );
    }

    #[test]
    fn test_debug_is_redacted() {
        let material = KeyMaterial::mnemonic(ABANDON_ART, "hunter2");
        let printed = format!("{:?}", material);
        assert_eq!(printed, "KeyMaterial::mnemonic([REDACTED])");
        assert!(!printed.contains("abandon"));
    }
}
