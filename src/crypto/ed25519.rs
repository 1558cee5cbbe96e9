//! Ed25519 leaf keys and signatures
//!
//! A leaf [`SigningKey`] is either a normal RFC 8032 key (32-byte seed,
//! as produced by `cardano-cli`) or an extended BIP32-Ed25519 key whose
//! scalar is used directly. Both produce ordinary Ed25519 signatures that
//! verify under the same [`VerificationKey`] type.

use super::bip32_ed25519::{scalar_to_public, ExtendedPrivateKey, PUBLIC_KEY_SIZE};
use crate::error::{SignerError, SignerResult};
use crate::utils::crypto::blake2b224;
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::Signer as _;
use sha2::{Digest, Sha512};
use std::fmt;
use zeroize::Zeroizing;

pub const SIGNATURE_SIZE: usize = 64;

/// Leaf signing key. Secret bytes are wiped on drop.
pub enum SigningKey {
    Normal(ed25519_dalek::SigningKey),
    Extended(Zeroizing<[u8; 64]>),
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKey::Normal(_) => f.write_str("SigningKey::Normal([REDACTED])"),
            SigningKey::Extended(_) => f.write_str("SigningKey::Extended([REDACTED])"),
        }
    }
}

impl SigningKey {
    /// RFC 8032 key from its 32-byte seed
    pub fn from_normal_bytes(seed: &[u8; 32]) -> Self {
        SigningKey::Normal(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Extended key from a derived BIP32-Ed25519 node (chain code dropped)
    pub fn from_extended(xprv: &ExtendedPrivateKey) -> Self {
        SigningKey::Extended(xprv.extended_secret())
    }

    /// Extended key from a bare `kL || kR` secret (cardano-cli extended keys)
    pub fn from_extended_bytes(secret: &[u8; 64]) -> SignerResult<Self> {
        if secret[0] & 0b0000_0111 != 0 || secret[31] & 0b1000_0000 != 0 {
            return Err(SignerError::invalid_encoding(
                "Extended secret scalar is not clamped",
            ));
        }
        Ok(SigningKey::Extended(Zeroizing::new(*secret)))
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, SigningKey::Extended(_))
    }

    pub fn verification_key(&self) -> VerificationKey {
        match self {
            SigningKey::Normal(key) => VerificationKey(key.verifying_key().to_bytes()),
            SigningKey::Extended(secret) => VerificationKey(scalar_to_public(&secret[..32])),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        match self {
            SigningKey::Normal(key) => Signature(key.sign(message).to_bytes()),
            SigningKey::Extended(secret) => Signature(sign_extended(secret, message)),
        }
    }
}

/// Ed25519 signing with a pre-expanded secret `kL || kR`:
/// `r = H(kR || M)`, `R = rB`, `S = r + H(R || A || M) * kL`.
fn sign_extended(secret: &[u8; 64], message: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let mut kl_bytes = Zeroizing::new([0u8; 32]);
    kl_bytes.copy_from_slice(&secret[..32]);
    let kl = Zeroizing::new(Scalar::from_bytes_mod_order(*kl_bytes));
    let public = EdwardsPoint::mul_base(&kl).compress();

    let mut hasher = Sha512::new();
    hasher.update(&secret[32..]);
    hasher.update(message);
    let r = Zeroizing::new(Scalar::from_bytes_mod_order_wide(&wide_digest(hasher)));
    let big_r = EdwardsPoint::mul_base(&r).compress();

    let mut hasher = Sha512::new();
    hasher.update(big_r.as_bytes());
    hasher.update(public.as_bytes());
    hasher.update(message);
    let k = Scalar::from_bytes_mod_order_wide(&wide_digest(hasher));

    let s = k * *kl + *r;

    let mut out = [0u8; SIGNATURE_SIZE];
    out[..32].copy_from_slice(big_r.as_bytes());
    out[32..].copy_from_slice(s.as_bytes());
    out
}

fn wide_digest(hasher: Sha512) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Ed25519 verification key (safe to expose)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerificationKey([u8; PUBLIC_KEY_SIZE]);

impl VerificationKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Blake2b-224 key hash, as listed in a body's required signers
    pub fn key_hash(&self) -> [u8; 28] {
        blake2b224(&self.0)
    }

    /// Strict RFC 8032 verification
    pub fn verify(&self, message: &[u8], signature: &Signature) -> SignerResult<()> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| SignerError::signing_failure(format!("Invalid verification key: {}", e)))?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify_strict(message, &sig)
            .map_err(|e| SignerError::signing_failure(format!("Signature does not verify: {}", e)))
    }
}

/// 64-byte Ed25519 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::bip32_ed25519::{XPRV_SIZE, HARDENED};

    const D1_H0: &str = "60d399da83ef80d8d4f8d223239efdc2b8fef387e1b5219137ffb4e8fbdea15adc9366b7d003af37c11396de9a83734e30e05e851efa32745c9cd7b42712c890608763770eddf77248ab652984b21b849760d1da74a6f5bd633ce41adceef07a";
    const D1_H0_SIGNATURE: &str = "90194d57cde4fdadd01eb7cf161780c277e129fc7135b97779a3268837e4cd2e9444b9bb91c0e84d23bba870df3c4bda91a110ef735638fa7a34ea2046d4be04";

    fn xprv(hex_str: &str) -> ExtendedPrivateKey {
        let mut bytes = [0u8; XPRV_SIZE];
        bytes.copy_from_slice(&hex::decode(hex_str).unwrap());
        ExtendedPrivateKey::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_extended_signature_vector() {
        let key = SigningKey::from_extended(&xprv(D1_H0));
        let signature = key.sign(b"Hello World");
        assert_eq!(signature.to_hex(), D1_H0_SIGNATURE);
        assert!(key.verification_key().verify(b"Hello World", &signature).is_ok());
    }

    #[test]
    fn test_rfc8032_public_key() {
        // RFC 8032, section 7.1, test 1
        let seed: [u8; 32] =
            hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
                .unwrap()
                .try_into()
                .unwrap();
        let key = SigningKey::from_normal_bytes(&seed);
        assert_eq!(
            key.verification_key().to_hex(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
        assert_eq!(
            key.sign(b"").to_hex(),
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
        );
    }

    #[test]
    fn test_verification_rejects_tampering() {
        let key = SigningKey::from_extended(&xprv(D1_H0).derive(HARDENED | 3).unwrap());
        let signature = key.sign(b"payload");
        let err = key.verification_key().verify(b"payload!", &signature).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::SigningFailure);
    }

    #[test]
    fn test_extended_key_matches_xprv_public_key() {
        let node = xprv(D1_H0);
        let key = SigningKey::from_extended(&node);
        assert!(key.is_extended());
        assert_eq!(key.verification_key().as_bytes(), &node.public_key());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SigningKey::from_normal_bytes(&[9u8; 32]);
        assert_eq!(format!("{:?}", key), "SigningKey::Normal([REDACTED])");
    }
}
