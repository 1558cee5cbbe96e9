//! BIP32-Ed25519 hierarchical key derivation (Cardano "V2" scheme)
//!
//! An extended private key is 96 bytes: `kL || kR || chain_code`.
//! `kL` is a clamped Ed25519 scalar, `kR` seeds deterministic nonces.
//!
//! Child derivation (index serialized little-endian):
//! - hardened: `Z = HMAC(cc, 0x00 || kL || kR || i)`, `I = HMAC(cc, 0x01 || kL || kR || i)`
//! - soft:     `Z = HMAC(cc, 0x02 || A || i)`,        `I = HMAC(cc, 0x03 || A || i)`
//!
//! then `kL' = kL + 8 * trunc28(ZL)`, `kR' = kR + ZR mod 2^256`, `cc' = I[32..64]`.
//! Multiplying by 8 keeps the three low bits clear, so every child is a
//! valid Ed25519 scalar without re-clamping.

use crate::error::SignerError;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

pub const XPRV_SIZE: usize = 96;
pub const XPUB_SIZE: usize = 64;
pub const PUBLIC_KEY_SIZE: usize = 32;
pub const CHAIN_CODE_SIZE: usize = 32;

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Iteration count of the Icarus master-key stretch
const ICARUS_PBKDF2_ROUNDS: u32 = 4096;

/// Failures inside the derivation arithmetic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivationFault {
    #[error("child scalar overflowed 2^256 at index {0}")]
    ScalarOverflow(u32),

    #[error("child scalar is zero modulo the group order at index {0}")]
    ZeroScalar(u32),

    #[error("hardened index {0} cannot be derived from a public key")]
    HardenedFromPublic(u32),

    #[error("public key is not a valid curve point")]
    InvalidPoint,

    #[error("extended key scalar is not clamped: {0}")]
    Unclamped(&'static str),

    #[error("HMAC key rejected")]
    MacKey,
}

impl From<DerivationFault> for SignerError {
    fn from(fault: DerivationFault) -> Self {
        match fault {
            DerivationFault::ScalarOverflow(_) | DerivationFault::ZeroScalar(_) => {
                SignerError::derivation_overflow(fault.to_string())
            }
            DerivationFault::Unclamped(_) => SignerError::invalid_encoding(format!(
                "Not a BIP32-Ed25519 signing key: {}",
                fault
            )),
            _ => SignerError::derivation(fault.to_string()),
        }
    }
}

/// 96-byte extended signing key. Wiped on drop, never printed or compared.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExtendedPrivateKey([u8; XPRV_SIZE]);

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtendedPrivateKey([REDACTED])")
    }
}

impl ExtendedPrivateKey {
    /// Wrap 96 bytes, checking the scalar clamping a signing key must carry.
    pub fn from_bytes(bytes: [u8; XPRV_SIZE]) -> Result<Self, DerivationFault> {
        let key = Self(bytes);
        if key.0[0] & 0b0000_0111 != 0 {
            return Err(DerivationFault::Unclamped("lowest three bits are set"));
        }
        if key.0[31] & 0b1000_0000 != 0 {
            return Err(DerivationFault::Unclamped("highest bit is set"));
        }
        Ok(key)
    }

    /// Icarus master key: `PBKDF2-HMAC-SHA512(passphrase, entropy, 4096)`
    /// stretched to 96 bytes, then clamped.
    pub fn from_bip39_entropy(entropy: &[u8], passphrase: &[u8]) -> Self {
        let mut out = [0u8; XPRV_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha512>(passphrase, entropy, ICARUS_PBKDF2_ROUNDS, &mut out);
        clamp_scalar(&mut out);
        out[31] &= 0b0001_1111;
        out[31] |= 0b0100_0000;
        Self(out)
    }

    /// Ledger master key: HMAC chain over the 64-byte BIP-39 seed,
    /// retrying until bit 5 of `kL[31]` is clear.
    pub fn from_bip39_seed(seed: &[u8]) -> Result<Self, DerivationFault> {
        let mut out = [0u8; XPRV_SIZE];

        let mut block = Zeroizing::new(hmac_sha512(b"ed25519 seed", &[seed])?);
        while block[31] & 0b0010_0000 != 0 {
            let next = hmac_sha512(b"ed25519 seed", &[&block[..]])?;
            *block = next;
        }
        out[..64].copy_from_slice(&block[..]);
        clamp_scalar(&mut out);

        let chain_code = hmac_sha256(b"ed25519 seed", &[&[0x01], seed])?;
        out[64..].copy_from_slice(&chain_code);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; XPRV_SIZE] {
        &self.0
    }

    /// Left half of the extended scalar (`kL`)
    fn left(&self) -> &[u8] {
        &self.0[..32]
    }

    /// Right half of the extended scalar (`kR`)
    fn right(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn chain_code(&self) -> &[u8] {
        &self.0[64..]
    }

    /// The 64-byte extended secret `kL || kR` used for signing
    pub fn extended_secret(&self) -> Zeroizing<[u8; 64]> {
        let mut out = Zeroizing::new([0u8; 64]);
        out.copy_from_slice(&self.0[..64]);
        out
    }

    /// Ed25519 public key `A = kL * B`
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        scalar_to_public(self.left())
    }

    pub fn to_public(&self) -> ExtendedPublicKey {
        let mut out = [0u8; XPUB_SIZE];
        out[..32].copy_from_slice(&self.public_key());
        out[32..].copy_from_slice(self.chain_code());
        ExtendedPublicKey(out)
    }

    /// Derive one child key.
    pub fn derive(&self, index: u32) -> Result<ExtendedPrivateKey, DerivationFault> {
        let ser = index.to_le_bytes();

        let (z, i) = if index >= HARDENED {
            (
                Zeroizing::new(hmac_sha512(self.chain_code(), &[&[0x00], self.left(), self.right(), &ser])?),
                hmac_sha512(self.chain_code(), &[&[0x01], self.left(), self.right(), &ser])?,
            )
        } else {
            let public = self.public_key();
            (
                Zeroizing::new(hmac_sha512(self.chain_code(), &[&[0x02], &public, &ser])?),
                hmac_sha512(self.chain_code(), &[&[0x03], &public, &ser])?,
            )
        };

        let (left, carry) = add_28_mul8(self.left(), &z[..32]);
        let left = Zeroizing::new(left);
        if carry {
            return Err(DerivationFault::ScalarOverflow(index));
        }
        if Scalar::from_bytes_mod_order(*left) == Scalar::ZERO {
            return Err(DerivationFault::ZeroScalar(index));
        }
        let right = Zeroizing::new(add_256bits(self.right(), &z[32..]));

        let mut out = [0u8; XPRV_SIZE];
        out[..32].copy_from_slice(&left[..]);
        out[32..64].copy_from_slice(&right[..]);
        out[64..].copy_from_slice(&i[32..]);
        Ok(ExtendedPrivateKey(out))
    }

    /// Walk `indices` left to right. An empty walk returns a copy of the root.
    pub fn derive_path<I>(&self, indices: I) -> Result<ExtendedPrivateKey, DerivationFault>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut current = ExtendedPrivateKey(self.0);
        for index in indices {
            current = current.derive(index)?;
        }
        Ok(current)
    }
}

/// 64-byte extended verification key: `A || chain_code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedPublicKey([u8; XPUB_SIZE]);

impl ExtendedPublicKey {
    pub fn from_bytes(bytes: [u8; XPUB_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; XPUB_SIZE] {
        &self.0
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(&self.0[..32]);
        out
    }

    pub fn chain_code(&self) -> &[u8] {
        &self.0[32..]
    }

    /// Soft child derivation: `A' = A + (8 * trunc28(ZL)) * B`.
    pub fn derive(&self, index: u32) -> Result<ExtendedPublicKey, DerivationFault> {
        if index >= HARDENED {
            return Err(DerivationFault::HardenedFromPublic(index));
        }

        let ser = index.to_le_bytes();
        let public = &self.0[..32];
        let z = hmac_sha512(self.chain_code(), &[&[0x02], public, &ser])?;
        let i = hmac_sha512(self.chain_code(), &[&[0x03], public, &ser])?;

        let parent = CompressedEdwardsY::from_slice(public)
            .map_err(|_| DerivationFault::InvalidPoint)?
            .decompress()
            .ok_or(DerivationFault::InvalidPoint)?;

        // 8 * trunc28(ZL) < 2^227, so no carry is possible here
        let (tweak, _) = add_28_mul8(&[0u8; 32], &z[..32]);
        let child = parent + EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(tweak));

        let mut out = [0u8; XPUB_SIZE];
        out[..32].copy_from_slice(child.compress().as_bytes());
        out[32..].copy_from_slice(&i[32..]);
        Ok(ExtendedPublicKey(out))
    }
}

/// Ed25519 public key from a clamped little-endian scalar
pub(crate) fn scalar_to_public(scalar_bytes: &[u8]) -> [u8; PUBLIC_KEY_SIZE] {
    let mut bytes = Zeroizing::new([0u8; 32]);
    bytes.copy_from_slice(&scalar_bytes[..32]);
    let scalar = Zeroizing::new(Scalar::from_bytes_mod_order(*bytes));
    EdwardsPoint::mul_base(&scalar).compress().to_bytes()
}

fn clamp_scalar(key: &mut [u8]) {
    key[0] &= 0b1111_1000;
    key[31] &= 0b0111_1111;
    key[31] |= 0b0100_0000;
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 64], DerivationFault> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key).map_err(|_| DerivationFault::MacKey)?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], DerivationFault> {
    let mut mac = <Hmac<sha2::Sha256> as Mac>::new_from_slice(key).map_err(|_| DerivationFault::MacKey)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// `x + 8 * trunc28(y)`, returning the final carry.
fn add_28_mul8(x: &[u8], y: &[u8]) -> ([u8; 32], bool) {
    let mut carry: u16 = 0;
    let mut out = [0u8; 32];

    for i in 0..28 {
        let r = x[i] as u16 + ((y[i] as u16) << 3) + carry;
        out[i] = (r & 0xff) as u8;
        carry = r >> 8;
    }
    for i in 28..32 {
        let r = x[i] as u16 + carry;
        out[i] = (r & 0xff) as u8;
        carry = r >> 8;
    }
    (out, carry != 0)
}

/// `x + y mod 2^256`
fn add_256bits(x: &[u8], y: &[u8]) -> [u8; 32] {
    let mut carry: u16 = 0;
    let mut out = [0u8; 32];
    for i in 0..32 {
        let r = (x[i] as u16) + (y[i] as u16) + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}
