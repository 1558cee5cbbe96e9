//! Raw key material
//!
//! A signing key handed over as-is, with no derivation:
//! - 32 raw bytes or 64 hex characters (optional `0x`)
//! - CBOR-wrapped hex as found in `cborHex` (`5820 || key`)
//! - a cardano-cli text envelope (`*.skey` JSON)

use crate::crypto::ed25519::SigningKey;
use crate::error::{ErrorCode, SignerError, SignerResult};
use crate::utils::sanitize::{decode_hex, limits};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const RAW_KEY_SIZE: usize = 32;

/// `kL || kR || A || chain_code` inside an extended `.skey`
const EXTENDED_SKEY_SIZE: usize = 128;

/// Cardano-style JSON text envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEnvelope {
    /// Type descriptor (e.g., "PaymentSigningKeyShelley_ed25519")
    #[serde(rename = "type")]
    pub key_type: String,

    #[serde(default)]
    pub description: String,

    /// CBOR-encoded key material as hex
    #[serde(rename = "cborHex")]
    pub cbor_hex: String,
}

impl TextEnvelope {
    pub fn is_signing_key(&self) -> bool {
        self.key_type.contains("SigningKey")
    }

    pub fn is_extended(&self) -> bool {
        self.key_type.contains("Extended")
    }
}

/// Signing key from exactly 32 raw bytes.
pub fn from_raw(bytes: &[u8]) -> SignerResult<SigningKey> {
    let seed: Zeroizing<[u8; RAW_KEY_SIZE]> = Zeroizing::new(bytes.try_into().map_err(|_| {
        SignerError::invalid_key_length(format!(
            "Raw Ed25519 key must be {} bytes, got {}",
            RAW_KEY_SIZE,
            bytes.len()
        ))
    })?);
    Ok(SigningKey::from_normal_bytes(&seed))
}

/// Signing key from hex, with or without the CBOR `5820` header.
pub fn from_raw_hex(input: &str) -> SignerResult<SigningKey> {
    let bytes = Zeroizing::new(decode_hex(
        input,
        "Raw key",
        ErrorCode::InvalidEncoding,
        limits::MAX_KEY_FILE_SIZE,
    )?);
    from_raw(strip_cbor_bytes_header(&bytes)?)
}

/// Signing key from a cardano-cli text envelope.
pub fn from_text_envelope(json: &str) -> SignerResult<SigningKey> {
    if json.len() > limits::MAX_KEY_FILE_SIZE {
        return Err(SignerError::invalid_input(format!(
            "Key file exceeds {} bytes",
            limits::MAX_KEY_FILE_SIZE
        )));
    }

    let envelope: TextEnvelope = serde_json::from_str(json)?;
    if !envelope.is_signing_key() {
        return Err(SignerError::invalid_encoding(format!(
            "Text envelope of type '{}' is not a signing key",
            envelope.key_type
        )));
    }

    let cbor = Zeroizing::new(decode_hex(
        &envelope.cbor_hex,
        "cborHex",
        ErrorCode::InvalidEncoding,
        limits::MAX_KEY_FILE_SIZE,
    )?);
    let payload = strip_cbor_bytes_header(&cbor)?;

    if envelope.is_extended() {
        return from_extended_skey(payload);
    }
    from_raw(payload)
}

/// Accept any raw form: text envelope JSON or hex.
pub fn parse_raw_key(input: &str) -> SignerResult<SigningKey> {
    if input.trim_start().starts_with('{') {
        from_text_envelope(input)
    } else {
        from_raw_hex(input)
    }
}

fn from_extended_skey(payload: &[u8]) -> SignerResult<SigningKey> {
    if payload.len() != EXTENDED_SKEY_SIZE {
        return Err(SignerError::invalid_key_length(format!(
            "Extended signing key must be {} bytes, got {}",
            EXTENDED_SKEY_SIZE,
            payload.len()
        )));
    }

    let mut secret = Zeroizing::new([0u8; 64]);
    secret.copy_from_slice(&payload[..64]);
    let key = SigningKey::from_extended_bytes(&secret)?;

    if key.verification_key().as_bytes()[..] != payload[64..96] {
        return Err(SignerError::invalid_encoding(
            "Extended signing key does not match its embedded public key",
        ));
    }
    Ok(key)
}

/// Strip a CBOR byte-string header (`0x58 len` or `0x40..0x57`) when present
/// and consistent with the payload length.
fn strip_cbor_bytes_header(bytes: &[u8]) -> SignerResult<&[u8]> {
    if bytes.len() == RAW_KEY_SIZE {
        return Ok(bytes);
    }

    let mut decoder = minicbor::Decoder::new(bytes);
    match decoder.bytes() {
        Ok(inner) if decoder.position() == bytes.len() => Ok(inner),
        _ => Err(SignerError::invalid_key_length(format!(
            "Raw Ed25519 key must be {} bytes, got {}",
            RAW_KEY_SIZE,
            bytes.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY_PUB: &str = "03a107bff3ce10be1d70dd18e74bc09967e4d6309ba50d5f1ddc8664125531b8";

    #[test]
    fn test_from_raw_bytes() {
        let bytes: Vec<u8> = (0u8..32).collect();
        let key = from_raw(&bytes).unwrap();
        assert_eq!(key.verification_key().to_hex(), KEY_PUB);
        assert!(!key.is_extended());
    }

    #[test]
    fn test_from_raw_wrong_length() {
        let err = from_raw(&[1u8; 31]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidKeyLength);
        let err = from_raw(&[1u8; 64]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidKeyLength);
    }

    #[test]
    fn test_from_hex_variants() {
        for input in [
            KEY_HEX.to_string(),
            format!("0x{}", KEY_HEX),
            format!("5820{}", KEY_HEX),
            format!("  {}\n", KEY_HEX.to_uppercase()),
        ] {
            let key = from_raw_hex(&input).unwrap();
            assert_eq!(key.verification_key().to_hex(), KEY_PUB, "input {}", input);
        }
    }

    #[test]
    fn test_from_hex_errors() {
        assert_eq!(from_raw_hex("abcd").unwrap_err().code, ErrorCode::InvalidKeyLength);
        assert_eq!(from_raw_hex("xyz!").unwrap_err().code, ErrorCode::InvalidEncoding);
        // Header claims 32 bytes but 31 follow
        let truncated = format!("5820{}", &KEY_HEX[..62]);
        assert_eq!(from_raw_hex(&truncated).unwrap_err().code, ErrorCode::InvalidKeyLength);
    }

    #[test]
    fn test_text_envelope() {
        let json = format!(
            r#"{{"type": "PaymentSigningKeyShelley_ed25519", "description": "Payment Signing Key", "cborHex": "5820{}"}}"#,
            KEY_HEX
        );
        let key = parse_raw_key(&json).unwrap();
        assert_eq!(key.verification_key().to_hex(), KEY_PUB);
    }

    #[test]
    fn test_text_envelope_rejects_verification_key() {
        let json = format!(
            r#"{{"type": "PaymentVerificationKeyShelley_ed25519", "description": "", "cborHex": "5820{}"}}"#,
            KEY_PUB
        );
        let err = from_text_envelope(&json).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidEncoding);
    }

    #[test]
    fn test_extended_text_envelope() {
        let mut secret = [0u8; 64];
        secret[0] = 0x48;
        secret[31] = 0x40;
        secret[40] = 0x11;
        let key = SigningKey::from_extended_bytes(&secret).unwrap();
        let public = key.verification_key();

        let mut payload = secret.to_vec();
        payload.extend_from_slice(public.as_bytes());
        payload.extend_from_slice(&[0x22; 32]);

        let json = format!(
            r#"{{"type": "PaymentExtendedSigningKeyShelley_ed25519_bip32", "description": "", "cborHex": "5880{}"}}"#,
            hex::encode(&payload)
        );
        let parsed = from_text_envelope(&json).unwrap();
        assert!(parsed.is_extended());
        assert_eq!(parsed.verification_key(), public);

        // Corrupt the embedded public key
        payload[70] ^= 0xff;
        let json = format!(
            r#"{{"type": "PaymentExtendedSigningKeyShelley_ed25519_bip32", "description": "", "cborHex": "5880{}"}}"#,
            hex::encode(&payload)
        );
        assert_eq!(from_text_envelope(&json).unwrap_err().code, ErrorCode::InvalidEncoding);
    }

    #[test]
    fn test_malformed_envelope() {
        let err = parse_raw_key("{ not json").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
