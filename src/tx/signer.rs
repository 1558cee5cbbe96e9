//! Transaction Signer
//!
//! One linear pipeline per call: decode the transaction, hash the body,
//! resolve the leaf key, sign, insert the witness, re-encode. A call
//! either returns the complete signed transaction or a single error.
//!
//! [`Signer`] holds settings only. Key material lives in the caller's
//! [`KeyMaterial`] and the leaf key is dropped (and wiped) before return.

use super::codec::{self, Transaction};
use super::witness::VkeyWitness;
use crate::crypto::ed25519::SigningKey;
use crate::error::SignerResult;
use crate::types::{PublicKeyInfo, SignedTransaction};
use crate::utils::config::SignerSettings;
use crate::utils::logging::{LogEntry, LogLevel};
use crate::wallet::derivation_path::PathSpec;
use crate::wallet::key_material::{resolve_signing_key, KeyMaterial};

/// Configured signer. Cheap to clone and safe to share between threads.
#[derive(Debug, Clone, Default)]
pub struct Signer {
    settings: SignerSettings,
}

impl Signer {
    pub fn new(settings: SignerSettings) -> Self {
        Self { settings }
    }

    /// Signer configured from `CARDANO_SIGNER_*` environment variables
    pub fn from_env() -> SignerResult<Self> {
        Ok(Self::new(SignerSettings::from_env()?))
    }

    pub fn settings(&self) -> &SignerSettings {
        &self.settings
    }

    /// Sign `tx_hex` with the key `material` resolves to at `path`.
    pub fn sign(
        &self,
        material: &KeyMaterial,
        path: impl Into<PathSpec>,
        tx_hex: &str,
    ) -> SignerResult<SignedTransaction> {
        let tx = codec::decode_hex(tx_hex, self.settings.max_tx_bytes)?;
        let path = path.into().resolve()?;

        for warning in path.validate() {
            crate::log_warn!("signer", "Unusual derivation path", path = path, warning = warning);
        }

        let key = resolve_signing_key(material, &path, self.settings.master_key_scheme)?;
        LogEntry::new(LogLevel::Debug, "signer", "Resolved signing key")
            .field("source", material.kind())
            .field("path", &path)
            .field("extended", key.is_extended())
            .emit(self.settings.debug_logging);

        self.sign_decoded(tx, &key)
    }

    /// Same as [`Signer::sign`], returning only the signed hex.
    pub fn sign_hex(
        &self,
        material: &KeyMaterial,
        path: impl Into<PathSpec>,
        tx_hex: &str,
    ) -> SignerResult<String> {
        Ok(self.sign(material, path, tx_hex)?.tx_hex)
    }

    /// Sign with an already resolved leaf key.
    pub fn sign_with_key(&self, key: &SigningKey, tx_hex: &str) -> SignerResult<SignedTransaction> {
        let tx = codec::decode_hex(tx_hex, self.settings.max_tx_bytes)?;
        self.sign_decoded(tx, key)
    }

    /// Verification key for `material` at `path`, with its key hash.
    pub fn public_key(
        &self,
        material: &KeyMaterial,
        path: impl Into<PathSpec>,
    ) -> SignerResult<PublicKeyInfo> {
        let path = path.into().resolve()?;
        let vkey = resolve_signing_key(material, &path, self.settings.master_key_scheme)?
            .verification_key();

        Ok(PublicKeyInfo {
            public_key: vkey.to_hex(),
            key_hash: hex::encode(vkey.key_hash()),
            path: path.to_string(),
        })
    }

    fn sign_decoded(&self, mut tx: Transaction, key: &SigningKey) -> SignerResult<SignedTransaction> {
        let hash = *tx.body().hash();
        let vkey = key.verification_key();
        LogEntry::new(LogLevel::Debug, "signer", "Signing transaction")
            .field("tx_hash", hex::encode(hash))
            .field("existing_witnesses", tx.witnesses().vkey_witnesses().len())
            .emit(self.settings.debug_logging);

        let required = tx.body().required_signers();
        if !required.is_empty() && !required.contains(&vkey.key_hash()) {
            crate::log_warn!(
                "signer",
                "Signing key is not among the body's required signers",
                public_key = vkey.to_hex(),
                required = required.len()
            );
        }

        let witness = VkeyWitness::new(vkey, key.sign(&hash));
        if self.settings.verify_after_sign {
            witness.verify(&hash)?;
        }

        let replaced = tx
            .witnesses_mut()
            .insert(witness, self.settings.tag_new_witness_sets);
        let witness_count = tx.witnesses().vkey_witnesses().len();
        let tx_hex = codec::encode_hex(&tx)?;

        crate::log_info!(
            "signer",
            "Transaction signed",
            tx_hash = hex::encode(hash),
            public_key = vkey.to_hex(),
            witnesses = witness_count,
            replaced = replaced
        );

        Ok(SignedTransaction {
            tx_hex,
            tx_hash: hex::encode(hash),
            public_key: vkey.to_hex(),
            witness_count,
            replaced,
        })
    }
}

/// Sign with a BIP-39 phrase (Icarus master key).
pub fn sign_with_mnemonic(
    phrase: &str,
    passphrase: &str,
    path: impl Into<PathSpec>,
    tx_hex: &str,
) -> SignerResult<String> {
    Signer::default().sign_hex(&KeyMaterial::mnemonic(phrase, passphrase), path, tx_hex)
}

/// Sign with a bech32 extended signing key.
pub fn sign_with_bech32(encoded: &str, path: impl Into<PathSpec>, tx_hex: &str) -> SignerResult<String> {
    Signer::default().sign_hex(&KeyMaterial::bech32(encoded), path, tx_hex)
}

/// Sign with a raw key given as hex, CBOR hex or a text envelope.
pub fn sign_with_raw_key(key: &str, tx_hex: &str) -> SignerResult<String> {
    Signer::default().sign_hex(&KeyMaterial::raw_text(key), "m", tx_hex)
}

/// Sign with 32 raw key bytes.
pub fn sign_with_raw_bytes(key: &[u8], tx_hex: &str) -> SignerResult<String> {
    Signer::default().sign_hex(&KeyMaterial::raw_bytes(key), "m", tx_hex)
}

/// Hex verification key for `material` at `path`.
pub fn public_key(material: &KeyMaterial, path: impl Into<PathSpec>) -> SignerResult<String> {
    Ok(Signer::default().public_key(material, path)?.public_key)
}
