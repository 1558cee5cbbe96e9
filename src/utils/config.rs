//! Signer Configuration
//!
//! Settings that shape how a signed transaction is produced:
//! - Witness-set encoding for freshly created vkey witness lists
//! - Input size guard
//! - Post-sign signature verification
//! - Master-key scheme for mnemonic input
//! - Debug logging
//!
//! Settings carry no key material and can be shared freely between threads.

use crate::error::{SignerError, SignerResult};
use crate::wallet::mnemonic::MasterKeyScheme;
use serde::{Deserialize, Serialize};

/// Environment variable names read by [`SignerSettings::from_env`]
pub mod env_keys {
    pub const TAG_WITNESS_SET: &str = "CARDANO_SIGNER_TAG_WITNESS_SET";
    pub const MAX_TX_BYTES: &str = "CARDANO_SIGNER_MAX_TX_BYTES";
    pub const VERIFY: &str = "CARDANO_SIGNER_VERIFY";
    pub const DEBUG: &str = "CARDANO_SIGNER_DEBUG";
    pub const MASTER_KEY: &str = "CARDANO_SIGNER_MASTER_KEY";
}

/// Default upper bound on decoded transaction size (Cardano's protocol
/// limit is 16 KiB, the guard leaves headroom for future parameters).
pub const DEFAULT_MAX_TX_BYTES: usize = 64 * 1024;

/// Preset the settings were built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerProfile {
    /// Conway-era encoding, signatures verified before return
    Standard,
    /// Standard plus a tighter size guard
    Strict,
    /// Pre-Conway encoding (untagged witness lists)
    Legacy,
    /// Any preset modified at runtime or from the environment
    Custom,
}

/// Signer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSettings {
    pub profile: SignerProfile,

    /// Emit new vkey witness lists wrapped in CBOR tag 258
    pub tag_new_witness_sets: bool,
    /// Reject transactions larger than this many bytes
    pub max_tx_bytes: usize,
    /// Verify each produced signature before returning it
    pub verify_after_sign: bool,
    /// How a mnemonic becomes a root key
    #[serde(default)]
    pub master_key_scheme: MasterKeyScheme,
    /// Turn on debug-level log output
    pub debug_logging: bool,
}

impl Default for SignerSettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl SignerSettings {
    /// Standard preset
    pub fn standard() -> Self {
        Self {
            profile: SignerProfile::Standard,
            tag_new_witness_sets: true,
            max_tx_bytes: DEFAULT_MAX_TX_BYTES,
            verify_after_sign: true,
            master_key_scheme: MasterKeyScheme::Icarus,
            debug_logging: false,
        }
    }

    /// Strict preset
    pub fn strict() -> Self {
        Self {
            profile: SignerProfile::Strict,
            max_tx_bytes: 16 * 1024,
            ..Self::standard()
        }
    }

    /// Legacy preset for pre-Conway tooling that rejects tagged sets
    pub fn legacy() -> Self {
        Self {
            profile: SignerProfile::Legacy,
            tag_new_witness_sets: false,
            ..Self::standard()
        }
    }

    /// Defaults overlaid with `CARDANO_SIGNER_*` environment variables.
    pub fn from_env() -> SignerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> SignerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::standard();
        let mut touched = false;

        if let Some(value) = lookup(env_keys::TAG_WITNESS_SET) {
            settings.tag_new_witness_sets = parse_flag(env_keys::TAG_WITNESS_SET, &value)?;
            touched = true;
        }
        if let Some(value) = lookup(env_keys::MAX_TX_BYTES) {
            settings.max_tx_bytes = value.trim().parse().map_err(|_| {
                SignerError::invalid_input(format!(
                    "{} must be a positive integer, got '{}'",
                    env_keys::MAX_TX_BYTES,
                    value
                ))
            })?;
            touched = true;
        }
        if let Some(value) = lookup(env_keys::VERIFY) {
            settings.verify_after_sign = parse_flag(env_keys::VERIFY, &value)?;
            touched = true;
        }
        if let Some(value) = lookup(env_keys::MASTER_KEY) {
            settings.master_key_scheme = value.parse()?;
            touched = true;
        }
        if let Some(value) = lookup(env_keys::DEBUG) {
            settings.debug_logging = parse_flag(env_keys::DEBUG, &value)?;
            touched = true;
        }

        if touched {
            settings.profile = SignerProfile::Custom;
        }

        if settings.max_tx_bytes == 0 {
            return Err(SignerError::invalid_input(format!(
                "{} must be greater than zero",
                env_keys::MAX_TX_BYTES
            )));
        }

        Ok(settings)
    }

    /// Warnings for combinations that are legal but unusual
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.verify_after_sign {
            warnings.push("Warning: Signatures are returned without verification".to_string());
        }

        if self.master_key_scheme == MasterKeyScheme::Ledger {
            warnings.push(
                "Warning: Ledger master keys differ from Daedalus/Yoroi wallets for the same phrase"
                    .to_string(),
            );
        }

        if self.max_tx_bytes < 1024 {
            warnings.push(format!(
                "Warning: max_tx_bytes={} rejects most real transactions",
                self.max_tx_bytes
            ));
        }

        warnings
    }
}

fn parse_flag(key: &str, value: &str) -> SignerResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SignerError::invalid_input(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}
