//! Key Derivation Paths
//!
//! Parses and validates CIP-1852 derivation paths:
//! - `m/1852'/1815'/account'/role/index` free-form strings
//! - the legacy `(account, key_index)` pair, normalized to a path
//! - warnings for paths outside the Shelley wallet layout

use crate::error::{SignerError, SignerResult};
use crate::utils::sanitize::sanitize_path;
use std::fmt;
use std::str::FromStr;

pub use crate::crypto::bip32_ed25519::HARDENED;

/// CIP-1852 constants
pub mod cip1852 {
    pub const PURPOSE: u32 = 1852;
    pub const COIN_TYPE: u32 = 1815;

    /// Chain roles (fourth path component)
    pub mod roles {
        pub const EXTERNAL: u32 = 0;
        pub const INTERNAL: u32 = 1;
        pub const STAKING: u32 = 2;
        pub const DREP: u32 = 3;
        pub const CC_COLD: u32 = 4;
        pub const CC_HOT: u32 = 5;
    }
}

/// Byron-era purpose, still met in restored wallets
pub const BIP44_PURPOSE: u32 = 44;

/// Parsed derivation path. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivationPath {
    components: Vec<DerivationComponent>,
}

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    pub fn hardened(index: u32) -> Self {
        Self::new(index, true)
    }

    pub fn soft(index: u32) -> Self {
        Self::new(index, false)
    }

    /// Get the full index including hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl DerivationPath {
    /// The empty path: derivation returns the root key unchanged
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path string such as `m/1852'/1815'/0'/0/0`
    pub fn parse(path: &str) -> SignerResult<Self> {
        let trimmed = sanitize_path(path)?;

        let rest = match trimmed {
            "m" | "M" => return Ok(Self::root()),
            _ => trimmed
                .strip_prefix("m/")
                .or_else(|| trimmed.strip_prefix("M/"))
                .ok_or_else(|| {
                    SignerError::invalid_input("Derivation path must start with 'm/'")
                        .with_details(format!("got '{}'", trimmed))
                })?,
        };

        let components = rest
            .split('/')
            .map(parse_component)
            .collect::<SignerResult<Vec<_>>>()?;

        Ok(Self { components })
    }

    /// `m/1852'/1815'/account'/role/index`
    pub fn cip1852(account: u32, role: u32, index: u32) -> SignerResult<Self> {
        for (name, value) in [("account", account), ("role", role), ("index", index)] {
            if value >= HARDENED {
                return Err(SignerError::invalid_input(format!(
                    "CIP-1852 {} {} exceeds maximum value",
                    name, value
                )));
            }
        }

        Ok(Self {
            components: vec![
                DerivationComponent::hardened(cip1852::PURPOSE),
                DerivationComponent::hardened(cip1852::COIN_TYPE),
                DerivationComponent::hardened(account),
                DerivationComponent::soft(role),
                DerivationComponent::soft(index),
            ],
        })
    }

    /// Legacy `(account, key_index)` form: external payment chain
    pub fn from_index_pair(account: u32, key_index: u32) -> SignerResult<Self> {
        Self::cip1852(account, cip1852::roles::EXTERNAL, key_index)
    }

    pub fn components(&self) -> &[DerivationComponent] {
        &self.components
    }

    /// Full indices (hardened bit applied), root to leaf
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.components.iter().map(DerivationComponent::full_index)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Warnings for paths that parse but sit outside the CIP-1852 layout
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let get = |i: usize| self.components.get(i);

        if let Some(purpose) = get(0) {
            match purpose.index {
                cip1852::PURPOSE => {}
                BIP44_PURPOSE => warnings.push(
                    "BIP44 purpose derives Byron-era keys - Shelley wallets use 1852'".to_string(),
                ),
                other => warnings.push(format!(
                    "Non-standard purpose: {}. Cardano wallets use 1852'",
                    other
                )),
            }
        }

        if let Some(coin_type) = get(1) {
            if coin_type.index != cip1852::COIN_TYPE {
                warnings.push(format!(
                    "Coin type {} is not Cardano (expected {})",
                    coin_type.index,
                    cip1852::COIN_TYPE
                ));
            }
        }

        if let Some(account) = get(2) {
            if account.index > 100 {
                warnings.push(format!(
                    "Unusual account number: {}. Most wallets use 0",
                    account.index
                ));
            }
        }

        if let Some(role) = get(3) {
            if role.index > cip1852::roles::CC_HOT {
                warnings.push(format!(
                    "Non-standard role: {}. Known roles are 0-5",
                    role.index
                ));
            }
        }

        if let Some(index) = get(4) {
            if index.index > 10000 {
                warnings.push(format!(
                    "Very high address index: {}. This may indicate a problem",
                    index.index
                ));
            }
        }

        let has_unhardened_before_role = self.components.iter().take(3).any(|c| !c.hardened);
        if has_unhardened_before_role {
            warnings.push("Purpose, coin type, and account should be hardened (')".to_string());
        }

        if self.components.iter().skip(3).any(|c| c.hardened) {
            warnings.push(
                "Hardened role or index cannot be derived from an account public key".to_string(),
            );
        }

        warnings
    }
}

impl FromStr for DerivationPath {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse a single path component
fn parse_component(s: &str) -> SignerResult<DerivationComponent> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(SignerError::invalid_input("Empty path component"));
    }

    // Check for hardened indicator
    let (number_str, hardened) = match trimmed.strip_suffix(['\'', 'h', 'H']) {
        Some(number) => (number, true),
        None => (trimmed, false),
    };

    let index: u32 = number_str.parse().map_err(|e| {
        SignerError::invalid_input(format!("Invalid path component '{}'", s))
            .with_details(format!("{}", e))
    })?;

    // Check for overflow (excluding hardened bit)
    if index >= HARDENED {
        return Err(SignerError::invalid_input(format!(
            "Path component {} exceeds maximum value",
            index
        )));
    }

    Ok(DerivationComponent::new(index, hardened))
}

/// Either call shape accepted at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    /// Free-form path string
    Path(String),
    /// Legacy `(account, key_index)` pair
    IndexPair { account: u32, key_index: u32 },
    /// Already parsed
    Parsed(DerivationPath),
}

impl PathSpec {
    /// Normalize to a [`DerivationPath`]
    pub fn resolve(&self) -> SignerResult<DerivationPath> {
        match self {
            PathSpec::Path(path) => DerivationPath::parse(path),
            PathSpec::IndexPair { account, key_index } => {
                DerivationPath::from_index_pair(*account, *key_index)
            }
            PathSpec::Parsed(path) => Ok(path.clone()),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        PathSpec::Path(path.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        PathSpec::Path(path)
    }
}

impl From<(u32, u32)> for PathSpec {
    fn from((account, key_index): (u32, u32)) -> Self {
        PathSpec::IndexPair { account, key_index }
    }
}

impl From<DerivationPath> for PathSpec {
    fn from(path: DerivationPath) -> Self {
        PathSpec::Parsed(path)
    }
}
