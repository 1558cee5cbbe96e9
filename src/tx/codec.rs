//! Transaction Codec
//!
//! Reads a Cardano transaction `[body, witness_set, is_valid?, aux]`
//! without re-serializing anything it does not change:
//! - the body is kept as its original bytes (the signing hash covers them)
//! - the witness set is re-encoded only after an insertion
//! - the validity flag and auxiliary data are carried verbatim

use super::witness::WitnessSet;
use crate::error::{ErrorCode, SignerError, SignerResult};
use crate::utils::crypto::blake2b256;
use crate::utils::sanitize;
use minicbor::data::{Tag, Type};
use minicbor::Decoder;
use thiserror::Error;

/// Body field keys read by the codec
pub mod body_keys {
    pub const INPUTS: u64 = 0;
    pub const OUTPUTS: u64 = 1;
    pub const FEE: u64 = 2;
    pub const TTL: u64 = 3;
    pub const REQUIRED_SIGNERS: u64 = 14;
}

const REQUIRED_BODY_KEYS: [u64; 3] = [body_keys::INPUTS, body_keys::OUTPUTS, body_keys::FEE];

/// Structural violations found while decoding
#[derive(Debug, Error)]
pub enum CodecFault {
    #[error("transaction must be an array of 3 or 4 items, found {0}")]
    ItemCount(u64),

    #[error("{what} must be a map, found {found}")]
    NotAMap { what: &'static str, found: Type },

    #[error("transaction body is missing required field {0}")]
    MissingBodyField(u64),

    #[error("{what} repeats key {key}")]
    DuplicateKey { what: &'static str, key: u64 },

    #[error("validity flag must be a boolean, found {0}")]
    ValidityFlag(Type),

    #[error("unexpected CBOR tag {0:?}")]
    UnexpectedTag(Tag),

    #[error("vkey witness must be a [vkey, signature] pair")]
    WitnessShape,

    #[error("{what} must be {expected} bytes, found {found}")]
    FieldLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{0} trailing bytes after the transaction")]
    TrailingBytes(usize),

    #[error(transparent)]
    Cbor(#[from] minicbor::decode::Error),
}

impl From<CodecFault> for SignerError {
    fn from(fault: CodecFault) -> Self {
        SignerError::malformed_transaction(format!("Malformed transaction: {}", fault))
    }
}

/// Walk the items of an array or the entries of a map, definite or not.
/// For maps `f` consumes one key and its value per call.
pub(crate) fn for_each_item<'b, F>(
    d: &mut Decoder<'b>,
    len: Option<u64>,
    mut f: F,
) -> Result<(), CodecFault>
where
    F: FnMut(&mut Decoder<'b>) -> Result<(), CodecFault>,
{
    match len {
        Some(n) => {
            for _ in 0..n {
                f(d)?;
            }
        }
        None => loop {
            if d.datatype()? == Type::Break {
                d.set_position(d.position() + 1);
                break;
            }
            f(d)?;
        },
    }
    Ok(())
}

/// Transaction body, held as its original encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
    raw: Vec<u8>,
    hash: [u8; 32],
    fee: u64,
    ttl: Option<u64>,
    input_count: u64,
    required_signers: Vec<[u8; 28]>,
}

impl TransactionBody {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecFault> {
        let start = d.position();
        let len = match d.datatype()? {
            Type::Map | Type::MapIndef => d.map()?,
            found => return Err(CodecFault::NotAMap { what: "transaction body", found }),
        };

        let mut seen: Vec<u64> = Vec::new();
        let mut fee = 0;
        let mut ttl = None;
        let mut input_count = 0;
        let mut required_signers = Vec::new();

        for_each_item(d, len, |d| {
            let key = d.u64()?;
            if seen.contains(&key) {
                return Err(CodecFault::DuplicateKey { what: "transaction body", key });
            }
            seen.push(key);

            match key {
                body_keys::INPUTS => input_count = count_set_items(d)?,
                body_keys::FEE => fee = d.u64()?,
                body_keys::TTL => ttl = Some(d.u64()?),
                body_keys::REQUIRED_SIGNERS => required_signers = decode_key_hashes(d)?,
                _ => d.skip()?,
            }
            Ok(())
        })?;

        if let Some(missing) = REQUIRED_BODY_KEYS.iter().find(|k| !seen.contains(k)) {
            return Err(CodecFault::MissingBodyField(*missing));
        }

        let raw = d.input()[start..d.position()].to_vec();
        let hash = blake2b256(&raw);
        Ok(Self {
            raw,
            hash,
            fee,
            ttl,
            input_count,
            required_signers,
        })
    }

    /// Original CBOR bytes
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Blake2b-256 of the original bytes: the transaction id and signing hash
    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Fee in lovelace
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Time-to-live slot, when set
    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    pub fn input_count(&self) -> u64 {
        self.input_count
    }

    /// Key hashes listed under required signers (empty when absent)
    pub fn required_signers(&self) -> &[[u8; 28]] {
        &self.required_signers
    }
}

/// Decoded transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    header: Vec<u8>,
    body: TransactionBody,
    witnesses: WitnessSet,
    trailer: Vec<u8>,
    is_valid: Option<bool>,
}

impl Transaction {
    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn witnesses(&self) -> &WitnessSet {
        &self.witnesses
    }

    pub fn witnesses_mut(&mut self) -> &mut WitnessSet {
        &mut self.witnesses
    }

    /// Phase-2 validity flag; `None` for the 3-item shape
    pub fn is_valid(&self) -> Option<bool> {
        self.is_valid
    }

    pub fn into_parts(self) -> (TransactionBody, WitnessSet) {
        (self.body, self.witnesses)
    }
}

/// Decode transaction bytes.
pub fn decode(bytes: &[u8]) -> SignerResult<Transaction> {
    Ok(decode_bytes(bytes)?)
}

/// Decode a hex transaction no larger than `max_bytes`.
pub fn decode_hex(tx_hex: &str, max_bytes: usize) -> SignerResult<Transaction> {
    let bytes = sanitize::decode_hex(
        tx_hex,
        "Transaction",
        ErrorCode::MalformedTransaction,
        max_bytes,
    )?;
    decode(&bytes)
}

fn decode_bytes(bytes: &[u8]) -> Result<Transaction, CodecFault> {
    let mut d = Decoder::new(bytes);

    let len = d.array()?;
    if let Some(n) = len {
        if !(3..=4).contains(&n) {
            return Err(CodecFault::ItemCount(n));
        }
    }
    let header = bytes[..d.position()].to_vec();

    let body = TransactionBody::decode(&mut d)?;
    let witnesses = WitnessSet::decode(&mut d)?;

    let trailer_start = d.position();
    let is_valid = decode_trailer(&mut d, len)?;
    let trailer = bytes[trailer_start..d.position()].to_vec();

    if d.position() != bytes.len() {
        return Err(CodecFault::TrailingBytes(bytes.len() - d.position()));
    }

    Ok(Transaction {
        header,
        body,
        witnesses,
        trailer,
        is_valid,
    })
}

/// Validity flag (4-item shape) and auxiliary data, plus the closing
/// break of an indefinite array.
fn decode_trailer(d: &mut Decoder<'_>, len: Option<u64>) -> Result<Option<bool>, CodecFault> {
    let mut items = 2u64;
    let mut first: Option<(Type, Option<bool>)> = None;

    loop {
        match len {
            Some(n) if items == n => break,
            None if d.datatype()? == Type::Break => {
                d.set_position(d.position() + 1);
                break;
            }
            _ => {}
        }
        if items == 4 {
            return Err(CodecFault::ItemCount(items + 1));
        }

        let ty = d.datatype()?;
        let flag = if ty == Type::Bool {
            Some(d.bool()?)
        } else {
            d.skip()?;
            None
        };
        if first.is_none() {
            first = Some((ty, flag));
        }
        items += 1;
    }

    match (items, first) {
        (4, Some((Type::Bool, flag))) => Ok(flag),
        (4, Some((found, _))) => Err(CodecFault::ValidityFlag(found)),
        (3, _) => Ok(None),
        (n, _) => Err(CodecFault::ItemCount(n)),
    }
}

/// Count the items of a (possibly tag-258) set.
fn count_set_items(d: &mut Decoder<'_>) -> Result<u64, CodecFault> {
    skip_set_tag(d)?;
    let len = d.array()?;
    let mut count = 0;
    for_each_item(d, len, |d| {
        d.skip()?;
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

fn decode_key_hashes(d: &mut Decoder<'_>) -> Result<Vec<[u8; 28]>, CodecFault> {
    skip_set_tag(d)?;
    let len = d.array()?;
    let mut hashes = Vec::new();
    for_each_item(d, len, |d| {
        let bytes = d.bytes()?;
        let hash: [u8; 28] = bytes.try_into().map_err(|_| CodecFault::FieldLength {
            what: "required signer",
            expected: 28,
            found: bytes.len(),
        })?;
        hashes.push(hash);
        Ok(())
    })?;
    Ok(hashes)
}

fn skip_set_tag(d: &mut Decoder<'_>) -> Result<(), CodecFault> {
    if d.datatype()? == Type::Tag {
        let tag = d.tag()?;
        if tag != Tag::Unassigned(super::witness::SET_TAG) {
            return Err(CodecFault::UnexpectedTag(tag));
        }
    }
    Ok(())
}

/// Encode a transaction. An unmodified transaction encodes to its input bytes.
pub fn encode(tx: &Transaction) -> SignerResult<Vec<u8>> {
    let witnesses = tx.witnesses.to_bytes()?;
    let mut out = Vec::with_capacity(
        tx.header.len() + tx.body.raw.len() + witnesses.len() + tx.trailer.len(),
    );
    out.extend_from_slice(&tx.header);
    out.extend_from_slice(&tx.body.raw);
    out.extend_from_slice(&witnesses);
    out.extend_from_slice(&tx.trailer);
    Ok(out)
}

pub fn encode_hex(tx: &Transaction) -> SignerResult<String> {
    Ok(hex::encode(encode(tx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ed25519::{Signature, VerificationKey};
    use crate::tx::witness::VkeyWitness;

    const UNSIGNED_TX: &str = "84a400818258203b40265111d8bb3c3c608d95b3a0bf83461ace32d79336579a1939b3aad1c0b70001818258390100b7847c89d5721592fc0cc8932f50a8f8258b39b93861140a1b99fbc2f45a16a6685616e566c00fc081fe59f8bd7ab679ee15e9ce2034461a000f4240021a00029151031a02faf080a0f5f6";
    const BODY_HASH: &str = "56bc81c0e6b4c582fb2a1e260efb5caab1991759c8e4693a72b8b933b32314c0";

    fn fixture() -> Vec<u8> {
        hex::decode(UNSIGNED_TX).unwrap()
    }

    #[test]
    fn test_decode_fixture() {
        let tx = decode(&fixture()).unwrap();
        assert_eq!(tx.body().hash_hex(), BODY_HASH);
        assert_eq!(tx.body().fee(), 168_273);
        assert_eq!(tx.body().ttl(), Some(50_000_000));
        assert_eq!(tx.body().input_count(), 1);
        assert!(tx.body().required_signers().is_empty());
        assert_eq!(tx.is_valid(), Some(true));
        assert!(tx.witnesses().vkey_witnesses().is_empty());
    }

    #[test]
    fn test_unmodified_round_trip() {
        let tx = decode_hex(UNSIGNED_TX, 1024).unwrap();
        assert_eq!(encode_hex(&tx).unwrap(), UNSIGNED_TX);
    }

    #[test]
    fn test_three_item_shape() {
        // [body, {}, null]
        let mut bytes = fixture();
        bytes[0] = 0x83;
        bytes.truncate(bytes.len() - 2);
        bytes.push(0xf6);
        let tx = decode(&bytes).unwrap();
        assert_eq!(tx.is_valid(), None);
        assert_eq!(encode(&tx).unwrap(), bytes);
    }

    #[test]
    fn test_indefinite_top_level_array() {
        let mut bytes = fixture();
        bytes[0] = 0x9f;
        bytes.push(0xff);
        let tx = decode(&bytes).unwrap();
        assert_eq!(tx.is_valid(), Some(true));
        assert_eq!(encode(&tx).unwrap(), bytes);
    }

    #[test]
    fn test_insert_changes_only_witness_set() {
        let mut tx = decode(&fixture()).unwrap();
        tx.witnesses_mut().insert(
            VkeyWitness::new(
                VerificationKey::from_bytes([1; 32]),
                Signature::from_bytes([2; 64]),
            ),
            true,
        );
        let out = encode(&tx).unwrap();
        let again = decode(&out).unwrap();
        assert_eq!(again.body(), tx.body());
        assert_eq!(again.witnesses().vkey_witnesses().len(), 1);
        assert_eq!(&out[out.len() - 2..], &[0xf5, 0xf6]);
    }

    #[test]
    fn test_rejects_structural_errors() {
        // Not an array
        assert_eq!(decode(&[0xa0]).unwrap_err().code, ErrorCode::MalformedTransaction);

        // Wrong item count
        let err = decode(&[0x82, 0xa0, 0xa0]).unwrap_err();
        assert!(err.message.contains("3 or 4 items"));

        // Truncated
        let bytes = fixture();
        let err = decode(&bytes[..bytes.len() - 10]).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedTransaction);

        // Trailing garbage
        let mut bytes = fixture();
        bytes.push(0x00);
        let err = decode(&bytes).unwrap_err();
        assert!(err.message.contains("trailing"));

        // Validity flag not a bool
        let mut bytes = fixture();
        let at = bytes.len() - 2;
        bytes[at] = 0xf6;
        let err = decode(&bytes).unwrap_err();
        assert!(err.message.contains("validity flag"));
    }

    #[test]
    fn test_rejects_body_without_fee() {
        // [{0: [], 1: []}, {}, true, null]
        let bytes = hex::decode("84a200800180a0f5f6").unwrap();
        let err = decode(&bytes).unwrap_err();
        assert!(err.message.contains("missing required field 2"));
    }

    #[test]
    fn test_required_signers_decoded() {
        // [{0: [], 1: [], 2: 0, 14: 258([h'..' x28])}, {}, true, null]
        let mut bytes = hex::decode("84a4008001800200").unwrap();
        bytes.extend_from_slice(&[0x0e, 0xd9, 0x01, 0x02, 0x81, 0x58, 0x1c]);
        bytes.extend_from_slice(&[0xab; 28]);
        bytes.extend_from_slice(&[0xa0, 0xf5, 0xf6]);

        let tx = decode(&bytes).unwrap();
        assert_eq!(tx.body().required_signers(), &[[0xab; 28]]);
        assert_eq!(tx.body().input_count(), 0);
        assert_eq!(tx.body().ttl(), None);
    }

    #[test]
    fn test_hex_errors() {
        let err = decode_hex("not-valid-hex", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedTransaction);

        let err = decode_hex(UNSIGNED_TX, 16).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
