//! Transaction witness set
//!
//! Only the vkey witness list (key 0) is decoded. Every other witness
//! field (scripts, datums, redeemers, bootstrap witnesses) is carried as
//! raw CBOR so it re-encodes byte-for-byte.

use super::codec::{for_each_item, CodecFault};
use crate::crypto::ed25519::{Signature, VerificationKey, SIGNATURE_SIZE};
use crate::crypto::bip32_ed25519::PUBLIC_KEY_SIZE;
use crate::error::{SignerError, SignerResult};
use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};
use std::convert::Infallible;

/// Witness set key of the vkey witness list
pub const VKEY_WITNESSES_KEY: u64 = 0;

/// CBOR tag marking a Conway-era set
pub const SET_TAG: u64 = 258;

/// `[vkey, signature]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VkeyWitness {
    pub vkey: VerificationKey,
    pub signature: Signature,
}

impl VkeyWitness {
    pub fn new(vkey: VerificationKey, signature: Signature) -> Self {
        Self { vkey, signature }
    }

    /// Check the signature over a body hash
    pub fn verify(&self, body_hash: &[u8; 32]) -> SignerResult<()> {
        self.vkey.verify(body_hash, &self.signature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    VkeyWitnesses,
    Raw { key: u64, value: Vec<u8> },
}

/// Decoded witness set.
///
/// Keeps its original encoding until the first insertion, so an untouched
/// set is emitted exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessSet {
    original: Vec<u8>,
    entries: Vec<Entry>,
    vkeys: Vec<VkeyWitness>,
    vkeys_tagged: bool,
    modified: bool,
}

impl WitnessSet {
    /// Empty set (encodes as `a0`)
    pub fn new() -> Self {
        Self {
            original: vec![0xa0],
            entries: Vec::new(),
            vkeys: Vec::new(),
            vkeys_tagged: false,
            modified: false,
        }
    }

    pub(crate) fn decode(d: &mut Decoder<'_>) -> Result<Self, CodecFault> {
        let start = d.position();
        let len = match d.datatype()? {
            Type::Map | Type::MapIndef => d.map()?,
            found => return Err(CodecFault::NotAMap { what: "witness set", found }),
        };

        let mut entries = Vec::new();
        let mut vkeys = Vec::new();
        let mut vkeys_tagged = false;

        for_each_item(d, len, |d| {
            let key = d.u64()?;
            if key == VKEY_WITNESSES_KEY {
                if entries.contains(&Entry::VkeyWitnesses) {
                    return Err(CodecFault::DuplicateKey { what: "witness set", key });
                }
                vkeys_tagged = decode_vkey_witnesses(d, &mut vkeys)?;
                entries.push(Entry::VkeyWitnesses);
            } else {
                let value_start = d.position();
                d.skip()?;
                let value = d.input()[value_start..d.position()].to_vec();
                entries.push(Entry::Raw { key, value });
            }
            Ok(())
        })?;

        Ok(Self {
            original: d.input()[start..d.position()].to_vec(),
            entries,
            vkeys,
            vkeys_tagged,
            modified: false,
        })
    }

    pub fn vkey_witnesses(&self) -> &[VkeyWitness] {
        &self.vkeys
    }

    pub fn find(&self, vkey: &VerificationKey) -> Option<&VkeyWitness> {
        self.vkeys.iter().find(|w| &w.vkey == vkey)
    }

    /// Number of witness set fields, the vkey list included
    pub fn field_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Add `witness`, replacing any witness under the same verification key.
    ///
    /// A vkey list created here is tagged 258 when `tag_new_list` is set; an
    /// existing list keeps its own encoding. Duplicates already in the list
    /// collapse to the last one read. Returns true on replacement.
    pub fn insert(&mut self, witness: VkeyWitness, tag_new_list: bool) -> bool {
        if !self.modified {
            self.collapse_duplicates();
        }
        self.modified = true;

        if !self.entries.contains(&Entry::VkeyWitnesses) {
            let position = self
                .entries
                .iter()
                .position(|e| matches!(e, Entry::Raw { key, .. } if *key > VKEY_WITNESSES_KEY))
                .unwrap_or(self.entries.len());
            self.entries.insert(position, Entry::VkeyWitnesses);
            self.vkeys_tagged = tag_new_list;
        }

        match self.vkeys.iter_mut().find(|w| w.vkey == witness.vkey) {
            Some(slot) => {
                *slot = witness;
                true
            }
            None => {
                self.vkeys.push(witness);
                false
            }
        }
    }

    /// One witness per verification key, keeping the first position and
    /// the last signature seen.
    fn collapse_duplicates(&mut self) {
        let mut collapsed: Vec<VkeyWitness> = Vec::with_capacity(self.vkeys.len());
        for witness in self.vkeys.drain(..) {
            match collapsed.iter_mut().find(|w| w.vkey == witness.vkey) {
                Some(slot) => *slot = witness,
                None => collapsed.push(witness),
            }
        }
        self.vkeys = collapsed;
    }

    /// CBOR encoding: the original bytes when untouched, otherwise a
    /// definite map in the original key order.
    pub fn to_bytes(&self) -> SignerResult<Vec<u8>> {
        if !self.modified {
            return Ok(self.original.clone());
        }
        self.encode_modified()
            .map_err(|e| SignerError::internal(format!("Witness set encoding failed: {}", e)))
    }

    fn encode_modified(&self) -> Result<Vec<u8>, minicbor::encode::Error<Infallible>> {
        let mut e = Encoder::new(Vec::new());
        e.map(self.entries.len() as u64)?;

        for entry in &self.entries {
            match entry {
                Entry::VkeyWitnesses => {
                    e.u64(VKEY_WITNESSES_KEY)?;
                    if self.vkeys_tagged {
                        e.tag(Tag::Unassigned(SET_TAG))?;
                    }
                    e.array(self.vkeys.len() as u64)?;
                    for witness in &self.vkeys {
                        e.array(2)?
                            .bytes(witness.vkey.as_bytes())?
                            .bytes(witness.signature.as_bytes())?;
                    }
                }
                Entry::Raw { key, value } => {
                    e.u64(*key)?;
                    e.writer_mut().extend_from_slice(value);
                }
            }
        }

        Ok(e.into_writer())
    }
}

impl Default for WitnessSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns whether the list carried tag 258.
fn decode_vkey_witnesses(
    d: &mut Decoder<'_>,
    out: &mut Vec<VkeyWitness>,
) -> Result<bool, CodecFault> {
    let tagged = if d.datatype()? == Type::Tag {
        let tag = d.tag()?;
        if tag != Tag::Unassigned(SET_TAG) {
            return Err(CodecFault::UnexpectedTag(tag));
        }
        true
    } else {
        false
    };

    let len = d.array()?;
    for_each_item(d, len, |d| {
        if d.array()? != Some(2) {
            return Err(CodecFault::WitnessShape);
        }
        let vkey: [u8; PUBLIC_KEY_SIZE] = fixed_bytes(d, "vkey")?;
        let signature: [u8; SIGNATURE_SIZE] = fixed_bytes(d, "signature")?;
        out.push(VkeyWitness::new(
            VerificationKey::from_bytes(vkey),
            Signature::from_bytes(signature),
        ));
        Ok(())
    })?;

    Ok(tagged)
}

fn fixed_bytes<const N: usize>(d: &mut Decoder<'_>, what: &'static str) -> Result<[u8; N], CodecFault> {
    let bytes = d.bytes()?;
    bytes.try_into().map_err(|_| CodecFault::FieldLength {
        what,
        expected: N,
        found: bytes.len(),
    })
}
