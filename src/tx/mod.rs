//! Transaction Module
//!
//! Decoding, witness insertion and signing of Cardano transactions.

pub mod codec;
pub mod signer;
pub mod witness;

pub use codec::{decode, decode_hex, encode, encode_hex, CodecFault, Transaction, TransactionBody};
pub use signer::*;
pub use witness::{VkeyWitness, WitnessSet};
