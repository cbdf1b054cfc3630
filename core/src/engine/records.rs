// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Offloaded record types
//!
//! These are handed to the host between round trips and must be returned unmodified,
//! the canonical `encdec` encoding of each record is the input to its authentication tag.

use core::ops::Deref;

use curve25519_dalek::ristretto::CompressedRistretto;
use encdec::{Decode, DecodeOwned, Encode};
use heapless::Vec;
use static_assertions::const_assert;

use super::{scratch::SCRATCH_LEN, MAX_PATH_DEPTH};
use crate::helpers::{arr, pt};

/// Bounded key derivation path
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct KeyPath(Vec<u32, MAX_PATH_DEPTH>);

impl KeyPath {
    /// Maximum encoded length (length prefix and components)
    pub const MAX_LEN: usize = 1 + MAX_PATH_DEPTH * 4;

    /// Create a key path from path components, returns `None` if the path is too deep
    pub fn new(path: &[u32]) -> Option<Self> {
        Vec::from_slice(path).ok().map(Self)
    }
}

impl Deref for KeyPath {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Encode for KeyPath {
    type Error = encdec::Error;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1 + self.0.len() * 4)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(encdec::Error::Length);
        }

        buff[0] = self.0.len() as u8;
        for (i, c) in self.0.iter().enumerate() {
            buff[1 + i * 4..][..4].copy_from_slice(&c.to_le_bytes());
        }

        Ok(n)
    }
}

impl DecodeOwned for KeyPath {
    type Output = KeyPath;

    type Error = encdec::Error;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.is_empty() {
            return Err(encdec::Error::Length);
        }

        let depth = buff[0] as usize;
        let n = 1 + depth * 4;
        if depth > MAX_PATH_DEPTH || buff.len() < n {
            return Err(encdec::Error::Length);
        }

        let mut p = Vec::new();
        for c in buff[1..n].chunks_exact(4) {
            let mut b = [0u8; 4];
            b.copy_from_slice(c);

            p.push(u32::from_le_bytes(b))
                .map_err(|_| encdec::Error::Length)?;
        }

        Ok((Self(p), n))
    }
}

/// Input record, issued at `SetInput` and returned at `InputVini` and `SignInput`
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
pub struct InputRecord {
    /// Input index
    pub index: u32,

    /// Input amount
    pub amount: u64,

    /// Derivation path for the input signing key
    pub key_path: KeyPath,

    /// Reference to the spent output
    #[encdec(with = "arr")]
    pub source: [u8; 32],

    /// Pseudo-output commitment for this input
    #[encdec(with = "pt")]
    pub pseudo_out: CompressedRistretto,
}

impl InputRecord {
    /// Maximum encoded length
    pub const MAX_LEN: usize = 4 + 8 + KeyPath::MAX_LEN + 32 + 32;
}

/// Sealed pseudo-output blinding for an input, issued at `SetInput` and returned at `SignInput`
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
pub struct SealedMask {
    /// Encrypted blinding scalar
    #[encdec(with = "arr")]
    pub ciphertext: [u8; 32],

    /// AEAD authentication tag
    #[encdec(with = "arr")]
    pub aead_tag: [u8; 16],
}

impl SealedMask {
    pub const MAX_LEN: usize = 32 + 16;
}

/// Output record, issued at `SetOutput` for transaction assembly
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
pub struct OutputRecord {
    /// Output index
    pub index: u32,

    /// Output destination key
    #[encdec(with = "arr")]
    pub destination: [u8; 32],

    /// Output amount commitment
    #[encdec(with = "pt")]
    pub commitment: CompressedRistretto,

    /// Range proof digest (zero when not offloaded)
    #[encdec(with = "arr")]
    pub range_proof: [u8; 32],
}

impl OutputRecord {
    pub const MAX_LEN: usize = 4 + 32 + 32 + 32;
}

// Records must always fit in the per-request scratch buffer
const_assert!(InputRecord::MAX_LEN <= SCRATCH_LEN);
const_assert!(SealedMask::MAX_LEN <= SCRATCH_LEN);
const_assert!(OutputRecord::MAX_LEN <= SCRATCH_LEN);
