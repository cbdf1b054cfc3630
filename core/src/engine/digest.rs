// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Rolling request digest and per-request hashes
//!
//! The same hashes are computed by the host over the requests it sends, allowing
//! loss of synchronisation to be detected from the digest in each response.

use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512_256};

use super::{InputDescriptor, InputRecord, Offload, OutputDescriptor, SealedMask, TxParams};

/// Transaction digest, used to keep a running digest of requests to
/// the signing engine to ensure sync between the host and hardware
/// wallet.
#[derive(Clone, PartialEq, Eq)]
pub struct TxDigest([u8; 32]);

impl core::fmt::Debug for TxDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl core::fmt::Display for TxDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl Default for TxDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl TxDigest {
    /// Create a new (empty) transaction digest
    pub const fn new() -> Self {
        Self([0u8; 32])
    }

    /// Create a transaction digest from a reported value
    pub const fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    /// Reset transaction digest from random seed
    pub fn from_random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut b = [0u8; 32];
        rng.fill_bytes(&mut b);

        let r = Sha512_256::new().chain_update(b).finalize();
        b.copy_from_slice(r.as_ref());

        TxDigest(b)
    }

    /// Update transaction digest with a new request hash
    pub fn update(&mut self, req: &[u8; 32]) -> &Self {
        // Build and update digest
        let mut d = Sha512_256::new();

        // Prior state
        d.update(self.0);

        // New request
        d.update(req);

        // Write to internal state
        self.0.copy_from_slice(d.finalize().as_ref());

        self
    }

    /// Fetch digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

pub fn digest_init(p: &TxParams) -> [u8; 32] {
    let mut d = Sha512_256::new()
        .chain_update("tx_init")
        .chain_update(p.version.to_le_bytes())
        .chain_update([p.network as u8, p.flags.bits()])
        .chain_update(p.unlock_time.to_le_bytes())
        .chain_update(p.fee.to_le_bytes())
        .chain_update(p.num_inputs.to_le_bytes())
        .chain_update(p.num_outputs.to_le_bytes())
        .chain_update([p.account_path.len() as u8]);

    for c in p.account_path.iter() {
        d.update(c.to_le_bytes());
    }

    d.finalize().into()
}

pub fn digest_set_input(i: &InputDescriptor) -> [u8; 32] {
    let mut d = Sha512_256::new()
        .chain_update("set_input")
        .chain_update(i.index.to_le_bytes())
        .chain_update(i.amount.to_le_bytes())
        .chain_update(i.source)
        .chain_update([i.key_path.len() as u8]);

    for c in i.key_path.iter() {
        d.update(c.to_le_bytes());
    }

    d.finalize().into()
}

pub fn digest_input_vini(r: &Offload<InputRecord>) -> [u8; 32] {
    Sha512_256::new()
        .chain_update("input_vini")
        .chain_update(r.index.to_le_bytes())
        .chain_update(r.tag.0)
        .finalize()
        .into()
}

pub fn digest_set_output(o: &OutputDescriptor) -> [u8; 32] {
    let mut d = Sha512_256::new()
        .chain_update("set_output")
        .chain_update(o.index.to_le_bytes())
        .chain_update(o.amount.to_le_bytes())
        .chain_update(o.destination);

    if let Some(rp) = &o.range_proof {
        d.update(rp);
    }

    d.finalize().into()
}

pub fn digest_sign_input(r: &Offload<InputRecord>, m: &Offload<SealedMask>) -> [u8; 32] {
    Sha512_256::new()
        .chain_update("sign_input")
        .chain_update(r.index.to_le_bytes())
        .chain_update(r.tag.0)
        .chain_update(m.index.to_le_bytes())
        .chain_update(m.tag.0)
        .finalize()
        .into()
}

/// Digest for requests without payload
pub fn digest_barrier(label: &str) -> [u8; 32] {
    Sha512_256::new().chain_update(label).finalize().into()
}
