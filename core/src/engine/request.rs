// Copyright (c) 2022-2023 The MobileCoin Foundation

use bitflags::bitflags;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use super::{InputRecord, KeyPath, Offload, RequestKind, SealedMask};

/// Target network
#[derive(Copy, Clone, PartialEq, Eq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
#[repr(u8)]
pub enum Network {
    Mainnet = 0,
    Testnet = 1,
    Stagenet = 2,
    Fakechain = 3,
}

bitflags! {
    /// Transaction-level flags
    pub struct TxFlags: u8 {
        /// Outputs carry an externally produced range proof digest
        const RANGE_PROOF_OFFLOAD = 1 << 0;
    }
}

/// Transaction parameters, fixed for the lifetime of a session
#[derive(Clone, PartialEq, Debug)]
pub struct TxParams {
    pub version: u32,
    pub network: Network,
    pub flags: TxFlags,
    pub unlock_time: u64,
    pub fee: u64,

    /// Declared input count
    pub num_inputs: u32,
    /// Declared output count
    pub num_outputs: u32,

    /// Derivation path for session key material
    pub account_path: KeyPath,
}

/// Input descriptor for `SetInput`
#[derive(Clone, PartialEq, Debug)]
pub struct InputDescriptor {
    pub index: u32,
    pub amount: u64,
    /// Derivation path for the input signing key
    pub key_path: KeyPath,
    /// Reference to the spent output
    pub source: [u8; 32],
}

/// Output descriptor for `SetOutput`
#[derive(Clone, PartialEq, Debug)]
pub struct OutputDescriptor {
    pub index: u32,
    pub amount: u64,
    pub destination: [u8; 32],
    /// Range proof digest, required where [`TxFlags::RANGE_PROOF_OFFLOAD`] is set
    pub range_proof: Option<[u8; 32]>,
}

/// [`Engine`][super::Engine] requests, typically decoded by the serialization layer
#[derive(Clone, PartialEq, Debug)]
pub enum Request {
    /// Start a signing session
    Init(TxParams),

    /// Load an input
    SetInput(InputDescriptor),

    /// Return a tagged input record for the prefix transcript
    InputVini(Offload<InputRecord>),

    /// Close the input segment
    AllInputsSet,

    /// Load an output
    SetOutput(OutputDescriptor),

    /// Close the output segment and check balance
    AllOutputsSet,

    /// Return a tagged input record and sealed blinding for signing
    SignInput {
        record: Offload<InputRecord>,
        mask: Offload<SealedMask>,
    },

    /// Fetch the signed transaction acknowledgement
    Final,

    /// Cancel the session
    Cancel,
}

impl Request {
    /// Fetch the request kind
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Init(_) => RequestKind::Init,
            Request::SetInput(_) => RequestKind::SetInput,
            Request::InputVini(_) => RequestKind::InputVini,
            Request::AllInputsSet => RequestKind::AllInputsSet,
            Request::SetOutput(_) => RequestKind::SetOutput,
            Request::AllOutputsSet => RequestKind::AllOutputsSet,
            Request::SignInput { .. } => RequestKind::SignInput,
            Request::Final => RequestKind::Final,
            Request::Cancel => RequestKind::Cancel,
        }
    }

    /// Fetch the item index for per-item requests
    pub fn index(&self) -> Option<u32> {
        match self {
            Request::SetInput(d) => Some(d.index),
            Request::InputVini(r) => Some(r.index),
            Request::SetOutput(d) => Some(d.index),
            Request::SignInput { record, .. } => Some(record.index),
            _ => None,
        }
    }

    /// Compute request hash for the rolling [TxDigest][super::TxDigest]
    /// (only applied for session mutating requests)
    pub fn hash(&self) -> Option<[u8; 32]> {
        use super::digest::*;

        let h = match self {
            Request::Init(p) => digest_init(p),
            Request::SetInput(d) => digest_set_input(d),
            Request::InputVini(r) => digest_input_vini(r),
            Request::AllInputsSet => digest_barrier("all_inputs_set"),
            Request::SetOutput(d) => digest_set_output(d),
            Request::AllOutputsSet => digest_barrier("all_outputs_set"),
            Request::SignInput { record, mask } => digest_sign_input(record, mask),
            Request::Final => digest_barrier("final"),
            Request::Cancel => return None,
        };

        Some(h)
    }
}
