// Copyright (c) 2022-2023 The MobileCoin Foundation

use heapless::Vec;

use super::{
    InputRecord, Offload, OutputRecord, Phase, SealedMask, SigningMessage, TxDigest, MAX_INPUTS,
};
use crate::keychain::Signature;

/// [`Engine`][super::Engine] responses, typically encoded by the serialization layer
#[derive(Clone, PartialEq, Debug)]
pub enum Response {
    /// Session phase
    State { phase: Phase, digest: TxDigest },

    /// Tagged input record and sealed blinding, to be returned at `InputVini` and `SignInput`
    InputSet {
        phase: Phase,
        digest: TxDigest,
        record: Offload<InputRecord>,
        mask: Offload<SealedMask>,
    },

    /// Tagged output record
    OutputSet {
        phase: Phase,
        digest: TxDigest,
        record: Offload<OutputRecord>,
    },

    /// Balance check passed, ready to sign inputs
    Ready {
        phase: Phase,
        digest: TxDigest,
        message: SigningMessage,
    },

    /// Signature for a single input
    Signature {
        phase: Phase,
        digest: TxDigest,
        index: u32,
        signature: Signature,
    },

    /// Signed transaction acknowledgement
    Final(FinalAck),
}

impl Response {
    /// Fetch session phase following the request
    pub fn phase(&self) -> Phase {
        match self {
            Response::State { phase, .. }
            | Response::InputSet { phase, .. }
            | Response::OutputSet { phase, .. }
            | Response::Ready { phase, .. }
            | Response::Signature { phase, .. } => *phase,
            Response::Final(_) => Phase::Complete,
        }
    }

    /// Fetch rolling digest following the request
    pub fn digest(&self) -> &TxDigest {
        match self {
            Response::State { digest, .. }
            | Response::InputSet { digest, .. }
            | Response::OutputSet { digest, .. }
            | Response::Ready { digest, .. }
            | Response::Signature { digest, .. } => digest,
            Response::Final(a) => &a.digest,
        }
    }
}

/// Final signed transaction acknowledgement
#[derive(Clone, PartialEq, Debug)]
pub struct FinalAck {
    /// Transaction prefix hash
    pub prefix_hash: [u8; 32],
    /// Signed transaction message
    pub message: [u8; 32],
    /// Per-input signatures, in input order
    pub signatures: Vec<Signature, MAX_INPUTS>,
    /// Final rolling digest
    pub digest: TxDigest,
}
