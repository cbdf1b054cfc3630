// Copyright (c) 2022-2023 The MobileCoin Foundation

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Signing session phase
///
/// Phases are totally ordered and a session only ever moves forward,
/// [`Phase::Complete`] and [`Phase::Aborted`] are terminal.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    EnumString,
    Display,
    EnumVariantNames,
    EnumIter,
)]
#[repr(u8)]
pub enum Phase {
    /// Idle, awaiting transaction parameters
    Init = 0x00,
    /// Loading input descriptors
    SetInput = 0x10,
    /// Returning tagged input records for the prefix transcript
    InputVini = 0x11,
    /// Awaiting input segment barrier
    AllInputsSet = 0x12,
    /// Loading output descriptors
    SetOutput = 0x20,
    /// Awaiting output segment barrier and balance check
    AllOutputsSet = 0x21,
    /// Signing inputs
    SignInput = 0x30,
    /// Awaiting finalisation
    Final = 0x31,
    /// Transaction complete, session wiped
    Complete = 0x40,
    /// Session aborted, session wiped
    Aborted = 0xFF,
}

/// Request kind, used for phase checks and logging
#[derive(Copy, Clone, PartialEq, Eq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum RequestKind {
    Init,
    SetInput,
    InputVini,
    AllInputsSet,
    SetOutput,
    AllOutputsSet,
    SignInput,
    Final,
    Cancel,
}

impl Phase {
    /// Request kind accepted in this phase
    ///
    /// [`RequestKind::Init`] (restart) and [`RequestKind::Cancel`] are accepted in any phase
    pub const fn expects(&self) -> Option<RequestKind> {
        match self {
            Phase::Init => Some(RequestKind::Init),
            Phase::SetInput => Some(RequestKind::SetInput),
            Phase::InputVini => Some(RequestKind::InputVini),
            Phase::AllInputsSet => Some(RequestKind::AllInputsSet),
            Phase::SetOutput => Some(RequestKind::SetOutput),
            Phase::AllOutputsSet => Some(RequestKind::AllOutputsSet),
            Phase::SignInput => Some(RequestKind::SignInput),
            Phase::Final => Some(RequestKind::Final),
            Phase::Complete | Phase::Aborted => None,
        }
    }

    /// Check whether a phase is terminal
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Aborted)
    }
}
