// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::keychain::KeychainError;

/// [Engine][super::Engine] errors, every error is fatal to the session it occurs in
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum Error {
    /// Request kind or index not legal in the current phase
    #[cfg_attr(feature = "thiserror", error("unexpected request for current phase"))]
    ProtocolSequence,

    /// Offload authentication or value balance failure
    #[cfg_attr(feature = "thiserror", error("integrity check failed"))]
    Integrity,

    /// Declared input or output count exceeds protocol limits
    #[cfg_attr(feature = "thiserror", error("input or output limit exceeded"))]
    LimitExceeded,

    /// Key derivation or signing failed
    #[cfg_attr(feature = "thiserror", error("keychain error: {0}"))]
    Keychain(KeychainError),

    /// Malformed transaction parameters or descriptor
    #[cfg_attr(feature = "thiserror", error("invalid parameters"))]
    InvalidParameters,

    /// Session cancelled by the host
    #[cfg_attr(feature = "thiserror", error("session cancelled"))]
    Cancelled,

    /// Invalid engine state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState,

    /// Record encoding failed
    #[cfg_attr(feature = "thiserror", error("record encoding failed"))]
    Encoding,
}

impl Error {
    /// Status code for reporting errors to the host
    pub fn code(&self) -> u8 {
        match self {
            Error::ProtocolSequence => 0x01,
            Error::Integrity => 0x02,
            Error::LimitExceeded => 0x03,
            Error::Keychain(e) => 0x10 | (*e as u8),
            Error::InvalidParameters => 0x04,
            Error::Cancelled => 0x05,
            Error::InvalidState => 0x06,
            Error::Encoding => 0x07,
        }
    }
}

impl From<KeychainError> for Error {
    fn from(e: KeychainError) -> Self {
        Error::Keychain(e)
    }
}

impl From<encdec::Error> for Error {
    fn from(_: encdec::Error) -> Self {
        Error::Encoding
    }
}
