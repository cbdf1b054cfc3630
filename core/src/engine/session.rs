// Copyright (c) 2022-2023 The MobileCoin Foundation

use heapless::Vec;

use super::{
    Accumulator, Error, Phase, Request, RequestKind, Response, SessionSecret, SigningMessage,
    TxDigest, TxParams, MAX_INPUTS,
};
use crate::keychain::Signature;

/// Signing session state
///
/// A [`Session`] is exclusively owned by the caller and threaded through each
/// [`Engine::handle`][super::Engine::handle] call. Secret material is wiped when the
/// session completes, aborts, restarts or is dropped.
pub struct Session {
    pub(super) phase: Phase,
    pub(super) params: Option<TxParams>,

    pub(super) input_cursor: u32,
    pub(super) output_cursor: u32,

    pub(super) secret: Option<SessionSecret>,
    pub(super) acc: Option<Accumulator>,

    pub(super) message: Option<SigningMessage>,
    pub(super) signatures: Vec<Signature, MAX_INPUTS>,

    pub(super) digest: TxDigest,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("input_cursor", &self.input_cursor)
            .field("output_cursor", &self.output_cursor)
            .field("signatures", &self.signatures.len())
            .field("digest", &self.digest)
            .finish()
    }
}

impl Session {
    /// Create a new (idle) session
    pub const fn new() -> Self {
        Self {
            phase: Phase::Init,
            params: None,
            input_cursor: 0,
            output_cursor: 0,
            secret: None,
            acc: None,
            message: None,
            signatures: Vec::new(),
            digest: TxDigest::new(),
        }
    }

    /// Fetch current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Check whether the session has completed or aborted
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Fetch the request kind expected next (`Init` and `Cancel` are always accepted)
    pub fn expects(&self) -> Option<RequestKind> {
        self.phase.expects()
    }

    /// Fetch the current rolling digest
    pub fn digest(&self) -> &TxDigest {
        &self.digest
    }

    /// Fetch transaction parameters for a started session
    pub fn params(&self) -> Option<&TxParams> {
        self.params.as_ref()
    }

    /// Fetch the current item cursor for indexed phases
    pub fn cursor(&self) -> Option<u32> {
        match self.phase {
            Phase::SetInput | Phase::InputVini | Phase::SignInput => Some(self.input_cursor),
            Phase::SetOutput => Some(self.output_cursor),
            _ => None,
        }
    }

    /// Fetch session progress (0-100) for display
    pub fn progress(&self) -> Option<usize> {
        // Parameters are wiped on completion
        if self.phase == Phase::Complete {
            return Some(100);
        }

        let p = self.params.as_ref()?;
        let (i, o) = (p.num_inputs as usize, p.num_outputs as usize);

        // SetInput, InputVini and SignInput per input, SetOutput per output, three barriers
        let total = 3 * i + o + 3;

        let done = match self.phase {
            Phase::SetInput => self.input_cursor as usize,
            Phase::InputVini => i + self.input_cursor as usize,
            Phase::AllInputsSet => 2 * i,
            Phase::SetOutput => 2 * i + 1 + self.output_cursor as usize,
            Phase::AllOutputsSet => 2 * i + 1 + o,
            Phase::SignInput => 2 * i + o + 2 + self.input_cursor as usize,
            Phase::Final => 3 * i + o + 2,
            Phase::Init | Phase::Complete | Phase::Aborted => return None,
        };

        Some(done * 100 / total)
    }

    /// Abort the session, wiping all secret state
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn abort(&mut self) {
        if self.phase != Phase::Aborted {
            #[cfg(feature = "log")]
            log::warn!("session aborted in phase {}", self.phase);
        }

        self.wipe();
        self.phase = Phase::Aborted;
    }

    /// Wipe secret and per-transaction state
    #[cfg_attr(feature = "noinline", inline(never))]
    pub(super) fn wipe(&mut self) {
        // Dropping executes zeroize for secret and accumulator
        self.secret = None;
        self.acc = None;

        self.message = None;
        self.signatures.clear();
        self.params = None;
        self.input_cursor = 0;
        self.output_cursor = 0;
    }

    /// Reset an idle or terminal session for a new transaction
    pub(super) fn reset(&mut self) {
        debug_assert!(
            self.phase == Phase::Init || self.is_terminal(),
            "reset of live session in phase {}",
            self.phase
        );

        #[cfg(feature = "log")]
        if self.phase != Phase::Init {
            log::debug!("restarting session from phase {}", self.phase);
        }

        self.wipe();
        self.phase = Phase::Init;
        self.digest = TxDigest::new();
    }

    /// Check a request is legal in the current phase and at the current cursor,
    /// applying it to the rolling digest
    pub(super) fn accept(&mut self, phase: Phase, req: &Request) -> Result<(), Error> {
        if self.phase != phase {
            #[cfg(feature = "log")]
            log::error!("unexpected {} request in phase {}", req.kind(), self.phase);

            return Err(Error::ProtocolSequence);
        }

        if let Some(index) = req.index() {
            if Some(index) != self.cursor() {
                #[cfg(feature = "log")]
                log::error!(
                    "unexpected {} index {} (expected {:?})",
                    req.kind(),
                    index,
                    self.cursor()
                );

                return Err(Error::ProtocolSequence);
            }
        }

        if let Some(h) = req.hash() {
            self.digest.update(&h);
        }

        Ok(())
    }

    /// Move to a later phase
    pub(super) fn set_phase(&mut self, next: Phase) {
        debug_assert!(next >= self.phase, "phase regression {} -> {}", self.phase, next);

        #[cfg(feature = "log")]
        log::debug!("phase {} -> {}", self.phase, next);

        self.phase = next;
    }

    /// Advance the input cursor, moving to `next` once all inputs are processed
    pub(super) fn advance_input(&mut self, next: Phase) -> Result<(), Error> {
        let n = self.params.as_ref().ok_or(Error::InvalidState)?.num_inputs;

        self.input_cursor += 1;
        if self.input_cursor >= n {
            self.input_cursor = 0;
            self.set_phase(next);
        }

        Ok(())
    }

    /// Advance the output cursor, moving to `next` once all outputs are processed
    pub(super) fn advance_output(&mut self, next: Phase) -> Result<(), Error> {
        let n = self.params.as_ref().ok_or(Error::InvalidState)?.num_outputs;

        self.output_cursor += 1;
        if self.output_cursor >= n {
            self.output_cursor = 0;
            self.set_phase(next);
        }

        Ok(())
    }

    /// Fetch session secret and accumulator for a started session
    pub(super) fn secrets_mut(&mut self) -> Result<(&SessionSecret, &mut Accumulator), Error> {
        match (&self.secret, &mut self.acc) {
            (Some(s), Some(a)) => Ok((s, a)),
            _ => Err(Error::InvalidState),
        }
    }

    /// Build a state response
    pub(super) fn state(&self) -> Response {
        Response::State {
            phase: self.phase,
            digest: self.digest.clone(),
        }
    }

    /// Check whether any secret material is held (test introspection)
    #[cfg(test)]
    pub(crate) fn holds_secrets(&self) -> bool {
        self.secret.is_some() || self.acc.is_some() || !self.signatures.is_empty()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.wipe();
    }
}
