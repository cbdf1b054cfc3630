// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] drives streaming transaction signing sessions.
//!
//! This handles typed [Request] inputs against a caller-owned [Session] and returns
//! [Response]s, see the [crate] documentation for the request sequence.

use rand_core::{CryptoRngCore, OsRng};
use zeroize::Zeroize;

use crate::keychain::Keychain;

mod phase;
pub use phase::{Phase, RequestKind};

mod request;
pub use request::{InputDescriptor, Network, OutputDescriptor, Request, TxFlags, TxParams};

mod response;
pub use response::{FinalAck, Response};

mod session;
pub use session::Session;

mod accumulator;
pub use accumulator::{value_generator, Accumulator, SigningMessage};

mod offload;
pub use offload::{ItemKind, Offload, SessionSecret, Tag};

mod records;
pub use records::{InputRecord, KeyPath, OutputRecord, SealedMask};

mod digest;
pub use digest::TxDigest;

mod finalize;

mod scratch;
use scratch::Scratch;

mod error;
pub use error::Error;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: usize = 16;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 16;

/// Maximum key derivation path depth
pub const MAX_PATH_DEPTH: usize = 8;

/// Runtime engine configuration
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Config {
    /// Maximum inputs per transaction (clamped to [MAX_INPUTS])
    pub max_inputs: u32,
    /// Maximum outputs per transaction (clamped to [MAX_OUTPUTS])
    pub max_outputs: u32,
}

impl Config {
    pub const DEFAULT: Self = Self {
        max_inputs: MAX_INPUTS as u32,
        max_outputs: MAX_OUTPUTS as u32,
    };

    /// Fetch effective (input, output) limits
    fn limits(&self) -> (u32, u32) {
        (
            self.max_inputs.min(MAX_INPUTS as u32),
            self.max_outputs.min(MAX_OUTPUTS as u32),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [Engine] provides hardware-independent streaming transaction signing
pub struct Engine<KC: Keychain, RNG: CryptoRngCore = OsRng> {
    config: Config,
    scratch: Scratch,
    keychain: KC,
    rng: RNG,
}

impl<KC: Keychain> Engine<KC> {
    /// Create a new signing engine instance with the provided keychain,
    /// using the default [OsRng]
    pub const fn new(keychain: KC) -> Self {
        Self::new_with_rng(keychain, OsRng {})
    }
}

impl<KC: Keychain, RNG: CryptoRngCore> Engine<KC, RNG> {
    /// Create a new signing engine instance with the provided keychain and rng
    pub const fn new_with_rng(keychain: KC, rng: RNG) -> Self {
        Self {
            config: Config::DEFAULT,
            scratch: Scratch::new(),
            keychain,
            rng,
        }
    }

    /// Apply a runtime [Config]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Start a new signing session
    ///
    /// No session is returned on failure, including where declared counts exceed limits.
    pub fn start(&mut self, params: TxParams) -> Result<(Session, Response), Error> {
        let mut session = Session::new();

        let r = self.handle(&mut session, &Request::Init(params))?;

        Ok((session, r))
    }

    /// Handle an incoming request for a session
    ///
    /// Any error aborts the session, wiping secret state. The host must restart from `Init`.
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn handle(&mut self, session: &mut Session, req: &Request) -> Result<Response, Error> {
        #[cfg(feature = "log")]
        log::debug!("request: {} (phase: {})", req.kind(), session.phase());

        let r = self.dispatch(session, req);

        // Release per-request working memory
        self.scratch.clear();

        if let Err(_e) = &r {
            #[cfg(feature = "log")]
            log::error!("{} request failed: {:?}", req.kind(), _e);

            session.abort();
        }

        r
    }

    /// Abort a session, wiping secret state
    pub fn abort(&mut self, session: &mut Session) {
        session.abort();
        self.scratch.clear();
    }

    fn dispatch(&mut self, session: &mut Session, req: &Request) -> Result<Response, Error> {
        match req {
            // Start (or restart) a session
            Request::Init(params) => self.init(session, params),

            Request::SetInput(d) => {
                session.accept(Phase::SetInput, req)?;
                self.set_input(session, d)
            }

            Request::InputVini(r) => {
                session.accept(Phase::InputVini, req)?;
                self.input_vini(session, r)
            }

            Request::AllInputsSet => {
                session.accept(Phase::AllInputsSet, req)?;
                self.all_inputs_set(session)
            }

            Request::SetOutput(d) => {
                session.accept(Phase::SetOutput, req)?;
                self.set_output(session, d)
            }

            Request::AllOutputsSet => {
                session.accept(Phase::AllOutputsSet, req)?;
                self.all_outputs_set(session)
            }

            Request::SignInput { record, mask } => {
                session.accept(Phase::SignInput, req)?;
                self.sign_input(session, record, mask)
            }

            Request::Final => {
                session.accept(Phase::Final, req)?;
                session.finalize().map(Response::Final)
            }

            Request::Cancel => {
                #[cfg(feature = "log")]
                log::warn!("session cancelled in phase {}", session.phase());

                Err(Error::Cancelled)
            }
        }
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn init(&mut self, session: &mut Session, params: &TxParams) -> Result<Response, Error> {
        // Check limits prior to touching any key material
        let (max_inputs, max_outputs) = self.config.limits();
        if params.num_inputs > max_inputs || params.num_outputs > max_outputs {
            #[cfg(feature = "log")]
            log::error!(
                "declared counts ({} inputs, {} outputs) exceed limits ({}, {})",
                params.num_inputs,
                params.num_outputs,
                max_inputs,
                max_outputs
            );

            return Err(Error::LimitExceeded);
        }

        if params.num_inputs == 0 || params.num_outputs == 0 || params.account_path.is_empty() {
            return Err(Error::InvalidParameters);
        }

        // Init on a live session aborts it
        if session.phase() != Phase::Init && !session.is_terminal() {
            session.abort();
        }
        session.reset();

        // Derive session secret, key is cleared following use
        let mut key = self.keychain.derive_signing_key(&params.account_path)?;
        let secret = SessionSecret::derive(&mut self.rng, key.as_ref());
        key.zeroize();

        session.secret = Some(secret?);
        session.acc = Some(Accumulator::new(params));
        session.params = Some(params.clone());

        session.digest = TxDigest::from_random(&mut self.rng);
        session.digest.update(&digest::digest_init(params));

        session.set_phase(Phase::SetInput);

        Ok(session.state())
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn set_input(&mut self, session: &mut Session, d: &InputDescriptor) -> Result<Response, Error> {
        if d.key_path.is_empty() {
            return Err(Error::InvalidParameters);
        }

        let (secret, acc) = session.secrets_mut()?;

        // Random pseudo-output blinding
        let mut mask = accumulator::random_scalar(&mut self.rng);
        let pseudo_out = acc.commit(d.amount, &mask);
        acc.add_input_mask(&mask);

        let sealed = offload::seal(secret, ItemKind::InputMask, d.index, &mask);
        mask.zeroize();

        let record = InputRecord {
            index: d.index,
            amount: d.amount,
            key_path: d.key_path.clone(),
            source: d.source,
            pseudo_out: pseudo_out.compress(),
        };

        let record = Offload::issue(&mut self.scratch, secret, ItemKind::Input, d.index, record)?;
        let mask = Offload::issue(&mut self.scratch, secret, ItemKind::InputMask, d.index, sealed?)?;

        session.advance_input(Phase::InputVini)?;

        Ok(Response::InputSet {
            phase: session.phase(),
            digest: session.digest.clone(),
            record,
            mask,
        })
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn input_vini(&mut self, session: &mut Session, r: &Offload<InputRecord>) -> Result<Response, Error> {
        let index = session.input_cursor;
        let (secret, acc) = session.secrets_mut()?;

        let record = r.admit(&mut self.scratch, secret, ItemKind::Input, index)?;
        acc.fold_input(record)?;

        session.advance_input(Phase::AllInputsSet)?;

        Ok(session.state())
    }

    fn all_inputs_set(&mut self, session: &mut Session) -> Result<Response, Error> {
        let (_, acc) = session.secrets_mut()?;
        acc.finalize_inputs()?;

        session.set_phase(Phase::SetOutput);

        Ok(session.state())
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn set_output(&mut self, session: &mut Session, d: &OutputDescriptor) -> Result<Response, Error> {
        let p = session.params.as_ref().ok_or(Error::InvalidState)?;

        // Range proofs must be present iff offloaded
        let offload_rp = p.flags.contains(TxFlags::RANGE_PROOF_OFFLOAD);
        if offload_rp != d.range_proof.is_some() {
            return Err(Error::InvalidParameters);
        }

        let last = d.index + 1 == p.num_outputs;

        let (secret, acc) = session.secrets_mut()?;

        let mut mask = acc.output_mask(last, &mut self.rng);
        let commitment = acc.fold_output(d, &mask);
        mask.zeroize();

        let record = OutputRecord {
            index: d.index,
            destination: d.destination,
            commitment: commitment?,
            range_proof: d.range_proof.unwrap_or([0u8; 32]),
        };
        let record = Offload::issue(&mut self.scratch, secret, ItemKind::Output, d.index, record)?;

        session.advance_output(Phase::AllOutputsSet)?;

        Ok(Response::OutputSet {
            phase: session.phase(),
            digest: session.digest.clone(),
            record,
        })
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn all_outputs_set(&mut self, session: &mut Session) -> Result<Response, Error> {
        let (_, acc) = session.secrets_mut()?;

        acc.finalize_balance_check()?;
        let message = acc.finalize_message();

        session.message = Some(message.clone());
        session.set_phase(Phase::SignInput);

        Ok(Response::Ready {
            phase: session.phase(),
            digest: session.digest.clone(),
            message,
        })
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn sign_input(
        &mut self,
        session: &mut Session,
        record: &Offload<InputRecord>,
        mask: &Offload<SealedMask>,
    ) -> Result<Response, Error> {
        let index = session.input_cursor;
        if mask.index != index {
            return Err(Error::ProtocolSequence);
        }

        let message = session.message.clone().ok_or(Error::InvalidState)?;
        let (secret, acc) = session.secrets_mut()?;

        // Re-admit offloaded record and blinding
        let input = record.admit(&mut self.scratch, secret, ItemKind::Input, index)?;
        let sealed = mask.admit(&mut self.scratch, secret, ItemKind::InputMask, index)?;

        // Blinding must reproduce the pseudo-output issued at SetInput
        let mut m = offload::open(secret, ItemKind::InputMask, index, sealed)?;
        let pseudo_out = acc.commit(input.amount, &m).compress();
        m.zeroize();

        if pseudo_out != input.pseudo_out {
            #[cfg(feature = "log")]
            log::error!("input {} blinding mismatch", index);

            return Err(Error::Integrity);
        }

        // Sign input, key is cleared following use
        let digest = message.input_digest(input);
        let mut key = self.keychain.derive_signing_key(&input.key_path)?;
        let signature = self.keychain.sign(&key, &digest);
        key.zeroize();
        let signature = signature?;

        session
            .signatures
            .push(signature)
            .map_err(|_| Error::InvalidState)?;
        session.advance_input(Phase::Final)?;

        Ok(Response::Signature {
            phase: session.phase(),
            digest: session.digest.clone(),
            index,
            signature,
        })
    }
}
