#![allow(unused)]

use bip39::{Language, Mnemonic, Seed};
use ed25519_dalek::{Signature as Ed25519Signature, Verifier, VerifyingKey};
use log::debug;
use rand::random;

use ledger_rct_core::{
    engine::{
        Engine, Error, FinalAck, InputDescriptor, InputRecord, KeyPath, Network, Offload,
        OutputDescriptor, OutputRecord, Phase, Request, Response, SealedMask, Session,
        SigningMessage, TxFlags, TxParams,
    },
    keychain::{Keychain, Slip10Keychain},
};

pub const MNEMONIC: &str = "duck deal pretty pen thunder economy wide common goose fit engine main aisle curtain choose cube claim snake enroll detect brief history float unit";

/// Account path for session key material
pub const ACCOUNT_PATH: &[u32] = &[44, 128, 0];

pub fn init_logger() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Build a SLIP-0010 keychain from the test mnemonic
pub fn keychain() -> anyhow::Result<Slip10Keychain> {
    let mnemonic = Mnemonic::from_phrase(MNEMONIC, Language::English)?;
    let seed = Seed::new(&mnemonic, "");

    let kc = Slip10Keychain::new(seed.as_bytes()).map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(kc)
}

pub fn input_path(index: u32) -> Vec<u32> {
    vec![44, 128, 0, 0, index]
}

/// Synthetic transaction
#[derive(Clone, Debug)]
pub struct Transaction {
    pub params: TxParams,
    pub inputs: Vec<InputDescriptor>,
    pub outputs: Vec<OutputDescriptor>,
}

impl Transaction {
    /// Build a transaction with the provided input and output amounts
    pub fn new(inputs: &[u64], outputs: &[u64], fee: u64) -> Self {
        Self {
            params: TxParams {
                version: 2,
                network: Network::Stagenet,
                flags: TxFlags::empty(),
                unlock_time: 0,
                fee,
                num_inputs: inputs.len() as u32,
                num_outputs: outputs.len() as u32,
                account_path: KeyPath::new(ACCOUNT_PATH).unwrap(),
            },
            inputs: inputs
                .iter()
                .enumerate()
                .map(|(i, v)| InputDescriptor {
                    index: i as u32,
                    amount: *v,
                    key_path: KeyPath::new(&input_path(i as u32)).unwrap(),
                    source: random(),
                })
                .collect(),
            outputs: outputs
                .iter()
                .enumerate()
                .map(|(i, v)| OutputDescriptor {
                    index: i as u32,
                    amount: *v,
                    destination: random(),
                    range_proof: None,
                })
                .collect(),
        }
    }
}

/// Host side of a signing session, storing offloaded records between round trips
#[derive(Default, Debug)]
pub struct Host {
    pub inputs: Vec<(Offload<InputRecord>, Offload<SealedMask>)>,
    pub outputs: Vec<Offload<OutputRecord>>,
    pub message: Option<SigningMessage>,
}

impl Host {
    /// Build the next request expected by the session
    pub fn next(&self, session: &Session, tx: &Transaction) -> Request {
        let c = session.cursor().unwrap_or(0) as usize;

        match session.phase() {
            Phase::Init => Request::Init(tx.params.clone()),
            Phase::SetInput => Request::SetInput(tx.inputs[c].clone()),
            Phase::InputVini => Request::InputVini(self.inputs[c].0.clone()),
            Phase::AllInputsSet => Request::AllInputsSet,
            Phase::SetOutput => Request::SetOutput(tx.outputs[c].clone()),
            Phase::AllOutputsSet => Request::AllOutputsSet,
            Phase::SignInput => Request::SignInput {
                record: self.inputs[c].0.clone(),
                mask: self.inputs[c].1.clone(),
            },
            Phase::Final => Request::Final,
            p => panic!("no request for phase {p}"),
        }
    }

    /// Store offloaded records from a response
    pub fn store(&mut self, r: &Response) {
        match r {
            Response::InputSet { record, mask, .. } => {
                self.inputs.push((record.clone(), mask.clone()))
            }
            Response::OutputSet { record, .. } => self.outputs.push(record.clone()),
            Response::Ready { message, .. } => self.message = Some(message.clone()),
            _ => (),
        }
    }

    /// Send a request, storing any offloaded records
    pub fn send<KC: Keychain>(
        &mut self,
        engine: &mut Engine<KC>,
        session: &mut Session,
        req: &Request,
    ) -> Result<Response, Error> {
        debug!("send: {}", req.kind());

        let r = engine.handle(session, req)?;
        self.store(&r);

        Ok(r)
    }

    /// Send the next expected request
    pub fn step<KC: Keychain>(
        &mut self,
        engine: &mut Engine<KC>,
        session: &mut Session,
        tx: &Transaction,
    ) -> Result<Response, Error> {
        let req = self.next(session, tx);
        self.send(engine, session, &req)
    }

    /// Drive a session until it reaches the provided phase
    pub fn advance_to<KC: Keychain>(
        &mut self,
        engine: &mut Engine<KC>,
        session: &mut Session,
        tx: &Transaction,
        phase: Phase,
    ) -> Result<(), Error> {
        while session.phase() != phase {
            self.step(engine, session, tx)?;
        }

        Ok(())
    }
}

/// Run a full signing session
pub fn sign<KC: Keychain>(
    engine: &mut Engine<KC>,
    tx: &Transaction,
) -> Result<(Host, FinalAck), Error> {
    let mut host = Host::default();

    let (mut session, r) = engine.start(tx.params.clone())?;
    host.store(&r);

    loop {
        if let Response::Final(ack) = host.step(engine, &mut session, tx)? {
            assert!(session.is_terminal());
            return Ok((host, ack));
        }
    }
}

/// Verify per-input signatures against the issued input records
pub fn verify_signatures(
    kc: &Slip10Keychain,
    host: &Host,
    ack: &FinalAck,
) -> anyhow::Result<()> {
    let message = SigningMessage {
        prefix_hash: ack.prefix_hash,
        message: ack.message,
    };

    assert_eq!(ack.signatures.len(), host.inputs.len());

    for ((record, _), sig) in host.inputs.iter().zip(ack.signatures.iter()) {
        let pk = kc.public_key(&record.payload.key_path)?;
        let pk = VerifyingKey::from_bytes(&pk)?;

        let digest = message.input_digest(&record.payload);
        pk.verify(&digest, &Ed25519Signature::from_bytes(&sig.0))?;
    }

    Ok(())
}
