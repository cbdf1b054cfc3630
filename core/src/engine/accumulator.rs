// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Running transaction state
//!
//! Inputs and outputs are folded one at a time into a prefix transcript, an RCT hash
//! and two commitment sums, so no full-transaction buffer is ever required.

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
use merlin::Transcript;
use rand_core::{CryptoRngCore, RngCore};
use sha2::{Digest, Sha512, Sha512_256};
use zeroize::Zeroize;

use super::{Error, InputRecord, OutputDescriptor, TxParams};

/// Domain separator for the value generator `H`
const VALUE_GENERATOR_DOMAIN: &[u8] = b"ledger-rct value generator";

/// Compute the value generator `H`, independent of the basepoint `G`
pub fn value_generator() -> RistrettoPoint {
    let mut b = [0u8; 64];
    b.copy_from_slice(&Sha512::new().chain_update(VALUE_GENERATOR_DOMAIN).finalize());

    RistrettoPoint::from_uniform_bytes(&b)
}

/// Sample a uniformly random scalar
pub fn random_scalar<RNG: CryptoRngCore>(rng: &mut RNG) -> Scalar {
    let mut b = [0u8; 64];
    rng.fill_bytes(&mut b);

    let s = Scalar::from_bytes_mod_order_wide(&b);
    b.zeroize();

    s
}

/// Transaction signing message, fixed once all inputs and outputs are folded
#[derive(Clone, PartialEq, Debug)]
pub struct SigningMessage {
    /// Transaction prefix hash
    pub prefix_hash: [u8; 32],
    /// Message signed for each input
    pub message: [u8; 32],
}

impl SigningMessage {
    /// Compute the per-input signing digest
    pub fn input_digest(&self, input: &InputRecord) -> [u8; 32] {
        Sha512_256::new()
            .chain_update("sign_input")
            .chain_update(self.message)
            .chain_update(input.index.to_le_bytes())
            .chain_update(input.pseudo_out.as_bytes())
            .chain_update(input.source)
            .finalize()
            .into()
    }
}

/// Accumulator over transaction inputs and outputs
pub struct Accumulator {
    prefix: Transcript,
    rct: Sha512_256,

    value_gen: RistrettoPoint,

    pseudo_output_sum: RistrettoPoint,
    output_commitment_sum: RistrettoPoint,

    input_mask_sum: Scalar,
    output_mask_sum: Scalar,

    num_inputs: u32,
    num_outputs: u32,
    inputs_folded: u32,
    outputs_folded: u32,
}

impl Accumulator {
    /// Create a new accumulator for the provided transaction parameters
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn new(params: &TxParams) -> Self {
        let mut prefix = Transcript::new(b"ledger-rct prefix");
        prefix.append_u64(b"version", params.version as u64);
        prefix.append_u64(b"network", params.network as u64);
        prefix.append_u64(b"flags", params.flags.bits() as u64);
        prefix.append_u64(b"unlock_time", params.unlock_time);
        prefix.append_u64(b"num_inputs", params.num_inputs as u64);
        prefix.append_u64(b"num_outputs", params.num_outputs as u64);

        let rct = Sha512_256::new()
            .chain_update("rct")
            .chain_update(params.fee.to_le_bytes());

        let value_gen = value_generator();

        // Fee is committed with a zero mask
        let output_commitment_sum = value_gen * Scalar::from(params.fee);

        Self {
            prefix,
            rct,
            value_gen,
            pseudo_output_sum: RistrettoPoint::identity(),
            output_commitment_sum,
            input_mask_sum: Scalar::ZERO,
            output_mask_sum: Scalar::ZERO,
            num_inputs: params.num_inputs,
            num_outputs: params.num_outputs,
            inputs_folded: 0,
            outputs_folded: 0,
        }
    }

    /// Compute a value commitment `m·G + v·H`
    pub fn commit(&self, value: u64, mask: &Scalar) -> RistrettoPoint {
        RISTRETTO_BASEPOINT_POINT * mask + self.value_gen * Scalar::from(value)
    }

    /// Add a pseudo-output blinding factor (at `SetInput`)
    pub fn add_input_mask(&mut self, mask: &Scalar) {
        self.input_mask_sum += mask;
    }

    /// Fold an authenticated input record into the transcript and pseudo-output sum
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn fold_input(&mut self, input: &InputRecord) -> Result<(), Error> {
        if self.inputs_folded >= self.num_inputs {
            return Err(Error::InvalidState);
        }

        let pseudo_out = input.pseudo_out.decompress().ok_or(Error::Integrity)?;

        self.prefix.append_u64(b"input_index", input.index as u64);
        self.prefix.append_message(b"input_source", &input.source);

        self.rct.update(input.pseudo_out.as_bytes());

        self.pseudo_output_sum += pseudo_out;
        self.inputs_folded += 1;

        Ok(())
    }

    /// Close the input segment of the transcript
    pub fn finalize_inputs(&mut self) -> Result<(), Error> {
        if self.inputs_folded != self.num_inputs {
            return Err(Error::InvalidState);
        }

        self.prefix.append_u64(b"inputs_end", self.inputs_folded as u64);

        Ok(())
    }

    /// Select the blinding factor for the next output
    ///
    /// The final output takes the remaining mask balance so blinding factors cancel.
    pub fn output_mask<RNG: CryptoRngCore>(&self, last: bool, rng: &mut RNG) -> Scalar {
        match last {
            true => self.input_mask_sum - self.output_mask_sum,
            false => random_scalar(rng),
        }
    }

    /// Fold an output into the transcript and output commitment sum, returning the commitment
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn fold_output(
        &mut self,
        output: &OutputDescriptor,
        mask: &Scalar,
    ) -> Result<CompressedRistretto, Error> {
        if self.outputs_folded >= self.num_outputs {
            return Err(Error::InvalidState);
        }

        let commitment = self.commit(output.amount, mask);
        let c = commitment.compress();

        self.prefix.append_u64(b"output_index", output.index as u64);
        self.prefix.append_message(b"output_destination", &output.destination);

        self.rct.update(c.as_bytes());
        if let Some(rp) = &output.range_proof {
            self.rct.update(rp);
        }

        self.output_commitment_sum += commitment;
        self.output_mask_sum += mask;
        self.outputs_folded += 1;

        Ok(c)
    }

    /// Check pseudo-output and output commitment sums balance
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn finalize_balance_check(&self) -> Result<(), Error> {
        if self.outputs_folded != self.num_outputs {
            return Err(Error::InvalidState);
        }

        if self.pseudo_output_sum != self.output_commitment_sum {
            #[cfg(feature = "log")]
            log::error!("commitment balance check failed");

            return Err(Error::Integrity);
        }

        Ok(())
    }

    /// Compute the signing message, consuming the transcript state
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn finalize_message(&mut self) -> SigningMessage {
        let mut prefix_hash = [0u8; 32];
        self.prefix.challenge_bytes(b"prefix_hash", &mut prefix_hash);

        let rct = core::mem::take(&mut self.rct);
        let rct_hash = rct.finalize();

        let message = Sha512_256::new()
            .chain_update("tx_message")
            .chain_update(prefix_hash)
            .chain_update(rct_hash)
            .finalize()
            .into();

        SigningMessage {
            prefix_hash,
            message,
        }
    }
}

impl Zeroize for Accumulator {
    fn zeroize(&mut self) {
        self.input_mask_sum.zeroize();
        self.output_mask_sum.zeroize();
        self.pseudo_output_sum.zeroize();
        self.output_commitment_sum.zeroize();
        self.inputs_folded = 0;
        self.outputs_folded = 0;
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;
    use crate::engine::{KeyPath, Network, TxFlags};

    fn params(num_inputs: u32, num_outputs: u32, fee: u64) -> TxParams {
        TxParams {
            version: 2,
            network: Network::Testnet,
            flags: TxFlags::empty(),
            unlock_time: 0,
            fee,
            num_inputs,
            num_outputs,
            account_path: KeyPath::new(&[44, 128, 0]).unwrap(),
        }
    }

    fn input(acc: &mut Accumulator, index: u32, amount: u64) -> InputRecord {
        let m = random_scalar(&mut OsRng {});
        acc.add_input_mask(&m);

        InputRecord {
            index,
            amount,
            key_path: KeyPath::new(&[44, 128, 0, index]).unwrap(),
            source: [index as u8; 32],
            pseudo_out: acc.commit(amount, &m).compress(),
        }
    }

    fn output(index: u32, amount: u64) -> OutputDescriptor {
        OutputDescriptor {
            index,
            amount,
            destination: [0xd0 | index as u8; 32],
            range_proof: None,
        }
    }

    /// Run a transaction through the accumulator
    fn run(ins: &[u64], outs: &[u64], fee: u64) -> Result<SigningMessage, Error> {
        let mut acc = Accumulator::new(&params(ins.len() as u32, outs.len() as u32, fee));

        let records: Vec<_> = ins
            .iter()
            .enumerate()
            .map(|(i, v)| input(&mut acc, i as u32, *v))
            .collect();

        for r in &records {
            acc.fold_input(r)?;
        }
        acc.finalize_inputs()?;

        for (i, v) in outs.iter().enumerate() {
            let m = acc.output_mask(i + 1 == outs.len(), &mut OsRng {});
            acc.fold_output(&output(i as u32, *v), &m)?;
        }

        acc.finalize_balance_check()?;

        Ok(acc.finalize_message())
    }

    #[test]
    fn commitment_homomorphic() {
        let acc = Accumulator::new(&params(1, 1, 0));

        let a = Scalar::from(7u64);
        let b = Scalar::from(11u64);

        assert_eq!(acc.commit(5, &a) + acc.commit(6, &b), acc.commit(11, &(a + b)));
    }

    #[test]
    fn balanced() {
        run(&[1_000, 2_500], &[3_000, 490], 10).unwrap();
        run(&[u64::MAX], &[u64::MAX - 1], 1).unwrap();
    }

    #[test]
    fn unbalanced() {
        assert_eq!(run(&[1_000, 2_500], &[3_000, 491], 10), Err(Error::Integrity));
        assert_eq!(run(&[1_000], &[1_000], 1), Err(Error::Integrity));
    }

    #[test]
    fn perturbed_commitment() {
        let mut acc = Accumulator::new(&params(1, 1, 0));

        let r = input(&mut acc, 0, 100);
        acc.fold_input(&r).unwrap();
        acc.finalize_inputs().unwrap();

        let m = acc.output_mask(true, &mut OsRng {});
        acc.fold_output(&output(0, 100), &(m + Scalar::ONE)).unwrap();

        assert_eq!(acc.finalize_balance_check(), Err(Error::Integrity));
    }

    #[test]
    fn incomplete_fold() {
        let mut acc = Accumulator::new(&params(2, 1, 0));

        let r = input(&mut acc, 0, 100);
        acc.fold_input(&r).unwrap();

        assert_eq!(acc.finalize_inputs(), Err(Error::InvalidState));
    }

    #[test]
    fn message_binds_outputs() {
        let a = run(&[100], &[60, 40], 0).unwrap();
        let b = run(&[100], &[40, 60], 0).unwrap();

        assert_ne!(a.message, b.message);
    }

    #[test]
    fn input_digest_binds_index() {
        let mut acc = Accumulator::new(&params(2, 1, 0));
        let r0 = input(&mut acc, 0, 100);
        let mut r1 = r0.clone();
        r1.index = 1;

        let m = SigningMessage {
            prefix_hash: [1u8; 32],
            message: [2u8; 32],
        };

        assert_ne!(m.input_digest(&r0), m.input_digest(&r1));
    }
}
