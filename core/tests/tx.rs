use ledger_rct_core::engine::{
    Engine, Phase, Request, Response, Session, TxFlags, MAX_INPUTS,
};

mod helpers;
use helpers::*;

#[test]
fn tx_2x2() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let tx = Transaction::new(&[1_000_000, 2_500_000], &[3_000_000, 490_000], 10_000);

    let (host, ack) = sign(&mut e, &tx)?;

    assert_eq!(ack.signatures.len(), 2);
    assert_eq!(host.outputs.len(), 2);
    assert_eq!(host.message.as_ref().map(|m| m.message), Some(ack.message));

    verify_signatures(&kc, &host, &ack)?;

    Ok(())
}

#[test]
fn tx_single_input() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let tx = Transaction::new(&[500], &[500], 0);
    let (host, ack) = sign(&mut e, &tx)?;

    verify_signatures(&kc, &host, &ack)?;

    Ok(())
}

#[test]
fn tx_max_inputs() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let ins: Vec<u64> = (1..=MAX_INPUTS as u64).map(|v| v * 1_000).collect();
    let total: u64 = ins.iter().sum();

    let tx = Transaction::new(&ins, &[total / 2, total / 2 - 100], 100);
    let (host, ack) = sign(&mut e, &tx)?;

    assert_eq!(ack.signatures.len(), MAX_INPUTS);
    verify_signatures(&kc, &host, &ack)?;

    Ok(())
}

#[test]
fn tx_range_proof_offload() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let mut tx = Transaction::new(&[700, 300], &[600, 390], 10);
    tx.params.flags = TxFlags::RANGE_PROOF_OFFLOAD;
    for (i, o) in tx.outputs.iter_mut().enumerate() {
        o.range_proof = Some([0xa0 | i as u8; 32]);
    }

    let (host, ack) = sign(&mut e, &tx)?;

    let rp: Vec<_> = host.outputs.iter().map(|o| o.payload.range_proof).collect();
    assert_eq!(rp, vec![[0xa0; 32], [0xa1; 32]]);

    verify_signatures(&kc, &host, &ack)?;

    Ok(())
}

/// Output commitments must sum with the fee to the pseudo-output commitments
#[test]
fn tx_commitments_balance() -> anyhow::Result<()> {
    use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};
    use ledger_rct_core::engine::value_generator;

    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let fee = 25;
    let tx = Transaction::new(&[400, 600], &[275, 700], fee);
    let (host, _ack) = sign(&mut e, &tx)?;

    let pseudo_outs = host
        .inputs
        .iter()
        .map(|(r, _)| r.payload.pseudo_out.decompress().unwrap())
        .fold(RistrettoPoint::identity(), |a, p| a + p);

    let outs = host
        .outputs
        .iter()
        .map(|o| o.payload.commitment.decompress().unwrap())
        .fold(value_generator() * Scalar::from(fee), |a, p| a + p);

    assert_eq!(pseudo_outs, outs);

    Ok(())
}

/// Sessions are independent, identical transactions produce distinct commitments
#[test]
fn tx_sessions_independent() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let tx = Transaction::new(&[100, 200], &[300], 0);

    let (a, _) = sign(&mut e, &tx)?;
    let (b, _) = sign(&mut e, &tx)?;

    assert_ne!(a.inputs[0].0.payload.pseudo_out, b.inputs[0].0.payload.pseudo_out);
    assert_ne!(a.inputs[0].0.tag, b.inputs[0].0.tag);

    Ok(())
}

#[test]
fn tx_digest_mirrors_host() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let tx = Transaction::new(&[100, 200], &[150, 150], 0);

    let mut host = Host::default();
    let mut session = Session::new();

    let r = host.step(&mut e, &mut session, &tx)?;
    let mut digest = r.digest().clone();

    while !session.is_terminal() {
        let req = host.next(&session, &tx);
        let r = host.step(&mut e, &mut session, &tx)?;

        if let Some(h) = req.hash() {
            digest.update(&h);
        }
        assert_eq!(&digest, r.digest());
    }

    assert_eq!(session.phase(), Phase::Complete);

    Ok(())
}

#[test]
fn tx_restart_after_complete() -> anyhow::Result<()> {
    init_logger();

    let kc = keychain()?;
    let mut e = Engine::new(&kc);

    let tx = Transaction::new(&[100], &[100], 0);

    let mut host = Host::default();
    let (mut session, _) = e.start(tx.params.clone())?;
    host.advance_to(&mut e, &mut session, &tx, Phase::Complete)?;

    // Sessions restart from Init
    let r = e.handle(&mut session, &Request::Init(tx.params.clone()))?;
    assert!(matches!(r, Response::State { phase: Phase::SetInput, .. }));

    Ok(())
}
