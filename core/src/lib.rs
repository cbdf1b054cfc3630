// Copyright (c) 2022-2023 The MobileCoin Foundation

//! RingCT hardware wallet signing core
//!
//! This provides a streaming [Engine][engine::Engine] that signs transactions far larger than
//! the device working memory, one host round-trip at a time. The host is untrusted: every value
//! the engine hands back for later use carries an authentication tag bound to the signing
//! session, the item index and the item kind, and is rejected on return if any of these differ.
//!
//! Interactions with the [Engine][engine::Engine] are performed via typed
//! [Request][engine::Request]s and [Response][engine::Response]s against an explicitly owned
//! [Session][engine::Session], wire encoding is left to the surrounding application.
//!
//! ## Executing a transaction
//!
//! A signing session consists of the following ordered phases, each request is only legal in
//! the phase listed and per-item requests must present the index the engine expects next.
//!
//! 1. [`Request::Init`][engine::Request::Init] with [`TxParams`][engine::TxParams] fixes the
//!    network, flags, fee and the declared input and output counts, derives the session secret
//!    and moves to `SetInput`.
//! 2. [`Request::SetInput`][engine::Request::SetInput] for each input, returning an
//!    [`InputRecord`][engine::InputRecord] (containing the input pseudo-output commitment) and
//!    the sealed pseudo-output blinding, both tagged for later return.
//! 3. [`Request::InputVini`][engine::Request::InputVini] for each input, returning the tagged
//!    input record so it can be folded into the transaction prefix transcript.
//! 4. [`Request::AllInputsSet`][engine::Request::AllInputsSet] closes the input segment.
//! 5. [`Request::SetOutput`][engine::Request::SetOutput] for each output, returning a tagged
//!    [`OutputRecord`][engine::OutputRecord] containing the output commitment.
//! 6. [`Request::AllOutputsSet`][engine::Request::AllOutputsSet] checks the pseudo-output and
//!    output commitment sums balance and fixes the signing message.
//! 7. [`Request::SignInput`][engine::Request::SignInput] for each input, returning the tagged
//!    input record and sealed blinding to obtain one signature per input.
//! 8. [`Request::Final`][engine::Request::Final] returns the [`FinalAck`][engine::FinalAck]
//!    containing all signatures and wipes the session.
//!
//! Any deviation from this sequence, any authentication failure and any keychain failure aborts
//! the session and destroys its secret material, the host must then restart from `Init`.
//!
//! Each response contains a rolling [digest][engine::TxDigest] over the requests applied so far,
//! allowing the host to detect loss of synchronisation with the device.
//!
//! ## Key material
//!
//! Keys are provided by a platform [Keychain][keychain::Keychain], derived keys are held only for
//! the single operation that requires them. A SLIP-0010 / ed25519 reference implementation is
//! available via the `slip10` feature.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod engine;

pub mod keychain;

mod helpers;
