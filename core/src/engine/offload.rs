// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Offload authentication
//!
//! Values handed to the host for storage between round trips are tagged with
//! an HMAC-SHA256 keyed per item from the session secret, binding each tag to the
//! session, the item kind and the item index. Secret values (input blinding factors)
//! are additionally sealed with AES-256-GCM under a separate per-item key.

use aes_gcm::{
    aead::{generic_array::GenericArray, AeadInPlace},
    Aes256Gcm, KeyInit, Nonce,
};
use curve25519_dalek::scalar::Scalar;
use encdec::Encode;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand_core::{CryptoRngCore, RngCore};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use super::{scratch::Scratch, Error, SealedMask};

type HmacSha256 = Hmac<Sha256>;

/// Item key length (one SHA-256 block)
const ITEM_KEY_LEN: usize = 64;

/// Seal nonce, seal keys are unique per session and item and used exactly once
const SEAL_NONCE: [u8; 12] = [0u8; 12];

/// Offloaded item kind, keys (and thus tags) are separated by kind
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum ItemKind {
    Input = 0x01,
    InputMask = 0x02,
    Output = 0x03,
}

/// Per-session secret, sole input to item key derivation
///
/// Zeroized on drop, never leaves the device.
pub struct SessionSecret([u8; 32]);

impl SessionSecret {
    /// Derive a fresh session secret from signing key material
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn derive<RNG: CryptoRngCore>(rng: &mut RNG, ikm: &[u8]) -> Result<Self, Error> {
        let mut salt = [0u8; 32];
        rng.fill_bytes(&mut salt);

        let hk = Hkdf::<Sha512>::new(Some(&salt[..]), ikm);

        let mut s = [0u8; 32];
        hk.expand(b"ledger-rct session", &mut s)
            .map_err(|_| Error::InvalidState)?;

        Ok(Self(s))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Zeroize for SessionSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SessionSecret {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl core::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SessionSecret(..)")
    }
}

/// Authentication tag for an offloaded item
#[derive(Clone, PartialEq, Eq)]
pub struct Tag(pub [u8; 32]);

impl core::fmt::Debug for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Offloaded item, `(index, payload, tag)`
#[derive(Clone, PartialEq, Debug)]
pub struct Offload<T> {
    pub index: u32,
    pub payload: T,
    pub tag: Tag,
}

impl<T: Encode<Error = encdec::Error>> Offload<T> {
    /// Tag a payload for offload to the host
    pub(crate) fn issue(
        scratch: &mut Scratch,
        secret: &SessionSecret,
        kind: ItemKind,
        index: u32,
        payload: T,
    ) -> Result<Self, Error> {
        let tag = tag(secret, kind, index, scratch.encode(&payload)?)?;

        Ok(Self {
            index,
            payload,
            tag,
        })
    }

    /// Re-admit an offloaded payload, checking the tag against the expected index
    pub(crate) fn admit(
        &self,
        scratch: &mut Scratch,
        secret: &SessionSecret,
        kind: ItemKind,
        index: u32,
    ) -> Result<&T, Error> {
        let ok = verify(secret, kind, index, scratch.encode(&self.payload)?, &self.tag);

        if !ok {
            #[cfg(feature = "log")]
            log::warn!("{:?} {} failed authentication", kind, index);

            return Err(Error::Integrity);
        }

        Ok(&self.payload)
    }
}

/// Derive the authentication key for an item
#[cfg_attr(feature = "noinline", inline(never))]
pub fn derive_item_key(
    secret: &SessionSecret,
    kind: ItemKind,
    index: u32,
) -> Result<Zeroizing<[u8; ITEM_KEY_LEN]>, Error> {
    let mut k = Zeroizing::new([0u8; ITEM_KEY_LEN]);

    Hkdf::<Sha256>::new(None, secret.as_bytes())
        .expand_multi_info(&[&b"item-key"[..], &[kind as u8], &index.to_le_bytes()], &mut k[..])
        .map_err(|_| Error::InvalidState)?;

    Ok(k)
}

/// Compute the authentication tag for an encoded item
pub fn tag(secret: &SessionSecret, kind: ItemKind, index: u32, payload: &[u8]) -> Result<Tag, Error> {
    let key = derive_item_key(secret, kind, index)?;

    let mut mac = <HmacSha256 as Mac>::new_from_slice(&key[..]).map_err(|_| Error::InvalidState)?;
    mac.update(payload);

    Ok(Tag(mac.finalize().into_bytes().into()))
}

/// Verify the authentication tag for an encoded item in constant time
///
/// Fails closed, key derivation errors report as a mismatch.
pub fn verify(secret: &SessionSecret, kind: ItemKind, index: u32, payload: &[u8], t: &Tag) -> bool {
    match tag(secret, kind, index, payload) {
        Ok(expected) => expected.0[..].ct_eq(&t.0[..]).into(),
        Err(_) => false,
    }
}

fn derive_seal_key(
    secret: &SessionSecret,
    kind: ItemKind,
    index: u32,
) -> Result<Zeroizing<[u8; 32]>, Error> {
    let mut k = Zeroizing::new([0u8; 32]);

    Hkdf::<Sha256>::new(None, secret.as_bytes())
        .expand_multi_info(&[&b"seal-key"[..], &[kind as u8], &index.to_le_bytes()], &mut k[..])
        .map_err(|_| Error::InvalidState)?;

    Ok(k)
}

fn seal_aad(kind: ItemKind, index: u32) -> [u8; 5] {
    let i = index.to_le_bytes();
    [kind as u8, i[0], i[1], i[2], i[3]]
}

/// Seal a blinding scalar for offload
#[cfg_attr(feature = "noinline", inline(never))]
pub fn seal(secret: &SessionSecret, kind: ItemKind, index: u32, mask: &Scalar) -> Result<SealedMask, Error> {
    let key = derive_seal_key(secret, kind, index)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| Error::InvalidState)?;

    let mut ciphertext = mask.to_bytes();
    let aead_tag = cipher
        .encrypt_in_place_detached(
            Nonce::from_slice(&SEAL_NONCE),
            &seal_aad(kind, index),
            &mut ciphertext,
        )
        .map_err(|_| Error::InvalidState)?;

    Ok(SealedMask {
        ciphertext,
        aead_tag: aead_tag.into(),
    })
}

/// Open a sealed blinding scalar
#[cfg_attr(feature = "noinline", inline(never))]
pub fn open(secret: &SessionSecret, kind: ItemKind, index: u32, sealed: &SealedMask) -> Result<Scalar, Error> {
    let key = derive_seal_key(secret, kind, index)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| Error::InvalidState)?;

    let mut b = sealed.ciphertext;
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&SEAL_NONCE),
            &seal_aad(kind, index),
            &mut b,
            GenericArray::from_slice(&sealed.aead_tag),
        )
        .map_err(|_| Error::Integrity)?;

    let s = Option::<Scalar>::from(Scalar::from_canonical_bytes(b));
    b.zeroize();

    s.ok_or(Error::Integrity)
}
