// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Platform key derivation and signing
//!
//! The [Engine][crate::engine::Engine] never holds derived keys beyond the single
//! operation requiring them, keys are zeroized by the engine once used.

use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

/// Keychain errors, propagated unchanged via [`Error::Keychain`][crate::engine::Error::Keychain]
#[derive(Copy, Clone, PartialEq, Eq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
#[repr(u8)]
pub enum KeychainError {
    /// Derivation path rejected
    InvalidPath = 0x01,
    /// Key derivation failed
    DerivationFailed = 0x02,
    /// Signing failed
    SigningFailed = 0x03,
}

#[cfg(feature = "std")]
impl std::error::Error for KeychainError {}

/// Detached 64-byte signature
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl core::fmt::Debug for Signature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// [`Keychain`] trait provides platform key support for [Engine][crate::engine::Engine] instances
pub trait Keychain {
    /// Derived key handle
    type Key: AsRef<[u8]> + Zeroize;

    /// Derive the signing key for a path
    fn derive_signing_key(&self, path: &[u32]) -> Result<Self::Key, KeychainError>;

    /// Sign a message with a derived key
    fn sign(&self, key: &Self::Key, message: &[u8]) -> Result<Signature, KeychainError>;
}

impl<T: Keychain> Keychain for &T {
    type Key = T::Key;

    fn derive_signing_key(&self, path: &[u32]) -> Result<Self::Key, KeychainError> {
        T::derive_signing_key(self, path)
    }

    fn sign(&self, key: &Self::Key, message: &[u8]) -> Result<Signature, KeychainError> {
        T::sign(self, key, message)
    }
}

#[cfg(feature = "slip10")]
pub use slip10::{Slip10Key, Slip10Keychain};

#[cfg(feature = "slip10")]
mod slip10 {
    use ed25519_dalek::{Signer, SigningKey};
    use static_assertions::const_assert;
    use zeroize::Zeroize;

    use super::{Keychain, KeychainError, Signature};

    // slip10_ed25519 depends on std
    const_assert!(cfg!(feature = "std"));

    /// SLIP-0010 derived ed25519 private key
    pub struct Slip10Key([u8; 32]);

    impl AsRef<[u8]> for Slip10Key {
        fn as_ref(&self) -> &[u8] {
            &self.0
        }
    }

    impl Zeroize for Slip10Key {
        fn zeroize(&mut self) {
            self.0.zeroize();
        }
    }

    impl Drop for Slip10Key {
        fn drop(&mut self) {
            self.zeroize();
        }
    }

    /// SLIP-0010 / ed25519 keychain over a BIP-0039 seed
    pub struct Slip10Keychain {
        seed: [u8; 64],
    }

    impl Slip10Keychain {
        /// Create a keychain from a 64-byte seed
        pub fn new(seed: &[u8]) -> Result<Self, KeychainError> {
            if seed.len() != 64 {
                return Err(KeychainError::DerivationFailed);
            }

            let mut s = [0u8; 64];
            s.copy_from_slice(seed);

            Ok(Self { seed: s })
        }

        /// Fetch the ed25519 public key for a path
        pub fn public_key(&self, path: &[u32]) -> Result<[u8; 32], KeychainError> {
            let k = self.derive_signing_key(path)?;

            Ok(SigningKey::from_bytes(&k.0).verifying_key().to_bytes())
        }
    }

    impl Drop for Slip10Keychain {
        fn drop(&mut self) {
            self.seed.zeroize();
        }
    }

    impl Keychain for Slip10Keychain {
        type Key = Slip10Key;

        fn derive_signing_key(&self, path: &[u32]) -> Result<Self::Key, KeychainError> {
            if path.is_empty() {
                return Err(KeychainError::InvalidPath);
            }

            Ok(Slip10Key(slip10_ed25519::derive_ed25519_private_key(
                &self.seed, path,
            )))
        }

        fn sign(&self, key: &Self::Key, message: &[u8]) -> Result<Signature, KeychainError> {
            let k = SigningKey::from_bytes(&key.0);

            Ok(Signature(k.sign(message).to_bytes()))
        }
    }

}
