// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Envelope encryption.
//!
//! Each call to [`encrypt`] derives the AES-256 key from the passphrase,
//! lets the cipher generate a fresh random IV, and emits
//! `base64(IV || ciphertext)`. Two encryptions of the same plaintext under
//! the same passphrase therefore never produce the same envelope.
//!
//! # Security
//!
//! - The IV is always generated by the cipher's CSPRNG and is never taken
//!   from the caller.
//! - Derived key material is zeroized on drop.
//! - On any failure an error is returned; plaintext is never emitted in
//!   place of an envelope.

use std::fmt;

use aws_lc_rs::cipher::{AES_256, DecryptionContext, PaddedBlockEncryptingKey, UnboundCipherKey};
use aws_lc_rs::digest::{SHA256, digest};
use zeroize::ZeroizeOnDrop;

use crate::constants::{IV_LEN, KEY_LEN};
use crate::errors::EnvelopeError;
use crate::utils::base64_encode;

/// AES-256 key derived from a shared passphrase.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// Custom Debug implementation to prevent accidental logging of key material
impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DerivedKey").field(&"[REDACTED]").finish()
    }
}

/// Derives the envelope key as `SHA-256(passphrase)`.
///
/// The derivation is deterministic so that an external decrypter holding
/// the same passphrase arrives at the same key independently.
pub fn derive_key(passphrase: &str) -> DerivedKey {
    let hashed = digest(&SHA256, passphrase.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(hashed.as_ref());
    DerivedKey(key)
}

/// Encrypts `plaintext` into a base64 envelope of `IV || ciphertext`.
///
/// # Errors
///
/// - [`EnvelopeError::EmptyPassphrase`] - the passphrase is empty
/// - [`EnvelopeError::Cipher`] - the cipher rejected the key or failed to encrypt
/// - [`EnvelopeError::MissingIv`] - the cipher returned no usable IV
pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<String, EnvelopeError> {
    if passphrase.is_empty() {
        return Err(EnvelopeError::EmptyPassphrase);
    }

    let encrypting_key = encrypting_key(passphrase)?;

    let mut ciphertext = plaintext.to_vec();
    let context = encrypting_key
        .encrypt(&mut ciphertext)
        .map_err(|err| EnvelopeError::Cipher(format!("unable to encrypt: {err:?}")))?;

    let iv = iv_bytes(&context)?;

    Ok(assemble(iv, &ciphertext))
}

fn encrypting_key(passphrase: &str) -> Result<PaddedBlockEncryptingKey, EnvelopeError> {
    let key = derive_key(passphrase);

    let unbound = UnboundCipherKey::new(&AES_256, key.as_bytes())
        .map_err(|err| EnvelopeError::Cipher(format!("unable to load key: {err:?}")))?;
    PaddedBlockEncryptingKey::cbc_pkcs7(unbound)
        .map_err(|err| EnvelopeError::Cipher(format!("unable to build cbc key: {err:?}")))
}

fn assemble(iv: &[u8], ciphertext: &[u8]) -> String {
    let mut envelope = Vec::with_capacity(IV_LEN + ciphertext.len());
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(ciphertext);

    base64_encode(&envelope)
}

/// Convenience wrapper around [`encrypt`] for UTF-8 payloads.
#[inline]
pub fn encrypt_str(plaintext: &str, passphrase: &str) -> Result<String, EnvelopeError> {
    encrypt(plaintext.as_bytes(), passphrase)
}

fn iv_bytes(context: &DecryptionContext) -> Result<&[u8], EnvelopeError> {
    let iv: &[u8] = context.try_into().map_err(|_| EnvelopeError::MissingIv)?;
    if iv.len() != IV_LEN {
        return Err(EnvelopeError::MissingIv);
    }
    Ok(iv)
}
