// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Options Envelope
//!
//! Symmetric envelope encoding for option-list callback responses.
//!
//! ## Wire Format
//!
//! ```text
//! base64( IV (16 bytes) || AES-256-CBC ciphertext (PKCS#7 padded) )
//! ```
//!
//! The AES key is the SHA-256 digest of a shared passphrase. A conformant
//! peer recomputes the key from the same passphrase, strips the first 16
//! bytes of the decoded payload as the IV, and decrypts the remainder.
//! There is no length prefix and no authentication tag.
//!
//! ## Modules
//!
//! - [`cipher`]: key derivation and envelope encryption
//! - [`constants`]: key, IV and block sizes
//! - [`errors`]: encryption error types
//! - [`utils`]: base64 helpers

pub mod cipher;
pub mod constants;
pub mod errors;
pub mod utils;

pub use cipher::{DerivedKey, derive_key, encrypt, encrypt_str};
pub use errors::EnvelopeError;
