// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("passphrase must not be empty")]
    EmptyPassphrase,
    #[error("cipher error: {0}")]
    Cipher(String),
    #[error("cipher did not produce an initialization vector")]
    MissingIv,
}
