// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// AES-256 key length, equal to the SHA-256 digest length
pub const KEY_LEN: usize = 32;

/// CBC initialization vector length, prepended to every envelope
pub const IV_LEN: usize = 16;

pub const BLOCK_LEN: usize = 16;
