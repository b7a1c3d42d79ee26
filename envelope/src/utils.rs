// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use base64::{Engine as _, prelude::BASE64_STANDARD};

#[inline]
pub fn base64_encode(input: &[u8]) -> String {
    BASE64_STANDARD.encode(input)
}

#[inline]
pub fn base64_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_STANDARD.decode(input)
}
