// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const DEFAULT_FEISHU_BASE_URL: &str = "https://open.feishu.cn";
pub const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

/// Upstream tokens live for roughly an hour when `expire` is not reported
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300); // refresh 5 min before expiry
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// https://open.feishu.cn/document/server-docs/docs/bitable-v1/app-table-record/list
pub const MAX_PAGE_SIZE: u32 = 500;

/// Upstream codes signalling that the tenant access token was rejected
pub const INVALID_TOKEN_CODES: [i64; 3] = [99991661, 99991663, 99991668];

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1 MB

// Validation constants for OptionRequest
pub const MAX_TOKEN_LENGTH: u64 = 256;
pub const MAX_ID_LENGTH: u64 = 128;
pub const MAX_LOCALE_LENGTH: u64 = 16;
pub const MAX_LINKAGE_PARAMS: usize = 32;
pub const MAX_LINKAGE_VALUE_LENGTH: usize = 512;

pub const DEFAULT_LOCALES: [&str; 2] = ["zh_cn", "en_us"];
pub const SUCCESS_MESSAGE: &str = "success!";
