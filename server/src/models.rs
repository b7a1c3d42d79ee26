// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{
    MAX_ID_LENGTH, MAX_LINKAGE_PARAMS, MAX_LINKAGE_VALUE_LENGTH, MAX_LOCALE_LENGTH,
    MAX_TOKEN_LENGTH, SUCCESS_MESSAGE,
};

/// Body of a dynamic option-list callback.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct OptionRequest {
    #[validate(length(min = 1, max = MAX_TOKEN_LENGTH))]
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_ID_LENGTH))]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_ID_LENGTH))]
    pub employee_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_LOCALE_LENGTH))]
    pub locale: Option<String>,

    #[serde(default)]
    #[validate(custom(function = validate_linkage_params))]
    pub linkage_params: BTreeMap<String, String>,
}

// Custom Debug implementation to keep the verification token out of logs
impl fmt::Debug for OptionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionRequest")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("employee_id", &self.employee_id)
            .field("locale", &self.locale)
            .field("linkage_params", &self.linkage_params)
            .finish()
    }
}

fn validate_linkage_params(
    params: &BTreeMap<String, String>,
) -> Result<(), validator::ValidationError> {
    if params.len() > MAX_LINKAGE_PARAMS {
        return Err(validator::ValidationError::new("too_many_linkage_params"));
    }
    if params
        .iter()
        .any(|(key, value)| key.len() > MAX_LINKAGE_VALUE_LENGTH || value.len() > MAX_LINKAGE_VALUE_LENGTH)
    {
        return Err(validator::ValidationError::new("linkage_param_too_long"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionResponseData {
    /// Option-list JSON, or its encrypted envelope
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionResponse {
    pub code: i32,
    pub msg: String,
    pub data: OptionResponseData,
}

impl OptionResponse {
    pub fn success(result: String) -> Self {
        Self {
            code: 0,
            msg: SUCCESS_MESSAGE.to_string(),
            data: OptionResponseData { result },
        }
    }
}
