// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Bitable record filter expressions.
//!
//! Filters use the upstream formula syntax, e.g.
//! `CurrentValue.[Department/ProductLine]="Sales"`. Values are quoted and
//! escaped so caller-provided text cannot terminate the string literal or
//! inject further formula syntax. Query-string encoding happens in the HTTP
//! client.

use std::fmt;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression(String);

impl FilterExpression {
    /// Builds `CurrentValue.[field]="value"`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ValidationError`] if the field name is empty or
    /// contains brackets, quotes or control characters, or if the value
    /// contains control characters.
    pub fn field_equals(field: &str, value: &str) -> Result<Self, AppError> {
        validate_field_name(field)?;

        if value.chars().any(char::is_control) {
            return Err(AppError::ValidationError(format!(
                "filter value for '{field}' contains control characters"
            )));
        }

        Ok(Self(format!(
            "CurrentValue.[{}]=\"{}\"",
            field,
            escape_value(value)
        )))
    }

    /// Wraps a pre-built expression; it is forwarded to the upstream verbatim.
    pub fn raw(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_field_name(field: &str) -> Result<(), AppError> {
    if field.trim().is_empty() {
        return Err(AppError::ValidationError(
            "filter field name must not be empty".to_string(),
        ));
    }
    if field
        .chars()
        .any(|c| matches!(c, '[' | ']' | '"') || c.is_control())
    {
        return Err(AppError::ValidationError(format!(
            "invalid filter field name: {field:?}"
        )));
    }
    Ok(())
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
