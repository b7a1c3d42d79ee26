// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Bitable record queries.
//!
//! [`RecordGateway`] issues a single list-records call per fetch using the
//! cached tenant access token, and normalizes the response into a
//! [`RecordSet`].
//!
//! # Response Handling
//!
//! | Upstream outcome | Result |
//! |------------------|--------|
//! | transport error / timeout | [`AppError::UpstreamFailure`] |
//! | non-2xx status | [`AppError::UpstreamFailure`] |
//! | 2xx with non-zero `code` | [`AppError::UpstreamFailure`] |
//! | 2xx without `data.items` or not JSON | empty [`RecordSet`] |
//! | 2xx with `data.items` | records in upstream order |
//!
//! Pagination markers are surfaced on the [`RecordSet`] but never followed.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_PAGE_SIZE, INVALID_TOKEN_CODES, MAX_PAGE_SIZE};
use crate::credentials::CredentialCache;
use crate::errors::AppError;
use crate::filter::FilterExpression;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub record_id: Option<String>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the display text of `field`, if present and non-empty.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(field_text)
    }
}

/// One page of records, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    pub records: Vec<Record>,
    pub has_more: bool,
    pub page_token: Option<String>,
    pub total: Option<u64>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

pub struct RecordGateway {
    client: reqwest::Client,
    records_url: String,
    credentials: Arc<CredentialCache>,
    timeout: Duration,
}

impl RecordGateway {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        app_token: &str,
        table_id: &str,
        credentials: Arc<CredentialCache>,
        timeout: Duration,
    ) -> Self {
        let records_url = format!(
            "{}/open-apis/bitable/v1/apps/{}/tables/{}/records",
            base_url.trim_end_matches('/'),
            app_token,
            table_id
        );

        Self {
            client,
            records_url,
            credentials,
            timeout,
        }
    }

    /// Lists records matching `filter`, scoped to `field_names`.
    ///
    /// The filter is forwarded verbatim. An empty `field_names` slice
    /// requests every field. `page_size` defaults to 100 and is clamped to
    /// the upstream maximum.
    ///
    /// # Errors
    ///
    /// - [`AppError::AuthFailure`] - no tenant access token could be obtained
    /// - [`AppError::UpstreamFailure`] - the query failed or was rejected
    #[tracing::instrument(skip(self, filter), fields(filter = filter.map(FilterExpression::as_str)))]
    pub async fn fetch(
        &self,
        filter: Option<&FilterExpression>,
        field_names: &[&str],
        view_id: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<RecordSet, AppError> {
        let credential = self.credentials.get_token().await?;

        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut query: Vec<(&str, String)> = vec![("page_size", page_size.to_string())];
        if let Some(filter) = filter {
            query.push(("filter", filter.as_str().to_string()));
        }
        if !field_names.is_empty() {
            query.push(("field_names", serde_json::to_string(field_names)?));
        }
        if let Some(view_id) = view_id {
            query.push(("view_id", view_id.to_string()));
        }

        let response = self
            .client
            .get(&self.records_url)
            .timeout(self.timeout)
            .bearer_auth(credential.token())
            .query(&query)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("[server] record query failed: {}", err);
                AppError::UpstreamFailure(format!("record query failed: {err}"))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            tracing::error!("[server] unable to read record response: {}", err);
            AppError::UpstreamFailure(format!("unable to read record response: {err}"))
        })?;
        let payload: Option<Value> = serde_json::from_slice(&body).ok();
        let code = payload.as_ref().and_then(upstream_code);

        if let Some(code) = code {
            if INVALID_TOKEN_CODES.contains(&code) {
                self.credentials.invalidate(credential.token()).await;
            }
        }

        if !status.is_success() {
            tracing::error!("[server] record query returned {} (code {:?})", status, code);
            return Err(AppError::UpstreamFailure(format!(
                "record query returned {status}"
            )));
        }

        match code {
            Some(code) if code != 0 => {
                let msg = payload
                    .as_ref()
                    .and_then(|p| p.get("msg"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                tracing::error!("[server] record query rejected: {} {}", code, msg);
                Err(AppError::UpstreamFailure(format!(
                    "record query returned code {code}: {msg}"
                )))
            }
            _ => {
                let record_set = match payload {
                    Some(payload) => normalize(&payload),
                    None => {
                        tracing::warn!("[server] record response is not JSON, treating as empty");
                        RecordSet::default()
                    }
                };
                tracing::debug!(
                    "[server] fetched {} records (has_more: {})",
                    record_set.len(),
                    record_set.has_more
                );
                Ok(record_set)
            }
        }
    }
}

fn upstream_code(payload: &Value) -> Option<i64> {
    payload.get("code").and_then(Value::as_i64)
}

/// Normalizes a list-records payload. A missing records container yields an
/// empty set.
pub fn normalize(payload: &Value) -> RecordSet {
    let Some(data) = payload.get("data").filter(|d| d.is_object()) else {
        tracing::warn!("[server] record response has no data container");
        return RecordSet::default();
    };

    let has_more = data.get("has_more").and_then(Value::as_bool).unwrap_or(false);
    let page_token = data
        .get("page_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    let total = data.get("total").and_then(Value::as_u64);

    let records = match data.get("items").and_then(Value::as_array) {
        Some(items) => items.iter().filter_map(normalize_item).collect(),
        None => {
            if data.get("items").is_some_and(|items| !items.is_null()) {
                tracing::warn!("[server] record response items is not an array");
            }
            Vec::new()
        }
    };

    RecordSet {
        records,
        has_more,
        page_token,
        total,
    }
}

fn normalize_item(item: &Value) -> Option<Record> {
    let item = item.as_object()?;
    let record_id = item
        .get("record_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let fields = item
        .get("fields")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Some(Record { record_id, fields })
}

/// Flattens a Bitable cell value into display text.
///
/// Text segments (`[{"type":"text","text":"..."}]`) are concatenated; other
/// multi-valued cells (people, multi-select, links) are joined with `", "`.
pub fn field_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(field_text).collect();
            let segments = items
                .iter()
                .all(|item| item.get("text").is_some_and(Value::is_string));
            if segments {
                parts.concat()
            } else {
                parts.join(", ")
            }
        }
        Value::Object(object) => {
            return ["text", "name", "value", "link"]
                .iter()
                .find_map(|key| object.get(*key).and_then(field_text));
        }
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
