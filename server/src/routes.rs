// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the option-list callback API.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | GET | `/sources` | [`list_sources`] | Names of the configured option sources |
//! | POST | `/options/{source}` | [`options`] | Dynamic option-list callback |

use std::sync::Arc;

use aws_lc_rs::constant_time::verify_slices_are_equal;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde_json::json;
use validator::Validate;

use crate::application::AppState;
use crate::constants::DEFAULT_LOCALES;
use crate::errors::AppError;
use crate::models::{OptionRequest, OptionResponse};
use crate::options::{CATALOG, OptionList, collect_options, find_source, normalize_locale};

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn list_sources() -> Json<Vec<&'static str>> {
    Json(CATALOG.iter().map(|source| source.name).collect())
}

/// Answers a dynamic option-list callback.
///
/// # Request Flow
///
/// 1. Validate the incoming [`OptionRequest`]
/// 2. Verify the shared verification token
/// 3. Resolve the option source from the path
/// 4. Build the record filter from the linkage parameters
/// 5. Query the Bitable table (refreshing the tenant token if needed)
/// 6. Format the labels as a localized option list, flagging a truncated page
/// 7. Encrypt the list if an encrypt key is configured
///
/// # Errors
///
/// - [`AppError::ValidationError`] - malformed request or missing linkage parameter
/// - [`AppError::Unauthorized`] - verification token mismatch
/// - [`AppError::SourceNotFound`] - unknown option source
/// - [`AppError::AuthFailure`] / [`AppError::UpstreamFailure`] - upstream unavailable
/// - [`AppError::EncryptionFailure`] - the envelope could not be built
#[tracing::instrument(skip(state, request))]
pub async fn options(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Json(request): Json<OptionRequest>,
) -> Result<Json<OptionResponse>, AppError> {
    // 1. Validate incoming request against size limits
    request.validate().map_err(|e| {
        tracing::error!("[server] validation failed: {}", e);
        AppError::ValidationError(e.to_string())
    })?;

    // 2. Shared-secret check
    if verify_slices_are_equal(
        request.token.as_bytes(),
        state.options.verification_token.as_bytes(),
    )
    .is_err()
    {
        tracing::warn!("[server] rejected callback with invalid token");
        return Err(AppError::Unauthorized);
    }

    // 3. Resolve the option source
    let source = find_source(&source).ok_or_else(|| AppError::SourceNotFound(source.clone()))?;

    // 4. Build the filter
    let filter = source.filter(&request.linkage_params)?;

    // 5. Query upstream
    let record_set = state
        .gateway
        .fetch(
            filter.as_ref(),
            &[source.target_field],
            state.options.view_id.as_deref(),
            Some(state.options.page_size),
        )
        .await?;

    // 6. Format
    let has_more = record_set.has_more;
    if has_more {
        tracing::warn!(
            "[server] source {} truncated at {} records (total {:?})",
            source.name,
            record_set.len(),
            record_set.total
        );
    }
    let labels = collect_options(record_set, |record| source.label(record));
    let mut locales: Vec<String> = DEFAULT_LOCALES.iter().map(|l| l.to_string()).collect();
    if let Some(locale) = request.locale.as_deref().map(normalize_locale) {
        if !locale.is_empty() && !locales.contains(&locale) {
            locales.push(locale);
        }
    }
    let locales: Vec<&str> = locales.iter().map(String::as_str).collect();
    let list = OptionList::localized(&labels, &locales).truncated(has_more);
    let payload = serde_json::to_string(&list)?;

    tracing::debug!(
        "[server] built {} options for source {}",
        list.options.len(),
        source.name
    );

    // 7. Optionally encrypt
    let result = match state.options.encrypt_key.as_deref() {
        Some(key) => options_envelope::encrypt_str(&payload, key)?,
        None => payload,
    };

    Ok(Json(OptionResponse::success(result)))
}
