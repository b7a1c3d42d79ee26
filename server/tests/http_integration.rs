// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP integration tests for the options callback API.
//!
//! These tests use `axum-test` to drive the full request/response cycle
//! through the Axum router with all middleware applied, and `mockito` to
//! stand in for the Feishu auth and Bitable endpoints.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use aws_lc_rs::cipher::{AES_256, DecryptionContext, PaddedBlockDecryptingKey, UnboundCipherKey};
use aws_lc_rs::digest::{SHA256, digest};
use aws_lc_rs::iv::FixedLength;
use axum::body::Bytes;
use axum_test::TestServer;
use mockito::{Matcher, Mock, ServerGuard};
use options_envelope::constants::IV_LEN;
use options_envelope::utils::base64_decode;
use options_server::application::{build_gateway, create_router};
use options_server::configuration::ServerOptions;
use serde_json::{Value, json};

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const RECORDS_PATH: &str = "/open-apis/bitable/v1/apps/bascn_test/tables/tbl_test/records";

fn test_options(base_url: &str) -> ServerOptions {
    ServerOptions {
        feishu_base_url: base_url.to_string(),
        app_id: "cli_test".to_string(),
        app_secret: "app-secret".to_string(),
        app_token: "bascn_test".to_string(),
        table_id: "tbl_test".to_string(),
        verification_token: "verify-me".to_string(),
        ..ServerOptions::default()
    }
}

/// Creates a test server wired to `base_url` for every upstream call.
///
/// The server includes the same middleware as production (body limit, timeout).
fn create_test_server(options: ServerOptions) -> TestServer {
    let gateway = Arc::new(build_gateway(&options).unwrap());
    let app = create_router(options, gateway);
    TestServer::new(app).unwrap()
}

/// Test server whose upstream is unreachable; only for paths that never
/// leave the process.
fn create_offline_test_server() -> TestServer {
    create_test_server(test_options("http://127.0.0.1:9"))
}

async fn mock_token(upstream: &mut ServerGuard) -> Mock {
    upstream
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"code": 0, "msg": "ok", "tenant_access_token": "t-abc", "expire": 7200})
                .to_string(),
        )
        .create_async()
        .await
}

fn hod_records() -> Value {
    json!({
        "code": 0,
        "msg": "success",
        "data": {
            "has_more": false,
            "total": 3,
            "items": [
                {"record_id": "rec1", "fields": {"HOD": "Alice"}},
                {"record_id": "rec2", "fields": {"HOD": [{"type": "text", "text": "Bob"}]}},
                {"record_id": "rec3", "fields": {"HOD": "Alice"}}
            ]
        }
    })
}

fn hod_request() -> Value {
    json!({
        "token": "verify-me",
        "user_id": "ou_123",
        "linkage_params": {"department": "Sales"}
    })
}

fn peer_decrypt(envelope: &str, passphrase: &str) -> Vec<u8> {
    let decoded = base64_decode(envelope).unwrap();
    let (iv, ciphertext) = decoded.split_at(IV_LEN);

    let key = digest(&SHA256, passphrase.as_bytes());
    let unbound = UnboundCipherKey::new(&AES_256, key.as_ref()).unwrap();
    let decrypting_key = PaddedBlockDecryptingKey::cbc_pkcs7(unbound).unwrap();

    let iv = FixedLength::<IV_LEN>::try_from(iv).unwrap();
    let mut in_out = ciphertext.to_vec();
    decrypting_key
        .decrypt(&mut in_out, DecryptionContext::Iv128(iv))
        .unwrap()
        .to_vec()
}

// =============================================================================
// Health and Sources Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_status_ok_body() {
    let server = create_offline_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({"status": "ok"}));
}

#[tokio::test]
async fn test_sources_endpoint_lists_catalog() {
    let server = create_offline_test_server();
    let response = server.get("/sources").await;
    response.assert_status_ok();
    response.assert_json(&json!(["department", "hod", "hod_limit", "tier", "ceo"]));
}

// =============================================================================
// Request Rejection Tests
// =============================================================================

#[tokio::test]
async fn test_wrong_verification_token_returns_401() {
    let server = create_offline_test_server();
    let response = server
        .post("/options/hod")
        .json(&json!({"token": "not-it", "linkage_params": {"department": "Sales"}}))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "Invalid verification token");
}

#[tokio::test]
async fn test_unknown_source_returns_404() {
    let server = create_offline_test_server();
    let response = server
        .post("/options/customers")
        .json(&json!({"token": "verify-me"}))
        .await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["message"], "Unknown option source: customers");
}

#[tokio::test]
async fn test_missing_linkage_param_returns_400() {
    let server = create_offline_test_server();
    let response = server
        .post("/options/hod")
        .json(&json!({"token": "verify-me"}))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["message"], "missing linkage parameter: department");
}

#[tokio::test]
async fn test_empty_token_returns_400() {
    let server = create_offline_test_server();
    let response = server
        .post("/options/department")
        .json(&json!({"token": ""}))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_invalid_json_is_rejected() {
    let server = create_offline_test_server();
    let response = server
        .post("/options/department")
        .content_type("application/json")
        .bytes(Bytes::from("{invalid json"))
        .await;
    response.assert_status_bad_request();
}

/// Test POST with >1MB body returns HTTP 413 Payload Too Large.
#[tokio::test]
async fn test_oversized_request_body_returns_413() {
    let server = create_offline_test_server();
    let oversized_body = vec![b'a'; 1024 * 1024 + 1];
    let response = server
        .post("/options/department")
        .content_type("application/json")
        .bytes(Bytes::from(oversized_body))
        .await;
    response.assert_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// End-to-end Option List Tests
// =============================================================================

#[tokio::test]
async fn test_hod_options_in_upstream_order() {
    let mut upstream = mockito::Server::new_async().await;
    let token_mock = mock_token(&mut upstream).await;
    let records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .match_header("authorization", "Bearer t-abc")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "filter".into(),
                "CurrentValue.[Department/ProductLine]=\"Sales\"".into(),
            ),
            Matcher::UrlEncoded("field_names".into(), "[\"HOD\"]".into()),
            Matcher::UrlEncoded("page_size".into(), "100".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(hod_records().to_string())
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let response = server.post("/options/hod").json(&hod_request()).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "success!");

    let result: Value = serde_json::from_str(body["data"]["result"].as_str().unwrap()).unwrap();
    assert_eq!(
        result["options"],
        json!([
            {"id": "opt_0", "value": "@i18n@opt_0", "isDefault": false},
            {"id": "opt_1", "value": "@i18n@opt_1", "isDefault": false}
        ])
    );
    assert_eq!(result["i18nResources"][0]["locale"], "zh_cn");
    assert_eq!(result["i18nResources"][0]["isDefault"], true);
    assert_eq!(
        result["i18nResources"][0]["texts"],
        json!({"@i18n@opt_0": "Alice", "@i18n@opt_1": "Bob"})
    );
    assert_eq!(result["i18nResources"][1]["locale"], "en_us");

    token_mock.assert_async().await;
    records_mock.assert_async().await;
}

#[tokio::test]
async fn test_request_locale_is_added_to_resources() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = mock_token(&mut upstream).await;
    let _records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(200)
        .with_body(hod_records().to_string())
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let mut request = hod_request();
    request["locale"] = json!("ja-JP");
    let response = server.post("/options/hod").json(&request).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let result: Value = serde_json::from_str(body["data"]["result"].as_str().unwrap()).unwrap();
    let locales: Vec<&str> = result["i18nResources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["locale"].as_str().unwrap())
        .collect();
    assert_eq!(locales, vec!["zh_cn", "en_us", "ja_jp"]);
}

#[tokio::test]
async fn test_empty_table_returns_empty_option_list() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = mock_token(&mut upstream).await;
    let _records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(200)
        .with_body(json!({"code": 0, "msg": "success", "data": {"has_more": false}}).to_string())
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let response = server
        .post("/options/department")
        .json(&json!({"token": "verify-me"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let result: Value = serde_json::from_str(body["data"]["result"].as_str().unwrap()).unwrap();
    assert_eq!(result["options"], json!([]));
}

#[tokio::test]
async fn test_truncated_page_is_flagged_in_result() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = mock_token(&mut upstream).await;
    let _records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(200)
        .with_body(
            json!({
                "code": 0,
                "msg": "success",
                "data": {
                    "has_more": true,
                    "page_token": "next",
                    "total": 900,
                    "items": [{"record_id": "rec1", "fields": {"Department/ProductLine": "Sales"}}]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let response = server
        .post("/options/department")
        .json(&json!({"token": "verify-me"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let result: Value = serde_json::from_str(body["data"]["result"].as_str().unwrap()).unwrap();
    assert_eq!(result["hasMore"], true);
    assert_eq!(result["options"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_complete_page_has_no_truncation_flag() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = mock_token(&mut upstream).await;
    let _records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(200)
        .with_body(hod_records().to_string())
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let response = server.post("/options/hod").json(&hod_request()).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let result: Value = serde_json::from_str(body["data"]["result"].as_str().unwrap()).unwrap();
    assert!(result.get("hasMore").is_none());
}

#[tokio::test]
async fn test_encrypted_result_decrypts_to_option_list() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = mock_token(&mut upstream).await;
    let _records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(200)
        .with_body(hod_records().to_string())
        .create_async()
        .await;

    let options = ServerOptions {
        encrypt_key: Some("shared-key".to_string()),
        ..test_options(&upstream.url())
    };
    let server = create_test_server(options);
    let response = server.post("/options/hod").json(&hod_request()).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let envelope = body["data"]["result"].as_str().unwrap();
    assert!(!envelope.contains("Alice"));

    let plaintext = peer_decrypt(envelope, "shared-key");
    let result: Value = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(
        result["i18nResources"][0]["texts"],
        json!({"@i18n@opt_0": "Alice", "@i18n@opt_1": "Bob"})
    );
}

#[tokio::test]
async fn test_token_is_reused_across_callbacks() {
    let mut upstream = mockito::Server::new_async().await;
    let token_mock = upstream
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(
            json!({"code": 0, "tenant_access_token": "t-abc", "expire": 7200}).to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(200)
        .with_body(hod_records().to_string())
        .expect(2)
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    server.post("/options/hod").json(&hod_request()).await.assert_status_ok();
    server.post("/options/tier").json(&hod_request()).await.assert_status_ok();

    token_mock.assert_async().await;
    records_mock.assert_async().await;
}

// =============================================================================
// Upstream Failure Tests
// =============================================================================

#[tokio::test]
async fn test_upstream_server_error_returns_502() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = mock_token(&mut upstream).await;
    let _records_mock = upstream
        .mock("GET", RECORDS_PATH)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let response = server.post("/options/hod").json(&hod_request()).await;
    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["message"], "Upstream request failed");
}

#[tokio::test]
async fn test_rejected_app_credentials_return_502() {
    let mut upstream = mockito::Server::new_async().await;
    let _token_mock = upstream
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(json!({"code": 10003, "msg": "invalid app_secret"}).to_string())
        .create_async()
        .await;

    let server = create_test_server(test_options(&upstream.url()));
    let response = server.post("/options/hod").json(&hod_request()).await;
    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["message"], "Unable to authenticate upstream");
    assert!(!body.to_string().contains("app_secret"));
}
