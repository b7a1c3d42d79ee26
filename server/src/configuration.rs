// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::time::Duration;

use clap::Parser;

use crate::constants;
use crate::errors::AppError;

#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ServerOptions {
    #[arg(long, default_value = "127.0.0.1", env("OPTIONS_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "8080", env("OPTIONS_HTTP_PORT"))]
    pub port: u16,
    #[arg(long, default_value = constants::DEFAULT_FEISHU_BASE_URL, env("FEISHU_BASE_URL"))]
    pub feishu_base_url: String,
    #[arg(long, default_value = "", env("FEISHU_APP_ID"))]
    pub app_id: String,
    #[arg(long, default_value = "", env("FEISHU_APP_SECRET"), hide_env_values = true)]
    pub app_secret: String,
    #[arg(long, default_value = "", env("BITABLE_APP_TOKEN"))]
    pub app_token: String,
    #[arg(long, default_value = "", env("BITABLE_TABLE_ID"))]
    pub table_id: String,
    #[arg(long, env("BITABLE_VIEW_ID"))]
    pub view_id: Option<String>,
    #[arg(long, default_value = "", env("CALLBACK_VERIFICATION_TOKEN"), hide_env_values = true)]
    pub verification_token: String,
    /// When set, every option list is returned inside an encrypted envelope
    #[arg(long, env("CALLBACK_ENCRYPT_KEY"), hide_env_values = true)]
    pub encrypt_key: Option<String>,
    #[arg(long, default_value = "3600", env("OPTIONS_TOKEN_TTL_SECS"))]
    pub token_ttl_secs: u64,
    #[arg(long, default_value = "300", env("OPTIONS_TOKEN_REFRESH_MARGIN_SECS"))]
    pub token_refresh_margin_secs: u64,
    #[arg(long, default_value = "10", env("OPTIONS_REQUEST_TIMEOUT_SECS"))]
    pub request_timeout_secs: u64,
    #[arg(long, default_value = "100", env("OPTIONS_PAGE_SIZE"))]
    pub page_size: u32,
}

impl ServerOptions {
    /// Rejects configurations that cannot serve a single callback.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("app_id", &self.app_id),
            ("app_secret", &self.app_secret),
            ("app_token", &self.app_token),
            ("table_id", &self.table_id),
            ("verification_token", &self.verification_token),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::ConfigError(format!("{name} must be set")));
            }
        }

        if matches!(&self.encrypt_key, Some(key) if key.is_empty()) {
            return Err(AppError::ConfigError(
                "encrypt_key must not be empty when set".to_string(),
            ));
        }

        if self.page_size == 0 || self.page_size > constants::MAX_PAGE_SIZE {
            return Err(AppError::ConfigError(format!(
                "page_size must be between 1 and {}",
                constants::MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            host: "127.0.0.1".to_string(),
            port: 8080,
            feishu_base_url: constants::DEFAULT_FEISHU_BASE_URL.to_string(),
            app_id: String::new(),
            app_secret: String::new(),
            app_token: String::new(),
            table_id: String::new(),
            view_id: None,
            verification_token: String::new(),
            encrypt_key: None,
            token_ttl_secs: constants::DEFAULT_TOKEN_TTL.as_secs(),
            token_refresh_margin_secs: constants::DEFAULT_TOKEN_REFRESH_MARGIN.as_secs(),
            request_timeout_secs: constants::DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
            page_size: constants::DEFAULT_PAGE_SIZE,
        }
    }
}

// Custom Debug implementation to prevent accidental logging of secrets
impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("feishu_base_url", &self.feishu_base_url)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("app_token", &self.app_token)
            .field("table_id", &self.table_id)
            .field("view_id", &self.view_id)
            .field("verification_token", &"[REDACTED]")
            .field("encrypt_key", &self.encrypt_key.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}
