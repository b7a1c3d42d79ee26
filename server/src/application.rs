// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::bitable::RecordGateway;
use crate::configuration::ServerOptions;
use crate::constants::{MAX_BODY_SIZE, REQUEST_TIMEOUT};
use crate::credentials::{CredentialCache, FeishuTokenSource};
use crate::routes;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::serve::Serve;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub options: ServerOptions,
    pub gateway: Arc<RecordGateway>,
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(options: ServerOptions) -> Result<Self, std::io::Error> {
        let gateway = Arc::new(build_gateway(&options)?);

        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let server = run(listener, options.clone(), gateway)?;
        let port = server.local_addr()?.port();

        tracing::info!("[server] listening at http://{}:{}", options.host, port);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Wires the token source, credential cache and record gateway.
///
/// One cache is shared by every request served by this process.
pub fn build_gateway(options: &ServerOptions) -> Result<RecordGateway, std::io::Error> {
    let client = reqwest::Client::builder()
        .timeout(options.request_timeout())
        .build()
        .map_err(std::io::Error::other)?;

    let source = FeishuTokenSource::new(
        client.clone(),
        &options.feishu_base_url,
        options.app_id.clone(),
        options.app_secret.clone(),
        options.request_timeout(),
    );
    let credentials = Arc::new(CredentialCache::new(
        source,
        options.token_ttl(),
        options.token_refresh_margin(),
    ));

    Ok(RecordGateway::new(
        client,
        &options.feishu_base_url,
        &options.app_token,
        &options.table_id,
        credentials,
        options.request_timeout(),
    ))
}

pub fn create_router(options: ServerOptions, gateway: Arc<RecordGateway>) -> Router {
    let state = Arc::new(AppState { options, gateway });

    Router::new()
        .route("/health", get(routes::health))
        .route("/sources", get(routes::list_sources))
        .route("/options/{source}", post(routes::options))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(skip(listener, gateway))]
pub fn run(
    listener: TcpListener,
    options: ServerOptions,
    gateway: Arc<RecordGateway>,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    let app = create_router(options, gateway);
    Ok(axum::serve(listener, app))
}
