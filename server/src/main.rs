// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use clap::Parser;
use options_server::application::Application;
use options_server::configuration::ServerOptions;
use std::io::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    println!("[server] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        // the log collector adds the ingestion time.
        .without_time()
        .with_target(false)
        .init();

    // get configuration options from flags or environment variables
    let options = ServerOptions::parse();

    tracing::info!("[server] {:?}", &options);

    options.validate().map_err(|err| {
        tracing::error!("[server] invalid configuration: {}", err);
        Error::other(err.to_string())
    })?;

    if options.encrypt_key.is_none() {
        tracing::warn!("[server] no encrypt key configured, option lists are returned in plain text");
    }

    let application = Application::build(options).await?;

    application.run_until_stopped().await
}
