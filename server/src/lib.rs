// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Options Server
//!
//! Dynamic option-list callback service backed by a Feishu Bitable table.
//!
//! A low-code form calls this service whenever it needs the choices for a
//! dropdown. The service looks up the matching rows in a Bitable table,
//! formats the labels as an option list and, when an encrypt key is
//! configured, wraps the list in an encrypted envelope.
//!
//! ## Architecture
//!
//! ```text
//! Form -> HTTP API -> Options Server (this crate) -> Bitable records API
//!                            |
//!                            +-> tenant token endpoint (cached credential)
//!                            +-> options-envelope (AES-256-CBC result)
//! ```
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum, body limits, and timeouts
//! - [`bitable`]: Record queries and response normalization
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Configuration constants for the application
//! - [`credentials`]: Tenant access token caching with single-flight refresh
//! - [`errors`]: Application error types with HTTP response mapping
//! - [`filter`]: Record filter expressions with value escaping
//! - [`models`]: Request/response types with validation
//! - [`options`]: Option source catalog and option-list formatting
//! - [`routes`]: HTTP route handlers (health, sources, options)
//!
//! ## Usage
//!
//! ```bash
//! options-server --app-id cli_xxx --app-secret xxx \
//!     --app-token bascnxxx --table-id tblxxx --verification-token xxx
//! ```
//!
//! ## Security Considerations
//!
//! - The tenant access token and app secret are zeroized on drop
//! - The verification token is compared in constant time
//! - Secrets are redacted from every `Debug` rendering
//! - Request validation enforces strict size limits
//! - 30-second request timeout and a 1 MiB body limit

pub mod application;
pub mod bitable;
pub mod configuration;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod filter;
pub mod models;
pub mod options;
pub mod routes;
