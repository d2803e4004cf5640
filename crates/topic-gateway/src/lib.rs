// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic Gateway - read-only REST gateway over a broker's admin API
//!
//! Lists the topics of a tenant/namespace page by page, joins them with
//! broker stats, and peeks subscription backlogs without moving cursors.
//! Every request opens its own short-lived admin session (optional TLS and
//! bearer token) and closes it before returning.
//!
//! # Endpoints
//!
//! Mounted under `server.base_path` (default `/pulsar-manager/admin/v2`):
//!
//! - `GET /topics/{tenant}/{namespace}?page_num=&page_size=` - Topic listing
//! - `GET /topics/{tenant}/{namespace}/stats?page_num=&page_size=` - Listing joined with stats
//! - `GET /{persistent}/{tenant}/{namespace}/{topic}/subscription/{sub}/{position}` - Peek
//!
//! The `environment` request header picks the target broker.
//!
//! # Configuration File
//!
//! ```toml
//! default_environment = "standalone"
//!
//! [peek]
//! enabled = true
//!
//! [[environments]]
//! name = "standalone"
//! service_url = "http://127.0.0.1:8080"
//! ```

pub mod batch;
pub mod catalog;
pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod message_id;
pub mod model;
pub mod peek;
pub mod routes;
pub mod session;

pub use config::{ConfigError, GatewayConfig};
pub use error::{ErrorKind, GatewayError};
pub use gateway::{Envelope, Gateway, PeekRequest};
pub use message_id::{MessageIdentifier, RawMessageId};
pub use model::{PageRequest, PageResult, Persistence, TopicEntry, TopicRef, TopicStats};
pub use peek::PeekedMessage;
pub use session::{AdminSession, ScopedSession, SessionFactory};

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub gateway: Gateway,
    pub base_path: String,
}

impl AppState {
    pub fn new(gateway: Gateway, base_path: impl Into<String>) -> Self {
        Self {
            gateway,
            base_path: base_path.into(),
        }
    }
}

/// Build the HTTP router with CORS and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::api_routes(&state.base_path)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
