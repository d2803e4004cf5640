// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions for REST API.

use crate::handlers;
use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Topic catalog and peek routes, mounted under `base_path`.
pub fn api_routes(base_path: &str) -> Router<Arc<AppState>> {
    let topics = Router::new()
        .route("/topics/:tenant/:namespace", get(handlers::list_topics))
        .route(
            "/topics/:tenant/:namespace/stats",
            get(handlers::list_topic_stats),
        )
        .route(
            "/:persistence/:tenant/:namespace/:topic/subscription/:subscription/:position",
            get(handlers::peek_messages),
        );

    let router = if base_path.is_empty() {
        topics
    } else {
        Router::new().nest(base_path, topics)
    };

    router.route("/info", get(handlers::info))
}
