// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers for REST API.
//!
//! Broker calls are blocking, so each operation runs on the blocking pool.

use crate::environment::ENVIRONMENT_HEADER;
use crate::error::GatewayError;
use crate::gateway::{Envelope, PeekRequest};
use crate::model::{TopicEntry, TopicStatsEntry, DEFAULT_PAGE_SIZE};
use crate::peek::PeekedMessage;
use crate::AppState;
use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API error response
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self {
            error: format!("request worker failed: {}", err),
            code: 500,
        }
    }
}

/// `page_num` / `page_size` query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page_num")]
    pub page_num: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_num() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn environment(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ENVIRONMENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Unparsable path or query values, answered with an envelope like any other rejection.
fn malformed<T: Serialize>(detail: String) -> Response {
    respond(Envelope::<T>::failed(GatewayError::validation(detail)))
}

fn respond<T: Serialize>(envelope: Envelope<T>) -> Response {
    let status = if envelope.is_rejected() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(envelope)).into_response()
}

/// GET {base}/topics/:tenant/:namespace
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
    Path((tenant, namespace)): Path<(String, String)>,
    page: Result<Query<PageParams>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(page) = match page {
        Ok(page) => page,
        Err(rejection) => return Ok(malformed::<TopicEntry>(rejection.body_text())),
    };
    let env = environment(&headers);
    let envelope = tokio::task::spawn_blocking(move || {
        state.gateway.list_topics(
            env.as_deref(),
            &tenant,
            &namespace,
            page.page_num,
            page.page_size,
        )
    })
    .await?;

    Ok(respond(envelope))
}

/// GET {base}/topics/:tenant/:namespace/stats
pub async fn list_topic_stats(
    State(state): State<Arc<AppState>>,
    Path((tenant, namespace)): Path<(String, String)>,
    page: Result<Query<PageParams>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(page) = match page {
        Ok(page) => page,
        Err(rejection) => return Ok(malformed::<TopicStatsEntry>(rejection.body_text())),
    };
    let env = environment(&headers);
    let envelope = tokio::task::spawn_blocking(move || {
        state.gateway.list_topic_stats(
            env.as_deref(),
            &tenant,
            &namespace,
            page.page_num,
            page.page_size,
        )
    })
    .await?;

    Ok(respond(envelope))
}

/// GET {base}/:persistence/:tenant/:namespace/:topic/subscription/:subscription/:position
pub async fn peek_messages(
    State(state): State<Arc<AppState>>,
    request: Result<Path<PeekRequest>, PathRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Path(request) = match request {
        Ok(request) => request,
        Err(rejection) => return Ok(malformed::<PeekedMessage>(rejection.body_text())),
    };
    let env = environment(&headers);
    let envelope =
        tokio::task::spawn_blocking(move || state.gateway.peek_messages(env.as_deref(), &request))
            .await?;

    Ok(respond(envelope))
}

/// GET /info - Gateway info
pub async fn info(State(state): State<Arc<AppState>>) -> Response {
    let base = &state.base_path;
    let info = serde_json::json!({
        "name": "topic-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            format!("{}/topics/{{tenant}}/{{namespace}}", base),
            format!("{}/topics/{{tenant}}/{{namespace}}/stats", base),
            format!(
                "{}/{{persistent}}/{{tenant}}/{{namespace}}/{{topic}}/subscription/{{subName}}/{{messagePosition}}",
                base
            ),
            "/info"
        ]
    });

    (StatusCode::OK, Json(info)).into_response()
}
