// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Integration tests for the REST API.
//!
//! Builds the real router over an in-memory broker and sends requests via
//! `tower::ServiceExt`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use topic_gateway::batch::RawEntry;
use topic_gateway::environment::EnvironmentResolver;
use topic_gateway::{
    build_router, AdminSession, AppState, Gateway, GatewayError, Persistence, SessionFactory,
    TopicRef, TopicStats,
};

const BASE: &str = "/pulsar-manager/admin/v2";

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    calls: AtomicUsize,
}

/// Broker with 12 persistent topics and a 2-entry backlog on every subscription.
struct FakeBroker {
    counters: Arc<Counters>,
}

struct FakeSession {
    url: String,
    counters: Arc<Counters>,
}

impl SessionFactory for FakeBroker {
    fn open(&self, service_url: &str) -> Result<Box<dyn AdminSession>, GatewayError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            url: service_url.to_string(),
            counters: self.counters.clone(),
        }))
    }
}

impl AdminSession for FakeSession {
    fn service_url(&self) -> &str {
        &self.url
    }

    fn list_topics(
        &self,
        persistence: Persistence,
        tenant: &str,
        namespace: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if persistence == Persistence::NonPersistent {
            return Ok(Vec::new());
        }
        Ok((0..12)
            .map(|i| format!("persistent://{}/{}/topic-{:02}", tenant, namespace, i))
            .collect())
    }

    fn list_partitioned_topics(
        &self,
        _persistence: Persistence,
        _tenant: &str,
        _namespace: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    fn topic_stats(
        &self,
        topic: &TopicRef,
        _partitioned: bool,
    ) -> Result<TopicStats, GatewayError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if topic.name() == "topic-01" {
            return Err(GatewayError::broker("Topic not found"));
        }
        Ok(TopicStats {
            msg_rate_in: 1.5,
            subscription_count: 2,
            ..Default::default()
        })
    }

    fn peek_entry(
        &self,
        _topic: &TopicRef,
        subscription: &str,
        position: u32,
    ) -> Result<Option<RawEntry>, GatewayError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if subscription == "missing" {
            return Err(GatewayError::broker("Subscription not found"));
        }
        if position > 2 {
            return Ok(None);
        }
        Ok(Some(RawEntry {
            message_id: format!("42:{}", position),
            properties: BTreeMap::from([("origin".to_string(), "test".to_string())]),
            payload: format!("payload-{}", position).into_bytes(),
            ..Default::default()
        }))
    }

    fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_app(peek_enabled: bool) -> (axum::Router, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let broker = FakeBroker {
        counters: counters.clone(),
    };
    let mut envs = EnvironmentResolver::new(Some("standalone".into()));
    envs.insert("standalone", "http://127.0.0.1:8080");
    let gateway = Gateway::new(Arc::new(broker), envs, peek_enabled);
    let app = build_router(Arc::new(AppState::new(gateway, BASE)));
    (app, counters)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------
// Topic listing
// ---------------------------------------------------------------

#[tokio::test]
async fn test_list_topics_default_page() {
    let (app, counters) = test_app(false);
    let (status, json) = get(app, &format!("{}/topics/public/default", BASE)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 12);
    assert_eq!(json["pageNum"], 1);
    assert_eq!(json["pageSize"], 10);
    assert_eq!(json["data"].as_array().unwrap().len(), 10);
    assert_eq!(json["data"][0]["topic"], "topic-00");
    assert_eq!(json["data"][0]["persistent"], "persistent");
    assert!(json.get("error").is_none());
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_topics_second_page() {
    let (app, _) = test_app(false);
    let (_, json) = get(
        app,
        &format!("{}/topics/public/default?page_num=2&page_size=10", BASE),
    )
    .await;

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["topic"], "topic-10");
    assert_eq!(data[1]["topic"], "topic-11");
}

#[tokio::test]
async fn test_list_topics_past_last_page() {
    let (app, _) = test_app(false);
    let (status, json) = get(
        app,
        &format!("{}/topics/public/default?page_num=7&page_size=5", BASE),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].as_array().unwrap().is_empty());
    assert_eq!(json["total"], 12);
}

#[tokio::test]
async fn test_invalid_page_size_is_rejected_without_broker_call() {
    for size in ["0", "1001"] {
        let (app, counters) = test_app(false);
        let (status, json) = get(
            app,
            &format!("{}/topics/public/default?page_size={}", BASE, size),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("page_size"));
        assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
        assert_eq!(counters.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_unparsable_query_gets_envelope() {
    for query in ["page_size=-1", "page_num=abc"] {
        for path in ["topics/public/default", "topics/public/default/stats"] {
            let (app, counters) = test_app(false);
            let (status, json) = get(app, &format!("{}/{}?{}", BASE, path, query)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", path, query);
            assert!(json["data"].as_array().unwrap().is_empty());
            assert!(!json["error"].as_str().unwrap().is_empty());
            assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
        }
    }
}

#[tokio::test]
async fn test_unknown_environment_is_rejected() {
    let (app, counters) = test_app(false);
    let resp = app
        .oneshot(
            Request::builder()
                .uri(format!("{}/topics/public/default", BASE))
                .header("environment", "nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------
// Topic stats
// ---------------------------------------------------------------

#[tokio::test]
async fn test_topic_stats_with_partial_failure() {
    let (app, counters) = test_app(false);
    let resp = app
        .oneshot(
            Request::builder()
                .uri(format!("{}/topics/public/default/stats?page_size=3", BASE))
                .header("environment", "standalone")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["environment"], "standalone");
    assert_eq!(data[0]["stats"]["msgRateIn"], 1.5);
    assert_eq!(data[0]["stats"]["subscriptionCount"], 2);
    assert_eq!(data[1]["error"], "Topic not found");
    assert!(data[1].get("stats").is_none());
    assert_eq!(json["error"], "stats unavailable for 1 of 3 topics");
    assert_eq!(json["total"], 12);

    // 4 listing calls + 3 stats calls, one session
    assert_eq!(counters.calls.load(Ordering::SeqCst), 7);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------
// Peek
// ---------------------------------------------------------------

#[tokio::test]
async fn test_peek_disabled() {
    let (app, counters) = test_app(false);
    let (status, json) = get(
        app,
        &format!("{}/persistent/public/default/topic-00/subscription/sub/3", BASE),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].as_array().unwrap().is_empty());
    assert!(!json["notice"].as_str().unwrap().is_empty());
    assert!(json.get("error").is_none());
    assert_eq!(counters.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_peek_returns_available_messages() {
    let (app, counters) = test_app(true);
    let (status, json) = get(
        app,
        &format!("{}/persistent/public/default/topic-00/subscription/sub/3", BASE),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["ledgerId"], 42);
    assert_eq!(data[0]["entryId"], 1);
    assert_eq!(data[0]["batch"], false);
    assert!(data[0].get("batchIndex").is_none());
    assert_eq!(data[0]["properties"]["origin"], "test");
    assert_eq!(data[1]["data"], "cGF5bG9hZC0y");
    assert!(json.get("error").is_none());
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_peek_broker_error_is_in_band() {
    let (app, counters) = test_app(true);
    let (status, json) = get(
        app,
        &format!("{}/persistent/public/default/topic-00/subscription/missing/2", BASE),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], "Subscription not found");
    assert!(json["data"].as_array().unwrap().is_empty());
    assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_peek_rejects_zero_position() {
    let (app, counters) = test_app(true);
    let (status, _) = get(
        app,
        &format!("{}/persistent/public/default/topic-00/subscription/sub/0", BASE),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_peek_unparsable_position_gets_envelope() {
    let (app, counters) = test_app(true);
    let (status, json) = get(
        app,
        &format!("{}/persistent/public/default/topic-00/subscription/sub/-2", BASE),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["data"].as_array().unwrap().is_empty());
    assert!(json["error"].as_str().unwrap().contains("position"));
    assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_info() {
    let (app, _) = test_app(false);
    let (status, json) = get(app, "/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "topic-gateway");
    assert_eq!(json["endpoints"].as_array().unwrap().len(), 4);
}
