// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker admin API client (REST over HTTP).

use crate::batch::RawEntry;
use crate::config::{BrokerConfig, GatewayConfig, TlsConfig};
use crate::error::GatewayError;
use crate::model::{Persistence, TopicRef, TopicStats};
use crate::session::{AdminSession, SessionFactory};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

const MESSAGE_ID_HEADER: &str = "x-pulsar-message-id";
const BATCH_SIZE_HEADER: &str = "x-pulsar-num-batch-message";
const COMPRESSION_HEADER: &str = "x-pulsar-compression";
const PROPERTY_HEADER_PREFIX: &str = "x-pulsar-property-";

/// Opens [`HttpAdminSession`]s with a fixed TLS/auth snapshot.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    tls: TlsConfig,
    token: Option<String>,
    broker: BrokerConfig,
}

impl HttpSessionFactory {
    pub fn new(tls: TlsConfig, token: Option<String>, broker: BrokerConfig) -> Self {
        Self { tls, token, broker }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.tls.clone(),
            config.auth.token().map(str::to_string),
            config.broker.clone(),
        )
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open(&self, service_url: &str) -> Result<Box<dyn AdminSession>, GatewayError> {
        let session = open_session(service_url, &self.tls, self.token.as_deref(), &self.broker)?;
        Ok(Box::new(session))
    }
}

/// Build a session for `service_url`.
///
/// The trust store and hostname verification flag only apply when TLS is
/// enabled; the bearer token only when it is non-empty.
pub fn open_session(
    service_url: &str,
    tls: &TlsConfig,
    token: Option<&str>,
    broker: &BrokerConfig,
) -> Result<HttpAdminSession, GatewayError> {
    let base = Url::parse(service_url).map_err(|e| {
        GatewayError::connection(format!("invalid service URL '{}': {}", service_url, e))
    })?;
    if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
        return Err(GatewayError::connection(format!(
            "service URL '{}' is not an http(s) URL",
            service_url
        )));
    }

    let mut builder = Client::builder()
        .connect_timeout(broker.connect_timeout())
        .timeout(broker.request_timeout());

    if tls.enabled {
        if let Some(path) = &tls.trust_certs_path {
            let pem = std::fs::read(path).map_err(|e| {
                GatewayError::connection(format!(
                    "cannot read trust certs {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                GatewayError::connection(format!(
                    "invalid trust certs {}: {}",
                    path.display(),
                    e
                ))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }
        builder = builder.danger_accept_invalid_hostnames(!tls.hostname_verification);
    }

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| GatewayError::connection(format!("invalid auth token: {}", e)))?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    let client = builder
        .build()
        .map_err(|e| GatewayError::connection(format!("cannot build admin client: {}", e)))?;

    Ok(HttpAdminSession {
        service_url: service_url.to_string(),
        base,
        client,
        closed: false,
    })
}

/// Session against one broker's `/admin/v2` REST API.
pub struct HttpAdminSession {
    service_url: String,
    base: Url,
    client: Client,
    closed: bool,
}

impl HttpAdminSession {
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::connection(format!("service URL {} cannot be a base", self.base))
            })?
            .pop_if_empty()
            .extend(["admin", "v2"])
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<Response, GatewayError> {
        if self.closed {
            return Err(GatewayError::connection("admin session already closed"));
        }
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);
        Ok(self.client.get(url).send()?)
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let response = check_status(self.get(segments)?)?;
        Ok(response.json()?)
    }
}

impl AdminSession for HttpAdminSession {
    fn service_url(&self) -> &str {
        &self.service_url
    }

    fn list_topics(
        &self,
        persistence: Persistence,
        tenant: &str,
        namespace: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.get_json(&[persistence.as_str(), tenant, namespace])
    }

    fn list_partitioned_topics(
        &self,
        persistence: Persistence,
        tenant: &str,
        namespace: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.get_json(&[persistence.as_str(), tenant, namespace, "partitioned"])
    }

    fn topic_stats(
        &self,
        topic: &TopicRef,
        partitioned: bool,
    ) -> Result<TopicStats, GatewayError> {
        let leaf = if partitioned {
            "partitioned-stats"
        } else {
            "stats"
        };
        let stats: BrokerTopicStats = self.get_json(&[
            topic.persistence().as_str(),
            topic.tenant(),
            topic.namespace(),
            topic.name(),
            leaf,
        ])?;
        Ok(stats.into())
    }

    fn peek_entry(
        &self,
        topic: &TopicRef,
        subscription: &str,
        position: u32,
    ) -> Result<Option<RawEntry>, GatewayError> {
        let position = position.to_string();
        let response = self.get(&[
            topic.persistence().as_str(),
            topic.tenant(),
            topic.namespace(),
            topic.name(),
            "subscription",
            subscription,
            "position",
            &position,
        ])?;

        if response.status() == StatusCode::NOT_FOUND {
            let reason = error_reason(response);
            if is_end_of_backlog(&reason) {
                debug!("Backlog of {}/{} ends before position {}", topic, subscription, position);
                return Ok(None);
            }
            return Err(GatewayError::broker(reason));
        }

        let response = check_status(response)?;
        let headers = response.headers().clone();
        let payload = response.bytes()?.to_vec();
        Ok(Some(entry_from_response(&headers, payload)))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Error body returned by the admin API.
#[derive(Debug, Deserialize)]
struct BrokerErrorBody {
    reason: String,
}

fn error_reason(response: Response) -> String {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    match serde_json::from_str::<BrokerErrorBody>(&body) {
        Ok(parsed) => parsed.reason,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("broker request failed")
            .to_string(),
    }
}

fn check_status(response: Response) -> Result<Response, GatewayError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let reason = error_reason(response);
    warn!("Broker answered {}: {}", status, reason);
    Err(GatewayError::broker(reason))
}

/// Reason the broker gives for a peek past the end of the backlog.
const END_OF_BACKLOG_REASON: &str = "message not found";

/// Only the broker's own "Message not found" 404 ends a peek; any other 404 is an error.
fn is_end_of_backlog(reason: &str) -> bool {
    reason.to_ascii_lowercase().contains(END_OF_BACKLOG_REASON)
}

/// Property keys come back lowercased: HTTP header names are case-insensitive
/// and the client normalizes them.
fn entry_from_response(headers: &HeaderMap, payload: Vec<u8>) -> RawEntry {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let properties: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(PROPERTY_HEADER_PREFIX)?;
            Some((key.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect();

    RawEntry {
        message_id: text(MESSAGE_ID_HEADER).unwrap_or_default(),
        batch_size: text(BATCH_SIZE_HEADER).and_then(|v| v.parse().ok()),
        compression: text(COMPRESSION_HEADER),
        properties,
        payload,
    }
}

/// Subset of the broker's topic stats document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BrokerTopicStats {
    msg_rate_in: f64,
    msg_rate_out: f64,
    msg_throughput_in: f64,
    msg_throughput_out: f64,
    average_msg_size: f64,
    storage_size: i64,
    backlog_size: i64,
    publishers: Vec<serde_json::Value>,
    subscriptions: HashMap<String, serde_json::Value>,
}

impl From<BrokerTopicStats> for TopicStats {
    fn from(s: BrokerTopicStats) -> Self {
        Self {
            msg_rate_in: s.msg_rate_in,
            msg_rate_out: s.msg_rate_out,
            msg_throughput_in: s.msg_throughput_in,
            msg_throughput_out: s.msg_throughput_out,
            average_msg_size: s.average_msg_size,
            storage_size: s.storage_size,
            backlog_size: s.backlog_size,
            producer_count: s.publishers.len(),
            subscription_count: s.subscriptions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    fn open(url: &str) -> Result<HttpAdminSession, GatewayError> {
        open_session(url, &TlsConfig::default(), None, &BrokerConfig::default())
    }

    #[test]
    fn test_open_rejects_bad_service_url() {
        assert!(matches!(open("not a url"), Err(GatewayError::Connection(_))));
        assert!(matches!(
            open("mailto:admin@example.com"),
            Err(GatewayError::Connection(_))
        ));
        assert!(matches!(open("ftp://broker:21"), Err(GatewayError::Connection(_))));
    }

    #[test]
    fn test_open_rejects_missing_trust_certs() {
        let tls = TlsConfig {
            enabled: true,
            trust_certs_path: Some("/nonexistent/ca.pem".into()),
            hostname_verification: true,
        };
        let err = open_session("https://broker:8443", &tls, None, &BrokerConfig::default())
            .err()
            .expect("should fail");
        assert!(matches!(err, GatewayError::Connection(_)));
    }

    #[test]
    fn test_trust_certs_ignored_when_tls_disabled() {
        let tls = TlsConfig {
            enabled: false,
            trust_certs_path: Some("/nonexistent/ca.pem".into()),
            hostname_verification: true,
        };
        assert!(open_session("http://broker:8080", &tls, None, &BrokerConfig::default()).is_ok());
    }

    #[test]
    fn test_open_rejects_unprintable_token() {
        let result = open_session(
            "http://broker:8080",
            &TlsConfig::default(),
            Some("bad\ntoken"),
            &BrokerConfig::default(),
        );
        assert!(matches!(result, Err(GatewayError::Connection(_))));

        let empty = open_session(
            "http://broker:8080",
            &TlsConfig::default(),
            Some(""),
            &BrokerConfig::default(),
        );
        assert!(empty.is_ok());
    }

    #[test]
    fn test_endpoint_paths() {
        let session = open("http://broker:8080").unwrap();
        assert_eq!(
            session.endpoint(&["persistent", "public", "default"]).unwrap().as_str(),
            "http://broker:8080/admin/v2/persistent/public/default"
        );

        let session = open("https://proxy.example.com/pulsar/").unwrap();
        assert_eq!(
            session
                .endpoint(&["persistent", "t", "ns", "my topic", "stats"])
                .unwrap()
                .as_str(),
            "https://proxy.example.com/pulsar/admin/v2/persistent/t/ns/my%20topic/stats"
        );
    }

    #[test]
    fn test_closed_session_refuses_requests() {
        let mut session = open("http://broker:8080").unwrap();
        session.close();
        let err = session
            .list_topics(Persistence::Persistent, "public", "default")
            .unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));
    }

    #[test]
    fn test_end_of_backlog_classification() {
        assert!(is_end_of_backlog("Message not found"));
        assert!(is_end_of_backlog("message not found"));
        assert!(!is_end_of_backlog("Not Found"));
        assert!(!is_end_of_backlog("<html><body>404 Not Found</body></html>"));
        assert!(!is_end_of_backlog("Topic not found"));
        assert!(!is_end_of_backlog("Subscription not found"));
    }

    #[test]
    fn test_entry_from_response_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-pulsar-message-id", HeaderValue::from_static("12:7"));
        headers.insert("x-pulsar-num-batch-message", HeaderValue::from_static("3"));
        headers.insert("x-pulsar-property-origin", HeaderValue::from_static("sensor"));
        headers.insert("x-pulsar-publish-time", HeaderValue::from_static("2026-01-01"));

        let entry = entry_from_response(&headers, b"raw".to_vec());
        assert_eq!(entry.message_id, "12:7");
        assert_eq!(entry.batch_size, Some(3));
        assert_eq!(entry.compression, None);
        assert_eq!(entry.properties.len(), 1);
        assert_eq!(entry.properties["origin"], "sensor");
        assert_eq!(entry.payload, b"raw");
    }

    #[test]
    fn test_property_keys_arrive_lowercased() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-Pulsar-PROPERTY-TraceId").unwrap(),
            HeaderValue::from_static("abc"),
        );

        let entry = entry_from_response(&headers, Vec::new());
        assert_eq!(entry.properties.get("traceid").map(String::as_str), Some("abc"));
        assert!(!entry.properties.contains_key("TraceId"));
    }

    #[test]
    fn test_stats_document_conversion() {
        let doc = r#"{
            "msgRateIn": 12.5,
            "msgRateOut": 10.0,
            "msgThroughputIn": 1024.0,
            "msgThroughputOut": 800.0,
            "averageMsgSize": 81.9,
            "storageSize": 4096,
            "backlogSize": 128,
            "publishers": [{"producerName": "p1"}, {"producerName": "p2"}],
            "subscriptions": {"sub-a": {}, "sub-b": {}, "sub-c": {}},
            "replication": {}
        }"#;
        let stats: TopicStats = serde_json::from_str::<BrokerTopicStats>(doc).unwrap().into();
        assert_eq!(stats.msg_rate_in, 12.5);
        assert_eq!(stats.storage_size, 4096);
        assert_eq!(stats.backlog_size, 128);
        assert_eq!(stats.producer_count, 2);
        assert_eq!(stats.subscription_count, 3);

        let empty: TopicStats = serde_json::from_str::<BrokerTopicStats>("{}").unwrap().into();
        assert_eq!(empty, TopicStats::default());
    }

    #[test]
    #[ignore = "Requires a running broker"]
    fn test_list_topics_live() {
        let session = open("http://127.0.0.1:8080").unwrap();
        let topics = session
            .list_topics(Persistence::Persistent, "public", "default")
            .unwrap();
        assert!(topics.iter().all(|t| t.starts_with("persistent://")));
    }
}
