// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway facade: the three caller-facing operations.
//!
//! Every operation returns an [`Envelope`]; failures travel in its `error`
//! field instead of aborting the response.

use crate::catalog::TopicCatalog;
use crate::client::HttpSessionFactory;
use crate::config::GatewayConfig;
use crate::environment::EnvironmentResolver;
use crate::error::{ErrorKind, GatewayError};
use crate::model::{validate_segment, PageRequest, PageResult, TopicEntry, TopicRef, TopicStatsEntry};
use crate::peek::{PeekPipeline, PeekedMessage};
use crate::session::SessionFactory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Response body shared by all operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Class of `error`, used by the HTTP layer to pick a status code.
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl<T> Envelope<T> {
    pub fn items(data: Vec<T>) -> Self {
        Self {
            data,
            total: None,
            page_num: None,
            page_size: None,
            notice: None,
            error: None,
            error_kind: None,
        }
    }

    pub fn page(page: PageResult<T>) -> Self {
        Self {
            total: Some(page.total_count),
            page_num: Some(page.page_num),
            page_size: Some(page.page_size),
            ..Self::items(page.items)
        }
    }

    pub fn failed(err: GatewayError) -> Self {
        report(&err);
        Self::items(Vec::new()).with_error(err.kind(), err.to_string())
    }

    fn with_error(mut self, kind: ErrorKind, message: String) -> Self {
        self.error_kind = Some(kind);
        self.error = Some(message);
        self
    }

    pub fn is_rejected(&self) -> bool {
        self.error_kind == Some(ErrorKind::Validation)
    }
}

fn report(err: &GatewayError) {
    match err.kind() {
        ErrorKind::Validation => debug!("Request rejected: {}", err),
        ErrorKind::Decode => error!("Unexpected broker response: {}", err),
        ErrorKind::Connection | ErrorKind::Broker => warn!("Broker request failed: {}", err),
    }
}

/// Path parameters of a peek request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeekRequest {
    pub persistence: String,
    pub tenant: String,
    pub namespace: String,
    pub topic: String,
    pub subscription: String,
    pub position: u32,
}

impl PeekRequest {
    fn target(&self) -> Result<TopicRef, GatewayError> {
        if self.subscription.is_empty() {
            return Err(GatewayError::validation("subscription name must not be empty"));
        }
        if self.position < 1 {
            return Err(GatewayError::validation(
                "message position is incorrect, should be greater than 0.",
            ));
        }
        TopicRef::new(
            self.persistence.parse()?,
            self.tenant.as_str(),
            self.namespace.as_str(),
            self.topic.as_str(),
        )
    }
}

/// The gateway: resolves environments and dispatches to the catalog or the peek pipeline.
pub struct Gateway {
    sessions: Arc<dyn SessionFactory>,
    environments: EnvironmentResolver,
    peek_enabled: bool,
}

impl Gateway {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        environments: EnvironmentResolver,
        peek_enabled: bool,
    ) -> Self {
        Self {
            sessions,
            environments,
            peek_enabled,
        }
    }

    /// Gateway talking to real brokers over HTTP.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(HttpSessionFactory::from_config(config)),
            EnvironmentResolver::from_config(config),
            config.peek.enabled,
        )
    }

    /// `GET /topics/{tenant}/{namespace}`
    pub fn list_topics(
        &self,
        environment: Option<&str>,
        tenant: &str,
        namespace: &str,
        page_num: u32,
        page_size: u32,
    ) -> Envelope<TopicEntry> {
        let run = || {
            let page = PageRequest::new(page_num, page_size)?;
            validate_segment("tenant", tenant)?;
            validate_segment("namespace", namespace)?;
            let env = self.environments.resolve(environment)?;
            TopicCatalog::new(&*self.sessions).list_topics(
                &env.service_url,
                tenant,
                namespace,
                page,
            )
        };
        match run() {
            Ok(page) => Envelope::page(page),
            Err(e) => Envelope::failed(e),
        }
    }

    /// `GET /topics/{tenant}/{namespace}/stats`
    pub fn list_topic_stats(
        &self,
        environment: Option<&str>,
        tenant: &str,
        namespace: &str,
        page_num: u32,
        page_size: u32,
    ) -> Envelope<TopicStatsEntry> {
        let run = || {
            let page = PageRequest::new(page_num, page_size)?;
            validate_segment("tenant", tenant)?;
            validate_segment("namespace", namespace)?;
            let env = self.environments.resolve(environment)?;
            TopicCatalog::new(&*self.sessions).list_topic_stats(
                &env.service_url,
                tenant,
                namespace,
                page,
                &env.name,
            )
        };
        let page = match run() {
            Ok(page) => page,
            Err(e) => return Envelope::failed(e),
        };

        let failed = page.items.iter().filter(|item| item.error.is_some()).count();
        let shown = page.items.len();
        let envelope = Envelope::page(page);
        if failed > 0 {
            warn!("Stats unavailable for {} of {} topics", failed, shown);
            return envelope.with_error(
                ErrorKind::Broker,
                format!("stats unavailable for {} of {} topics", failed, shown),
            );
        }
        envelope
    }

    /// `GET /{persistent}/{tenant}/{namespace}/{topic}/subscription/{sub}/{position}`
    pub fn peek_messages(
        &self,
        environment: Option<&str>,
        request: &PeekRequest,
    ) -> Envelope<PeekedMessage> {
        let prepared = request.target().and_then(|topic| {
            let env = self.environments.resolve(environment)?;
            Ok((topic, env))
        });
        let (topic, env) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return Envelope::failed(e),
        };

        let result = PeekPipeline::new(&*self.sessions, self.peek_enabled).peek(
            &env.service_url,
            &topic,
            &request.subscription,
            request.position,
        );

        let error_kind = result.errors.first().map(GatewayError::kind);
        let error = result.error_text();
        Envelope {
            notice: result.notice,
            error,
            error_kind,
            ..Envelope::items(result.messages)
        }
    }
}
