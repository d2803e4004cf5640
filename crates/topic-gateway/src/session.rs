// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-request administrative sessions.
//!
//! Every operation opens exactly one session through a [`SessionFactory`]
//! and holds it in a [`ScopedSession`], which closes it when dropped. The
//! session never outlives the operation and is never shared.

use crate::batch::RawEntry;
use crate::error::GatewayError;
use crate::model::{Persistence, TopicRef, TopicStats};
use std::ops::Deref;
use tracing::debug;

/// Operations the gateway needs from the broker's admin API.
pub trait AdminSession: Send {
    /// Service URL this session talks to.
    fn service_url(&self) -> &str;

    /// Full names of all topics (partitions included) in a namespace.
    fn list_topics(
        &self,
        persistence: Persistence,
        tenant: &str,
        namespace: &str,
    ) -> Result<Vec<String>, GatewayError>;

    /// Full names of the partitioned topics in a namespace.
    fn list_partitioned_topics(
        &self,
        persistence: Persistence,
        tenant: &str,
        namespace: &str,
    ) -> Result<Vec<String>, GatewayError>;

    /// Stats of one topic, aggregated over partitions when `partitioned`.
    fn topic_stats(&self, topic: &TopicRef, partitioned: bool)
        -> Result<TopicStats, GatewayError>;

    /// Entry at 1-based `position` of the subscription backlog, `None` past the end.
    fn peek_entry(
        &self,
        topic: &TopicRef,
        subscription: &str,
        position: u32,
    ) -> Result<Option<RawEntry>, GatewayError>;

    /// Release the session's resources.
    fn close(&mut self);
}

/// Builds sessions bound to one broker service URL.
pub trait SessionFactory: Send + Sync {
    fn open(&self, service_url: &str) -> Result<Box<dyn AdminSession>, GatewayError>;
}

/// An open session that is closed exactly once, when this guard drops.
pub struct ScopedSession {
    session: Box<dyn AdminSession>,
}

impl ScopedSession {
    pub fn open(factory: &dyn SessionFactory, service_url: &str) -> Result<Self, GatewayError> {
        let session = factory.open(service_url)?;
        debug!("Admin session opened for {}", service_url);
        Ok(Self { session })
    }
}

impl Deref for ScopedSession {
    type Target = dyn AdminSession;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        debug!("Closing admin session for {}", self.session.service_url());
        self.session.close();
    }
}
