// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription peek pipeline.
//!
//! Reads backlog entries one position at a time without moving the
//! subscription cursor, unpacks batches and normalizes every message id.
//! Failures are fail-soft: whatever was collected before a broker error is
//! still returned, and a message that fails to decode does not drop its
//! siblings.

use crate::batch::{self, RawMessage};
use crate::error::GatewayError;
use crate::message_id::{self, MessageIdentifier};
use crate::model::TopicRef;
use crate::session::{ScopedSession, SessionFactory};
use base64::Engine;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Shown when peeking is switched off in the configuration.
pub const PEEK_DISABLED_NOTICE: &str =
    "Message peek is disabled; set [peek] enabled = true in the gateway configuration to turn it on";

/// One backlog message in client-facing form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeekedMessage {
    #[serde(flatten)]
    pub id: MessageIdentifier,
    pub properties: BTreeMap<String, String>,
    #[serde(rename = "data", serialize_with = "serialize_base64")]
    pub payload: Vec<u8>,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

impl PeekedMessage {
    fn from_raw(raw: RawMessage) -> Result<Self, GatewayError> {
        Ok(Self {
            id: message_id::normalize(&raw.id)?,
            properties: raw.properties,
            payload: raw.payload,
        })
    }
}

/// Outcome of one peek call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeekResult {
    pub messages: Vec<PeekedMessage>,
    /// Set when the call was skipped on purpose.
    pub notice: Option<String>,
    /// Errors hit while collecting `messages`, in order.
    pub errors: Vec<GatewayError>,
}

impl PeekResult {
    fn disabled() -> Self {
        Self {
            notice: Some(PEEK_DISABLED_NOTICE.to_string()),
            ..Default::default()
        }
    }

    /// All error messages joined into one line.
    pub fn error_text(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Peeks subscription backlogs through short-lived admin sessions.
pub struct PeekPipeline<'a> {
    sessions: &'a dyn SessionFactory,
    enabled: bool,
}

impl<'a> PeekPipeline<'a> {
    pub fn new(sessions: &'a dyn SessionFactory, enabled: bool) -> Self {
        Self { sessions, enabled }
    }

    /// Read up to `position` backlog messages of `subscription`, oldest first.
    ///
    /// Entries are fetched one position at a time until `position` messages
    /// are collected; the last batch is cut to fit. A backlog shorter than
    /// `position` yields fewer messages and no error.
    pub fn peek(
        &self,
        service_url: &str,
        topic: &TopicRef,
        subscription: &str,
        position: u32,
    ) -> PeekResult {
        if !self.enabled {
            debug!("Peek on {} skipped, feature disabled", topic);
            return PeekResult::disabled();
        }

        let mut result = PeekResult::default();
        let session = match ScopedSession::open(self.sessions, service_url) {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot open admin session for {}: {}", service_url, e);
                result.errors.push(e);
                return result;
            }
        };

        // `position` caps messages, not entries: a batch counts once per message.
        let mut taken: u32 = 0;
        let mut n: u32 = 1;
        while taken < position {
            let entry = match session.peek_entry(topic, subscription, n) {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Peek of {}/{} failed at position {}: {}", topic, subscription, n, e);
                    result.errors.push(e);
                    break;
                }
            };

            let raw_messages = match batch::unpack(entry) {
                Ok(messages) => messages,
                Err(e) => {
                    error!("Skipping entry at position {} of {}: {}", n, topic, e);
                    result.errors.push(e);
                    taken += 1;
                    n += 1;
                    continue;
                }
            };

            let quota = (position - taken) as usize;
            if raw_messages.len() > quota {
                debug!(
                    "Entry at position {} of {} holds {} messages, keeping {}",
                    n,
                    topic,
                    raw_messages.len(),
                    quota
                );
            }
            for raw in raw_messages.into_iter().take(quota) {
                taken += 1;
                match PeekedMessage::from_raw(raw) {
                    Ok(message) => result.messages.push(message),
                    Err(e) => {
                        error!("Skipping message at position {} of {}: {}", n, topic, e);
                        result.errors.push(e);
                    }
                }
            }
            n += 1;
        }

        debug!(
            "Peeked {} messages from {}/{}",
            result.messages.len(),
            topic,
            subscription
        );
        result
    }
}
