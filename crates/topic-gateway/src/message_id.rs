// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message identifier normalization.
//!
//! The broker hands out two identifier shapes: a plain `ledger:entry`
//! position, and a batched position that also carries the index of the
//! message inside its storage entry. Both normalize into one
//! [`MessageIdentifier`].

use crate::error::GatewayError;
use serde::Serialize;

/// Identifier as reported by the broker, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMessageId {
    Simple {
        ledger_id: i64,
        entry_id: i64,
    },
    Batched {
        ledger_id: i64,
        entry_id: i64,
        batch_index: i32,
    },
    /// Anything the broker sent that fits neither shape.
    Unrecognized(String),
}

impl RawMessageId {
    /// Parse an `X-Pulsar-Message-ID` header value.
    ///
    /// Accepts `ledger:entry`, `ledger:entry:partition` and
    /// `ledger:entry:partition:batchIndex`. A negative batch index means
    /// the message is not part of a batch.
    pub fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        let parsed = match parts.as_slice() {
            [ledger, entry] | [ledger, entry, _] => {
                match (ledger.parse::<i64>(), entry.parse::<i64>()) {
                    (Ok(ledger_id), Ok(entry_id)) => Some(Self::Simple {
                        ledger_id,
                        entry_id,
                    }),
                    _ => None,
                }
            }
            [ledger, entry, _, batch] => {
                match (ledger.parse::<i64>(), entry.parse::<i64>(), batch.parse::<i32>()) {
                    (Ok(ledger_id), Ok(entry_id), Ok(batch_index)) if batch_index >= 0 => {
                        Some(Self::Batched {
                            ledger_id,
                            entry_id,
                            batch_index,
                        })
                    }
                    (Ok(ledger_id), Ok(entry_id), Ok(_)) => Some(Self::Simple {
                        ledger_id,
                        entry_id,
                    }),
                    _ => None,
                }
            }
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
    }

    /// Ledger and entry of a recognized identifier.
    pub fn position(&self) -> Option<(i64, i64)> {
        match *self {
            Self::Simple {
                ledger_id,
                entry_id,
            }
            | Self::Batched {
                ledger_id,
                entry_id,
                ..
            } => Some((ledger_id, entry_id)),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Client-facing message identifier.
///
/// Only constructible through [`normalize`] (or the two constructors), so a
/// batched identifier always carries its batch index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIdentifier {
    ledger_id: i64,
    entry_id: i64,
    #[serde(rename = "batch")]
    is_batch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_index: Option<i32>,
}

impl MessageIdentifier {
    pub fn simple(ledger_id: i64, entry_id: i64) -> Self {
        Self {
            ledger_id,
            entry_id,
            is_batch: false,
            batch_index: None,
        }
    }

    pub fn batched(ledger_id: i64, entry_id: i64, batch_index: i32) -> Self {
        Self {
            ledger_id,
            entry_id,
            is_batch: true,
            batch_index: Some(batch_index),
        }
    }

    pub fn ledger_id(&self) -> i64 {
        self.ledger_id
    }

    pub fn entry_id(&self) -> i64 {
        self.entry_id
    }

    pub fn is_batch(&self) -> bool {
        self.is_batch
    }

    pub fn batch_index(&self) -> Option<i32> {
        self.batch_index
    }
}

/// Classify a broker identifier into its normalized form.
pub fn normalize(raw: &RawMessageId) -> Result<MessageIdentifier, GatewayError> {
    match raw {
        RawMessageId::Batched {
            ledger_id,
            entry_id,
            batch_index,
        } => Ok(MessageIdentifier::batched(*ledger_id, *entry_id, *batch_index)),
        RawMessageId::Simple {
            ledger_id,
            entry_id,
        } => Ok(MessageIdentifier::simple(*ledger_id, *entry_id)),
        RawMessageId::Unrecognized(raw) => Err(GatewayError::decode(format!(
            "unknown message identifier shape '{}'",
            raw
        ))),
    }
}
