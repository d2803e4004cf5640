// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peeked entry unpacking.
//!
//! A storage entry either holds one message or a batch of messages. A
//! batch payload is a sequence of
//! `[metadata_len: u32 BE][SingleMessageMetadata][payload]` records.

use crate::error::GatewayError;
use crate::message_id::RawMessageId;
use std::collections::BTreeMap;

/// One storage entry as returned by a peek at a backlog position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    /// `X-Pulsar-Message-ID` value.
    pub message_id: String,
    /// Number of messages packed in the entry, `None` when not batched.
    pub batch_size: Option<u32>,
    /// Compression codec name, `None` or `NONE` for plain payloads.
    pub compression: Option<String>,
    /// Entry-level message properties.
    pub properties: BTreeMap<String, String>,
    pub payload: Vec<u8>,
}

/// One logical message with its identifier still in broker form.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: RawMessageId,
    pub properties: BTreeMap<String, String>,
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct KeyValue {
    #[prost(string, tag = "1")]
    key: String,
    #[prost(string, tag = "2")]
    value: String,
}

/// Per-message header inside a batch. Only the fields we read are declared.
#[derive(Clone, PartialEq, prost::Message)]
struct SingleMessageMetadata {
    #[prost(message, repeated, tag = "1")]
    properties: Vec<KeyValue>,
    #[prost(int32, optional, tag = "3")]
    payload_size: Option<i32>,
}

/// Split an entry into the messages it carries.
pub fn unpack(entry: RawEntry) -> Result<Vec<RawMessage>, GatewayError> {
    if let Some(codec) = entry.compression.as_deref() {
        if !codec.eq_ignore_ascii_case("NONE") {
            return Err(GatewayError::decode(format!(
                "entry {} uses unsupported compression codec {}",
                entry.message_id, codec
            )));
        }
    }

    let id = RawMessageId::parse(&entry.message_id);
    let (Some(count), Some((ledger_id, entry_id))) = (entry.batch_size, id.position()) else {
        return Ok(vec![RawMessage {
            id,
            properties: entry.properties,
            payload: entry.payload,
        }]);
    };

    let truncated = |index: u32| {
        GatewayError::decode(format!(
            "batch entry {}:{} truncated at message {} of {}",
            ledger_id, entry_id, index, count
        ))
    };

    let mut messages = Vec::new();
    let mut rest = entry.payload.as_slice();
    for index in 0..count {
        if rest.len() < 4 {
            return Err(truncated(index));
        }
        let meta_len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        rest = &rest[4..];
        if rest.len() < meta_len {
            return Err(truncated(index));
        }
        let meta = <SingleMessageMetadata as prost::Message>::decode(&rest[..meta_len])
            .map_err(|e| {
                GatewayError::decode(format!(
                    "batch entry {}:{} message {}: {}",
                    ledger_id, entry_id, index, e
                ))
            })?;
        rest = &rest[meta_len..];

        let payload_size = usize::try_from(meta.payload_size.unwrap_or(0)).unwrap_or(0);
        if rest.len() < payload_size {
            return Err(truncated(index));
        }
        let (payload, tail) = rest.split_at(payload_size);
        rest = tail;

        let mut properties = entry.properties.clone();
        properties.extend(meta.properties.into_iter().map(|kv| (kv.key, kv.value)));

        let batch_index = i32::try_from(index).map_err(|_| truncated(index))?;
        messages.push(RawMessage {
            id: RawMessageId::Batched {
                ledger_id,
                entry_id,
                batch_index,
            },
            properties,
            payload: payload.to_vec(),
        });
    }

    Ok(messages)
}

/// Encode one `[len][metadata][payload]` batch record.
#[cfg(test)]
pub(crate) fn batch_record(props: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let meta = SingleMessageMetadata {
        properties: props
            .iter()
            .map(|(k, v)| KeyValue {
                key: (*k).to_string(),
                value: (*v).to_string(),
            })
            .collect(),
        payload_size: Some(payload.len() as i32),
    };
    let meta = prost::Message::encode_to_vec(&meta);
    let mut out = (meta.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(&meta);
    out.extend_from_slice(payload);
    out
}
