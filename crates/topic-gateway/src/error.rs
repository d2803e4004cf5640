// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway error taxonomy.

use thiserror::Error;

/// Coarse classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Connection,
    Broker,
    Decode,
}

/// Errors raised while serving a gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Bad pagination or path parameters, rejected before any broker I/O.
    #[error("{0}")]
    Validation(String),

    /// The admin session could not be built or the transport failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The broker reported a failure for the requested operation.
    #[error("{0}")]
    Broker(String),

    /// The broker returned a message shape we do not understand.
    #[error("decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn broker(msg: impl Into<String>) -> Self {
        Self::Broker(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Broker(_) => ErrorKind::Broker,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_builder() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Broker(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            GatewayError::validation("x").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            GatewayError::connection("x").kind(),
            ErrorKind::Connection
        );
        assert_eq!(GatewayError::broker("x").kind(), ErrorKind::Broker);
        assert_eq!(GatewayError::decode("x").kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_broker_message_passes_through() {
        let err = GatewayError::broker("Topic not found");
        assert_eq!(err.to_string(), "Topic not found");
    }
}
