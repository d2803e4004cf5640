// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic addressing, pagination and stats value types.

use crate::error::GatewayError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default page size when the caller gives none.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Longest tenant or namespace name accepted.
pub const MAX_NAME_LEN: usize = 255;

const PARTITION_SUFFIX: &str = "-partition-";

/// Topic persistence mode (the URL scheme of a full topic name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persistence {
    Persistent,
    NonPersistent,
}

impl Persistence {
    /// Listing order used by the topic catalog.
    pub const ALL: [Persistence; 2] = [Persistence::Persistent, Persistence::NonPersistent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::NonPersistent => "non-persistent",
        }
    }
}

impl fmt::Display for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persistence {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "persistent" => Ok(Self::Persistent),
            "non-persistent" => Ok(Self::NonPersistent),
            other => Err(GatewayError::validation(format!(
                "persistence must be 'persistent' or 'non-persistent', got '{}'",
                other
            ))),
        }
    }
}

/// Fully qualified topic address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TopicRef {
    #[serde(rename = "persistent")]
    persistence: Persistence,
    tenant: String,
    namespace: String,
    #[serde(rename = "topic")]
    name: String,
}

impl TopicRef {
    /// Build a topic address from path segments.
    pub fn new(
        persistence: Persistence,
        tenant: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let tenant = tenant.into();
        let namespace = namespace.into();
        let name = name.into();
        validate_segment("tenant", &tenant)?;
        validate_segment("namespace", &namespace)?;
        if name.is_empty() {
            return Err(GatewayError::validation("topic name must not be empty"));
        }
        Ok(Self {
            persistence,
            tenant,
            namespace,
            name,
        })
    }

    /// Parse a broker-reported name such as `persistent://public/default/orders`.
    pub fn parse(full_name: &str) -> Result<Self, GatewayError> {
        let malformed = || GatewayError::decode(format!("malformed topic name '{}'", full_name));

        let (scheme, rest) = full_name.split_once("://").ok_or_else(malformed)?;
        let persistence: Persistence = scheme.parse().map_err(|_| malformed())?;
        let mut parts = rest.splitn(3, '/');
        let (Some(tenant), Some(namespace), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Self::new(persistence, tenant, namespace, name).map_err(|_| malformed())
    }

    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `persistent://tenant/namespace/name`
    pub fn full_name(&self) -> String {
        format!(
            "{}://{}/{}/{}",
            self.persistence, self.tenant, self.namespace, self.name
        )
    }

    /// Split `orders-partition-3` into the partitioned topic `orders` and index 3.
    pub fn partition_of(&self) -> Option<(TopicRef, u32)> {
        let pos = self.name.rfind(PARTITION_SUFFIX)?;
        let index: u32 = self.name[pos + PARTITION_SUFFIX.len()..].parse().ok()?;
        if pos == 0 {
            return None;
        }
        let base = Self {
            name: self.name[..pos].to_string(),
            ..self.clone()
        };
        Some((base, index))
    }
}

impl fmt::Display for TopicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            self.persistence, self.tenant, self.namespace, self.name
        )
    }
}

/// Check a tenant or namespace path segment.
pub fn validate_segment(what: &str, value: &str) -> Result<(), GatewayError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(GatewayError::validation(format!(
            "{} must be between 1 and {} characters",
            what, MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// One row of a topic listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
    #[serde(flatten)]
    pub topic: TopicRef,
    /// Set for topics the broker reports as partitioned, even with no partition listed.
    pub partitioned: bool,
    /// Listed partitions, always 0 for a non-partitioned topic.
    pub partitions: u32,
}

impl TopicEntry {
    pub fn plain(topic: TopicRef) -> Self {
        Self {
            topic,
            partitioned: false,
            partitions: 0,
        }
    }

    pub fn partitioned(topic: TopicRef, partitions: u32) -> Self {
        Self {
            topic,
            partitioned: true,
            partitions,
        }
    }

    pub fn is_partitioned(&self) -> bool {
        self.partitioned
    }
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_num: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page_num: u32, page_size: u32) -> Result<Self, GatewayError> {
        if page_num < 1 {
            return Err(GatewayError::validation(
                "page_num is incorrect, should be greater than 0.",
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(GatewayError::validation(format!(
                "page_size is incorrect, should be between 1 and {}.",
                MAX_PAGE_SIZE
            )));
        }
        Ok(Self {
            page_num,
            page_size,
        })
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Half-open index window of this page, clamped to `total`.
    pub fn window(&self, total: usize) -> std::ops::Range<usize> {
        let size = self.page_size as usize;
        let start = (self.page_num as usize - 1).saturating_mul(size).min(total);
        let end = start.saturating_add(size).min(total);
        start..end
    }

    /// Cut this page out of the full ordered item list.
    pub fn slice<T>(&self, items: Vec<T>) -> PageResult<T> {
        let total_count = items.len();
        let window = self.window(total_count);
        let items = items
            .into_iter()
            .skip(window.start)
            .take(window.len())
            .collect();
        PageResult {
            items,
            total_count,
            page_num: self.page_num,
            page_size: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Size of the full set, independent of the window.
    pub total_count: usize,
    pub page_num: u32,
    pub page_size: u32,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_num: self.page_num,
            page_size: self.page_size,
        }
    }
}

/// Aggregated broker statistics for one topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_in: f64,
    pub msg_throughput_out: f64,
    pub average_msg_size: f64,
    pub storage_size: i64,
    pub backlog_size: i64,
    pub producer_count: usize,
    pub subscription_count: usize,
}

/// A listed topic joined with its stats, or the reason they are missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStatsEntry {
    #[serde(flatten)]
    pub entry: TopicEntry,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TopicStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
