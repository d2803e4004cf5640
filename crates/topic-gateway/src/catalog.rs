// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic catalog paginator.
//!
//! Enumerates every topic of a namespace from the broker, collapses
//! partitions into their partitioned topic, then windows the ordered list
//! into the requested page. Stats are fetched only for topics inside the
//! window, one broker call per topic.

use crate::error::GatewayError;
use crate::model::{
    validate_segment, PageRequest, PageResult, Persistence, TopicEntry, TopicRef,
    TopicStatsEntry,
};
use crate::session::{AdminSession, ScopedSession, SessionFactory};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Paginated topic listings against one broker.
pub struct TopicCatalog<'a> {
    sessions: &'a dyn SessionFactory,
}

impl<'a> TopicCatalog<'a> {
    pub fn new(sessions: &'a dyn SessionFactory) -> Self {
        Self { sessions }
    }

    /// One page of the topics of `tenant/namespace`.
    pub fn list_topics(
        &self,
        service_url: &str,
        tenant: &str,
        namespace: &str,
        page: PageRequest,
    ) -> Result<PageResult<TopicEntry>, GatewayError> {
        validate_segment("tenant", tenant)?;
        validate_segment("namespace", namespace)?;

        let session = ScopedSession::open(self.sessions, service_url)?;
        let topics = enumerate(&*session, tenant, namespace)?;
        debug!(
            "{}/{}: {} topics, serving page {} (size {})",
            tenant,
            namespace,
            topics.len(),
            page.page_num(),
            page.page_size()
        );
        Ok(page.slice(topics))
    }

    /// One page of topics joined with their stats.
    ///
    /// A failed stats fetch is recorded on its item; the rest of the page is
    /// still served.
    pub fn list_topic_stats(
        &self,
        service_url: &str,
        tenant: &str,
        namespace: &str,
        page: PageRequest,
        environment: &str,
    ) -> Result<PageResult<TopicStatsEntry>, GatewayError> {
        validate_segment("tenant", tenant)?;
        validate_segment("namespace", namespace)?;

        let session = ScopedSession::open(self.sessions, service_url)?;
        let window = page.slice(enumerate(&*session, tenant, namespace)?);

        Ok(window.map(|entry| {
            match session.topic_stats(&entry.topic, entry.is_partitioned()) {
                Ok(stats) => TopicStatsEntry {
                    entry,
                    environment: environment.to_string(),
                    stats: Some(stats),
                    error: None,
                },
                Err(e) => {
                    warn!("Stats unavailable for {}: {}", entry.topic, e);
                    TopicStatsEntry {
                        entry,
                        environment: environment.to_string(),
                        stats: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        }))
    }
}

/// Full ordered topic list of a namespace, persistent topics first.
fn enumerate(
    session: &dyn AdminSession,
    tenant: &str,
    namespace: &str,
) -> Result<Vec<TopicEntry>, GatewayError> {
    let mut entries = Vec::new();
    for persistence in Persistence::ALL {
        let names = session.list_topics(persistence, tenant, namespace)?;
        let partitioned = session.list_partitioned_topics(persistence, tenant, namespace)?;
        entries.extend(collapse_partitions(&names, &partitioned)?);
    }
    Ok(entries)
}

/// Fold `<name>-partition-<n>` topics into their partitioned parent.
///
/// The parent takes the slot of its first listed partition. Partitioned
/// topics without any listed partition go at the end.
fn collapse_partitions(
    names: &[String],
    partitioned: &[String],
) -> Result<Vec<TopicEntry>, GatewayError> {
    let parents = partitioned
        .iter()
        .map(|name| TopicRef::parse(name))
        .collect::<Result<Vec<_>, _>>()?;
    let parent_set: HashSet<&TopicRef> = parents.iter().collect();

    let mut entries: Vec<TopicEntry> = Vec::new();
    let mut slot_of: HashMap<TopicRef, usize> = HashMap::new();

    for name in names {
        let topic = TopicRef::parse(name)?;
        match topic.partition_of() {
            Some((parent, _)) if parent_set.contains(&parent) => {
                if let Some(&slot) = slot_of.get(&parent) {
                    entries[slot].partitions += 1;
                } else {
                    slot_of.insert(parent.clone(), entries.len());
                    entries.push(TopicEntry::partitioned(parent, 1));
                }
            }
            _ => entries.push(TopicEntry::plain(topic)),
        }
    }

    for parent in parents {
        if !slot_of.contains_key(&parent) {
            entries.push(TopicEntry::partitioned(parent, 0));
        }
    }

    Ok(entries)
}
