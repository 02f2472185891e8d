use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::TopicError;
use crate::normalizer::EntryTopics;
use crate::record::{TagAssignment, TaggedRecord};
use crate::store::LogStore;

/// Split a comma-delimited tag list.
///
/// Names are kept exactly as written: no trimming and no case folding, so
/// `"a, b"` yields `"a"` and `" b"`. Zero-length segments are dropped.
pub fn parse_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Creates missing tags and assigns them to entries and their parent log.
pub struct TopicAssigner {
    store: Arc<dyn LogStore>,
}

impl TopicAssigner {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Assign every requested tag to its entry and to the parent log.
    ///
    /// Uses at most one tag lookup, one tag insert and one assignment insert.
    /// With no tag names at all nothing is queried or written.
    ///
    /// **Returns**
    /// - the number of assignments written.
    pub async fn assign_tags(
        &self,
        entry_topics: &[EntryTopics],
        log_id: &str,
    ) -> Result<usize, TopicError> {
        let names: BTreeSet<&str> = entry_topics
            .iter()
            .flat_map(|entry| entry.names.iter().map(String::as_str))
            .collect();
        if names.is_empty() {
            debug!(%log_id, "no tags requested");
            return Ok(0);
        }
        let names: Vec<String> = names.into_iter().map(str::to_string).collect();

        let mut tag_ids: BTreeMap<String, String> = self
            .store
            .find_tags(&names)
            .await
            .map_err(TopicError::Lookup)?
            .into_iter()
            .map(|tag| (tag.name, tag.id))
            .collect();

        let missing: Vec<String> = names
            .iter()
            .filter(|name| !tag_ids.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let created = self
                .store
                .insert_tags(&missing)
                .await
                .map_err(TopicError::TagPersistence)?;
            debug!(created = created.len(), "created tags");
            tag_ids.extend(created.into_iter().map(|tag| (tag.name, tag.id)));
        }

        let mut assignments = BTreeSet::new();
        for entry in entry_topics {
            for name in &entry.names {
                let tag_id = tag_ids
                    .get(name)
                    .ok_or_else(|| TopicError::UnresolvedTag { name: name.clone() })?;
                assignments.insert(TagAssignment {
                    record: TaggedRecord::LogEntry(entry.entry_id.clone()),
                    tag_id: tag_id.clone(),
                });
                assignments.insert(TagAssignment {
                    record: TaggedRecord::Log(log_id.to_string()),
                    tag_id: tag_id.clone(),
                });
            }
        }

        let assignments: Vec<TagAssignment> = assignments.into_iter().collect();
        self.store
            .insert_tag_assignments(&assignments)
            .await
            .map_err(TopicError::AssignmentPersistence)?;

        info!(
            %log_id,
            tags = names.len(),
            assignments = assignments.len(),
            "assigned tags"
        );
        Ok(assignments.len())
    }
}
