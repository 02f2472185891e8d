use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::config::NormalizerConfig;
use crate::directory::{Directory, NetworkCapability};
use crate::error::NormalizeError;
use crate::event::{BatchOrigin, EventBatch, LogEvent};
use crate::network::NetworkEnricher;
use crate::organization::OrganizationEnricher;
use crate::record::{Log, LogEntry};
use crate::store::LogStore;
use crate::topics::parse_topics;
use crate::user::UserContextEnricher;

/// Tag names requested by one persisted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTopics {
    pub entry_id: String,
    pub names: Vec<String>,
}

/// Result of one normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    /// The upserted parent log, with its storage id set.
    pub log: Log,
    /// Inserted entries, in event order, with storage ids set.
    pub entries: Vec<LogEntry>,
    /// Tag names per entry, for entries whose event carried a tag list.
    pub entry_topics: Vec<EntryTopics>,
}

impl NormalizedBatch {
    pub fn log_id(&self) -> &str {
        self.log.id.as_deref().unwrap_or_default()
    }
}

/// Turns a delivered batch of [`LogEvent`]s into one parent [`Log`] and one
/// [`LogEntry`] per event.
///
/// The parent is built from the first event only and enriched in a fixed
/// order: organization, network, user. Enrichment happens before anything
/// is written, so a failed lookup leaves storage untouched.
pub struct LogNormalizer {
    store: Arc<dyn LogStore>,
    organization: OrganizationEnricher,
    network: NetworkEnricher,
    user: UserContextEnricher,
}

impl LogNormalizer {
    pub fn new(
        store: Arc<dyn LogStore>,
        directory: Arc<dyn Directory>,
        capability: Arc<dyn NetworkCapability>,
        config: &NormalizerConfig,
    ) -> Self {
        Self {
            store,
            organization: OrganizationEnricher::new(Arc::clone(&directory)),
            network: NetworkEnricher::new(
                Arc::clone(&directory),
                capability,
                config.legacy_network_login_url,
            ),
            user: UserContextEnricher::new(directory),
        }
    }

    /// Normalize one batch.
    ///
    /// **Returns**
    /// - `Ok(None)` when the batch is empty, was not delivered by the event
    ///   bus, or mixes transactions. Nothing is written.
    /// - `Ok(Some(..))` with the persisted log and entries.
    /// - `Err(..)` when enrichment or persistence failed. If the log upsert
    ///   failed no entries were written.
    pub async fn normalize(
        &self,
        batch: &EventBatch,
    ) -> Result<Option<NormalizedBatch>, NormalizeError> {
        if batch.origin != BatchOrigin::EventBus {
            debug!(origin = ?batch.origin, "ignoring batch not delivered by the event bus");
            return Ok(None);
        }
        let Some(first) = batch.events.first() else {
            debug!("ignoring empty batch");
            return Ok(None);
        };
        let Some(transaction_id) = batch.transaction_id() else {
            warn!(
                events = batch.events.len(),
                "ignoring batch whose events span several transactions"
            );
            return Ok(None);
        };

        let mut log = Log::from_event(first);
        self.organization.enrich(&mut log).await?;
        self.network.enrich(&mut log).await?;
        self.user.enrich(&mut log).await?;

        let log_id = self
            .store
            .upsert_log(&log)
            .await
            .map_err(|source| NormalizeError::LogPersistence {
                transaction_id: transaction_id.to_string(),
                source,
            })?;
        if log_id.is_empty() {
            return Err(NormalizeError::MissingLogId {
                transaction_id: transaction_id.to_string(),
            });
        }
        log.id = Some(log_id.clone());

        let mut entries: Vec<LogEntry> = batch
            .events
            .iter()
            .map(|event| build_entry(event, &log_id))
            .collect();
        let ids = self
            .store
            .insert_entries(&entries)
            .await
            .map_err(|source| NormalizeError::EntryPersistence {
                transaction_id: transaction_id.to_string(),
                source,
            })?;
        if ids.len() != entries.len() {
            return Err(NormalizeError::EntryIdMismatch {
                expected: entries.len(),
                actual: ids.len(),
            });
        }
        for (entry, id) in entries.iter_mut().zip(ids) {
            entry.id = Some(id);
        }

        let entry_topics = entries
            .iter()
            .zip(&batch.events)
            .filter_map(|(entry, event)| {
                let topics = event.topics.as_deref()?;
                Some(EntryTopics {
                    entry_id: entry.id.clone()?,
                    names: parse_topics(topics),
                })
            })
            .collect();

        info!(
            %transaction_id,
            %log_id,
            entries = entries.len(),
            "normalized log event batch"
        );
        Ok(Some(NormalizedBatch {
            log,
            entries,
            entry_topics,
        }))
    }
}

/// Prefer the string-encoded timestamp when it is present and parses;
/// otherwise use the native one.
pub fn resolve_timestamp(event: &LogEvent) -> DateTime<Utc> {
    let Some(raw) = event.timestamp_string.as_deref().map(str::trim) else {
        return event.timestamp;
    };
    if raw.is_empty() {
        return event.timestamp;
    }
    if let Ok(millis) = raw.parse::<i64>() {
        if let Some(ts) = Utc.timestamp_millis_opt(millis).single() {
            return ts;
        }
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            warn!(timestamp_string = raw, error = %e, "unparseable timestamp string, using native timestamp");
            event.timestamp
        }
    }
}

fn build_entry(event: &LogEvent, log_id: &str) -> LogEntry {
    LogEntry {
        id: None,
        log_id: log_id.to_string(),
        transaction_entry_number: event.transaction_entry_number,
        logging_level: event.logging_level,
        logging_level_ordinal: event.logging_level_ordinal,
        message: event.message.clone(),
        message_truncated: event.message_truncated,
        timestamp: resolve_timestamp(event),
        origin_type: event.origin_type.clone(),
        origin_location: event.origin_location.clone(),
        stack_trace: event.stack_trace.clone(),
        exception_type: event.exception_type.clone(),
        exception_message: event.exception_message.clone(),
        exception_stack_trace: event.exception_stack_trace.clone(),
        record_id: event.record_id.clone(),
        record_json: event.record_json.clone(),
        trigger_is_executing: event.trigger_is_executing,
        trigger_operation_type: event.trigger_operation_type.clone(),
        trigger_sobject_type: event.trigger_sobject_type.clone(),
        topics: event.topics.clone(),
        limits: event.limits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LoggingLevel;
    use chrono::Duration;

    fn event_at(ts: DateTime<Utc>, timestamp_string: Option<&str>) -> LogEvent {
        let mut event = LogEvent::new("tx", "005A", LoggingLevel::Info, ts);
        event.timestamp_string = timestamp_string.map(str::to_string);
        event
    }

    #[test]
    fn epoch_millis_string_wins_over_native_timestamp() {
        let native = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let event = event_at(native, Some("1700000000123"));

        assert_eq!(resolve_timestamp(&event), native + Duration::milliseconds(123));
    }

    #[test]
    fn rfc3339_string_is_accepted() {
        let native = Utc.timestamp_millis_opt(0).unwrap();
        let event = event_at(native, Some("2024-05-06T07:08:09.123456Z"));

        assert_eq!(
            resolve_timestamp(&event),
            DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123456Z").unwrap()
        );
    }

    #[test]
    fn blank_or_garbage_string_falls_back_to_native() {
        let native = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        assert_eq!(resolve_timestamp(&event_at(native, None)), native);
        assert_eq!(resolve_timestamp(&event_at(native, Some("   "))), native);
        assert_eq!(resolve_timestamp(&event_at(native, Some("yesterday"))), native);
    }

    #[test]
    fn entry_copies_payload_fields() {
        let mut event = event_at(Utc::now(), None);
        event.message = Some("order failed".to_string());
        event.exception_type = Some("DmlException".to_string());
        event.trigger_is_executing = true;
        event.limits.queries.used = 12;

        let entry = build_entry(&event, "log-1");

        assert_eq!(entry.log_id, "log-1");
        assert_eq!(entry.message.as_deref(), Some("order failed"));
        assert_eq!(entry.exception_type.as_deref(), Some("DmlException"));
        assert!(entry.trigger_is_executing);
        assert_eq!(entry.limits.queries.used, 12);
    }
}
