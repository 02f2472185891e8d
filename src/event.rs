use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log event, ranked the way the host platform ranks it.
///
/// The numeric rank grows with severity (`ERROR` is the highest), so a
/// user configured at `DEBUG` sees `DEBUG` and everything above it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoggingLevel {
    #[default]
    None = 0,
    Internal = 1,
    Finest = 2,
    Finer = 3,
    Fine = 4,
    Debug = 5,
    Info = 6,
    Warn = 7,
    Error = 8,
}

impl LoggingLevel {
    /// Numeric rank stored alongside the level name.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoggingLevel::None => "NONE",
            LoggingLevel::Internal => "INTERNAL",
            LoggingLevel::Finest => "FINEST",
            LoggingLevel::Finer => "FINER",
            LoggingLevel::Fine => "FINE",
            LoggingLevel::Debug => "DEBUG",
            LoggingLevel::Info => "INFO",
            LoggingLevel::Warn => "WARN",
            LoggingLevel::Error => "ERROR",
        }
    }

    /// Case-insensitive lookup by level name.
    pub fn from_name(name: &str) -> Option<Self> {
        let level = match name.trim().to_ascii_uppercase().as_str() {
            "NONE" => LoggingLevel::None,
            "INTERNAL" => LoggingLevel::Internal,
            "FINEST" => LoggingLevel::Finest,
            "FINER" => LoggingLevel::Finer,
            "FINE" => LoggingLevel::Fine,
            "DEBUG" => LoggingLevel::Debug,
            "INFO" => LoggingLevel::Info,
            "WARN" => LoggingLevel::Warn,
            "ERROR" => LoggingLevel::Error,
            _ => return None,
        };
        Some(level)
    }
}

/// One governor limit reading: how much was consumed and the ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitUsage {
    pub used: i64,
    pub max: i64,
}

/// Snapshot of platform resource limits taken when the event was emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorLimits {
    pub aggregate_queries: LimitUsage,
    pub async_calls: LimitUsage,
    pub callouts: LimitUsage,
    pub cpu_time: LimitUsage,
    pub dml_rows: LimitUsage,
    pub dml_statements: LimitUsage,
    pub email_invocations: LimitUsage,
    pub future_calls: LimitUsage,
    pub heap_size: LimitUsage,
    pub mobile_push_apex_calls: LimitUsage,
    pub publish_immediate_dml: LimitUsage,
    pub queueable_jobs: LimitUsage,
    pub queries: LimitUsage,
    pub query_locator_rows: LimitUsage,
    pub query_rows: LimitUsage,
    pub sosl_searches: LimitUsage,
}

/// A single "log occurred" event as emitted by a producer.
///
/// Events are flat and immutable; every event in one delivery shares the
/// same `transaction_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    // Linkage
    pub transaction_id: String,
    pub parent_transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_entry_number: u32,
    pub logged_by_id: String,
    pub logged_by_username: Option<String>,

    // Session and environment
    pub api_version: Option<String>,
    pub locale: Option<String>,
    pub login_application: Option<String>,
    pub login_browser: Option<String>,
    pub login_domain: Option<String>,
    pub login_history_id: Option<String>,
    pub login_platform: Option<String>,
    pub login_type: Option<String>,
    pub logout_url: Option<String>,
    pub network_id: Option<String>,
    pub profile_id: Option<String>,
    pub session_id: Option<String>,
    pub session_security_level: Option<String>,
    pub session_type: Option<String>,
    pub source_ip: Option<String>,
    pub system_mode: Option<String>,
    pub theme_displayed: Option<String>,
    pub timezone_id: Option<String>,
    pub timezone_name: Option<String>,
    pub user_logging_level: Option<LoggingLevel>,
    pub user_role_id: Option<String>,
    pub user_type: Option<String>,

    // Payload
    #[serde(default)]
    pub logging_level: LoggingLevel,
    #[serde(default)]
    pub logging_level_ordinal: u8,
    pub message: Option<String>,
    #[serde(default)]
    pub message_truncated: bool,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    /// Epoch milliseconds (or RFC 3339) kept as text so sub-second precision
    /// survives transports that round native datetimes.
    pub timestamp_string: Option<String>,
    pub origin_type: Option<String>,
    pub origin_location: Option<String>,
    pub stack_trace: Option<String>,
    pub exception_type: Option<String>,
    pub exception_message: Option<String>,
    pub exception_stack_trace: Option<String>,
    pub record_id: Option<String>,
    pub record_json: Option<String>,
    #[serde(default)]
    pub trigger_is_executing: bool,
    pub trigger_operation_type: Option<String>,
    pub trigger_sobject_type: Option<String>,
    /// Comma-delimited tag names.
    pub topics: Option<String>,
    #[serde(default)]
    pub limits: GovernorLimits,
}

impl LogEvent {
    /// Minimal event with the fields every producer must set.
    pub fn new(
        transaction_id: impl Into<String>,
        logged_by_id: impl Into<String>,
        logging_level: LoggingLevel,
        timestamp: DateTime<Utc>,
    ) -> Self {
        LogEvent {
            transaction_id: transaction_id.into(),
            logged_by_id: logged_by_id.into(),
            logging_level,
            logging_level_ordinal: logging_level.ordinal(),
            timestamp,
            ..LogEvent::default()
        }
    }
}

/// Where a batch of events came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOrigin {
    /// Delivered by the event bus after the events were published.
    EventBus,
    /// Any other invocation; the normalizer ignores these batches.
    Other(String),
}

/// One delivery of events handed to the normalizer.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub origin: BatchOrigin,
    pub events: Vec<LogEvent>,
}

impl EventBatch {
    /// Batch delivered by the event bus.
    pub fn delivered(events: Vec<LogEvent>) -> Self {
        EventBatch {
            origin: BatchOrigin::EventBus,
            events,
        }
    }

    /// Transaction id shared by every event, or `None` when the batch is
    /// empty or mixes transactions.
    pub fn transaction_id(&self) -> Option<&str> {
        let first = self.events.first()?;
        self.events
            .iter()
            .all(|event| event.transaction_id == first.transaction_id)
            .then_some(first.transaction_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordinals_rank_error_highest() {
        assert_eq!(LoggingLevel::Error.ordinal(), 8);
        assert_eq!(LoggingLevel::Debug.ordinal(), 5);
        assert!(LoggingLevel::Warn > LoggingLevel::Info);
        assert_eq!(LoggingLevel::from_name("warn"), Some(LoggingLevel::Warn));
        assert_eq!(LoggingLevel::from_name("verbose"), None);
    }

    #[test]
    fn batch_transaction_id_requires_a_single_transaction() {
        let ts = Utc::now();
        let a = LogEvent::new("tx-1", "005A", LoggingLevel::Info, ts);
        let b = LogEvent::new("tx-2", "005A", LoggingLevel::Info, ts);

        assert_eq!(EventBatch::delivered(vec![a.clone(), a.clone()]).transaction_id(), Some("tx-1"));
        assert_eq!(EventBatch::delivered(vec![a, b]).transaction_id(), None);
        assert_eq!(EventBatch::delivered(Vec::new()).transaction_id(), None);
    }

    #[test]
    fn event_deserializes_with_missing_optional_fields() {
        let event: LogEvent = serde_json::from_str(
            r#"{"transaction_id":"tx-9","logged_by_id":"005B","logging_level":"ERROR","timestamp":"2024-01-02T03:04:05Z"}"#,
        )
        .unwrap();

        assert_eq!(event.logging_level, LoggingLevel::Error);
        assert!(event.topics.is_none());
        assert_eq!(event.limits, GovernorLimits::default());
    }
}
