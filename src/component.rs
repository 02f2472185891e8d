//! Adapter turning log entries sent by UI components into [`LogEvent`]s.
//!
//! Components post a list of [`ComponentLogEntry`] values; the adapter
//! filters them by the user's logging settings and emits the same event
//! shape server-side producers use, so the normalizer never sees the
//! difference.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::event::{EventBatch, LogEvent, LoggingLevel};

/// Longest message stored on an entry; longer messages are cut and flagged.
pub const MAX_MESSAGE_LENGTH: usize = 131_072;

/// Origin type written on events coming from UI components.
pub const COMPONENT_ORIGIN_TYPE: &str = "Component";

/// Per-user logging settings, resolved elsewhere.
pub trait LoggerSettings: Send + Sync {
    fn is_enabled(&self, user_id: &str) -> bool;

    /// Least severe level that is still recorded for the user.
    fn logging_level(&self, user_id: &str) -> LoggingLevel;
}

/// Same settings for every user.
#[derive(Debug, Clone, Copy)]
pub struct StaticSettings {
    pub enabled: bool,
    pub level: LoggingLevel,
}

impl LoggerSettings for StaticSettings {
    fn is_enabled(&self, _user_id: &str) -> bool {
        self.enabled
    }

    fn logging_level(&self, _user_id: &str) -> LoggingLevel {
        self.level
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentError {
    pub message: Option<String>,
    pub stack: Option<String>,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

/// One log entry as posted by a UI component.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLogEntry {
    pub logging_level: String,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub origin_location: Option<String>,
    pub stack: Option<String>,
    pub error: Option<ComponentError>,
    pub record_id: Option<String>,
    pub record: Option<serde_json::Value>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Session facts of the request that carried the component entries.
#[derive(Debug, Clone, Default)]
pub struct ComponentContext {
    pub transaction_id: String,
    pub logged_by_id: String,
    pub logged_by_username: Option<String>,
    pub locale: Option<String>,
    pub network_id: Option<String>,
    pub profile_id: Option<String>,
    pub session_id: Option<String>,
    pub theme_displayed: Option<String>,
    pub timezone_id: Option<String>,
    pub user_role_id: Option<String>,
    pub user_type: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ComponentLogError {
    #[error("unknown logging level {0:?}")]
    UnknownLevel(String),

    #[error("failed to serialize record snapshot: {0}")]
    RecordSnapshot(#[from] serde_json::Error),
}

/// Converts component entries into an [`EventBatch`].
pub struct ComponentLogger<S> {
    settings: S,
}

impl<S: LoggerSettings> ComponentLogger<S> {
    pub fn new(settings: S) -> Self {
        Self { settings }
    }

    /// Build the events for the entries that meet the user's settings.
    ///
    /// Entries below the user's level are dropped; nothing is emitted when
    /// logging is disabled for the user. An unknown level name fails the
    /// whole request.
    pub fn to_batch(
        &self,
        context: &ComponentContext,
        entries: &[ComponentLogEntry],
    ) -> Result<EventBatch, ComponentLogError> {
        if !self.settings.is_enabled(&context.logged_by_id) {
            return Ok(EventBatch::delivered(Vec::new()));
        }
        let user_level = self.settings.logging_level(&context.logged_by_id);

        let mut events = Vec::with_capacity(entries.len());
        let mut number: u32 = 0;
        for entry in entries {
            let level = LoggingLevel::from_name(&entry.logging_level)
                .ok_or_else(|| ComponentLogError::UnknownLevel(entry.logging_level.clone()))?;
            if level == LoggingLevel::None || level < user_level {
                continue;
            }
            number = number.saturating_add(1);
            events.push(self.to_event(context, entry, level, user_level, number)?);
        }
        Ok(EventBatch::delivered(events))
    }

    fn to_event(
        &self,
        context: &ComponentContext,
        entry: &ComponentLogEntry,
        level: LoggingLevel,
        user_level: LoggingLevel,
        number: u32,
    ) -> Result<LogEvent, ComponentLogError> {
        let mut event = LogEvent::new(
            context.transaction_id.clone(),
            context.logged_by_id.clone(),
            level,
            entry.timestamp,
        );
        event.transaction_entry_number = number;
        event.logged_by_username = context.logged_by_username.clone();
        event.locale = context.locale.clone();
        event.network_id = context.network_id.clone();
        event.profile_id = context.profile_id.clone();
        event.session_id = context.session_id.clone();
        event.theme_displayed = context.theme_displayed.clone();
        event.timezone_id = context.timezone_id.clone();
        event.user_logging_level = Some(user_level);
        event.user_role_id = context.user_role_id.clone();
        event.user_type = context.user_type.clone();

        if let Some(message) = &entry.message {
            let (message, truncated) = truncate(message, MAX_MESSAGE_LENGTH);
            event.message = Some(message);
            event.message_truncated = truncated;
        }
        event.origin_type = Some(COMPONENT_ORIGIN_TYPE.to_string());
        event.origin_location = entry.origin_location.clone();
        event.stack_trace = entry.stack.clone();
        if let Some(error) = &entry.error {
            event.exception_type = error.error_type.clone();
            event.exception_message = error.message.clone();
            event.exception_stack_trace = error.stack.clone();
        }
        event.record_id = entry.record_id.clone();
        event.record_json = entry
            .record
            .as_ref()
            .map(serde_json::to_string_pretty)
            .transpose()?;
        if !entry.topics.is_empty() {
            event.topics = Some(entry.topics.join(","));
        }
        Ok(event)
    }
}

fn truncate(message: &str, max_chars: usize) -> (String, bool) {
    match message.char_indices().nth(max_chars) {
        Some((cut, _)) => (message[..cut].to_string(), true),
        None => (message.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ComponentContext {
        ComponentContext {
            transaction_id: "tx-ui".to_string(),
            logged_by_id: "005A".to_string(),
            ..ComponentContext::default()
        }
    }

    fn entry(level: &str, message: &str) -> ComponentLogEntry {
        serde_json::from_value(serde_json::json!({
            "loggingLevel": level,
            "message": message,
            "timestamp": "2024-03-01T10:00:00.250Z",
            "originLocation": "c/orderForm.submit",
        }))
        .unwrap()
    }

    #[test]
    fn entries_below_user_level_are_dropped() {
        let logger = ComponentLogger::new(StaticSettings {
            enabled: true,
            level: LoggingLevel::Info,
        });

        let batch = logger
            .to_batch(&context(), &[entry("DEBUG", "noise"), entry("ERROR", "boom"), entry("info", "saved")])
            .unwrap();

        let levels: Vec<_> = batch.events.iter().map(|e| e.logging_level).collect();
        assert_eq!(levels, vec![LoggingLevel::Error, LoggingLevel::Info]);
        assert_eq!(batch.events[1].transaction_entry_number, 2);
        assert_eq!(batch.events[0].origin_type.as_deref(), Some(COMPONENT_ORIGIN_TYPE));
        assert_eq!(batch.transaction_id(), Some("tx-ui"));
    }

    #[test]
    fn entry_numbers_count_only_emitted_entries() {
        let logger = ComponentLogger::new(StaticSettings {
            enabled: true,
            level: LoggingLevel::Warn,
        });

        let batch = logger
            .to_batch(
                &context(),
                &[entry("ERROR", "a"), entry("DEBUG", "b"), entry("NONE", "c"), entry("WARN", "d")],
            )
            .unwrap();

        let numbers: Vec<u32> = batch.events.iter().map(|e| e.transaction_entry_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn disabled_logging_emits_nothing() {
        let logger = ComponentLogger::new(StaticSettings {
            enabled: false,
            level: LoggingLevel::Finest,
        });

        let batch = logger.to_batch(&context(), &[entry("ERROR", "boom")]).unwrap();

        assert!(batch.events.is_empty());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let logger = ComponentLogger::new(StaticSettings {
            enabled: true,
            level: LoggingLevel::Debug,
        });

        let err = logger.to_batch(&context(), &[entry("LOUD", "?")]).unwrap_err();

        assert!(matches!(err, ComponentLogError::UnknownLevel(level) if level == "LOUD"));
    }

    #[test]
    fn long_messages_are_truncated_and_flagged() {
        let logger = ComponentLogger::new(StaticSettings {
            enabled: true,
            level: LoggingLevel::Debug,
        });
        let long = "x".repeat(MAX_MESSAGE_LENGTH + 10);

        let batch = logger.to_batch(&context(), &[entry("WARN", &long)]).unwrap();

        let event = &batch.events[0];
        assert!(event.message_truncated);
        assert_eq!(event.message.as_ref().unwrap().len(), MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn topics_and_record_snapshot_are_carried() {
        let logger = ComponentLogger::new(StaticSettings {
            enabled: true,
            level: LoggingLevel::Debug,
        });
        let mut with_extras = entry("INFO", "saved");
        with_extras.topics = vec!["checkout".to_string(), "ui".to_string()];
        with_extras.record = Some(serde_json::json!({ "Id": "006A", "Amount": 10 }));

        let batch = logger.to_batch(&context(), &[with_extras]).unwrap();

        let event = &batch.events[0];
        assert_eq!(event.topics.as_deref(), Some("checkout,ui"));
        let snapshot: serde_json::Value =
            serde_json::from_str(event.record_json.as_deref().unwrap()).unwrap();
        assert_eq!(snapshot["Amount"], 10);
    }
}
