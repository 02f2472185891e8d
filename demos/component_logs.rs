use std::sync::Arc;

use log_normalizer::component::{ComponentContext, ComponentLogEntry, ComponentLogger, StaticSettings};
use log_normalizer::config::NormalizerConfig;
use log_normalizer::directory::{StaticCapability, UserRecord};
use log_normalizer::event::LoggingLevel;
use log_normalizer::handler::LogEventHandler;
use log_normalizer::init::{init_tracing, TracingConfig};
use log_normalizer::memory::{MemoryDirectory, MemoryStore};

/// Entries as a UI component would post them.
const PAYLOAD: &str = r#"[
  {"loggingLevel": "DEBUG", "message": "rendering form", "timestamp": "2024-03-01T10:00:00.100Z"},
  {"loggingLevel": "ERROR", "message": "save failed", "timestamp": "2024-03-01T10:00:01.250Z",
   "originLocation": "c/orderForm.handleSave",
   "error": {"message": "REQUIRED_FIELD_MISSING", "type": "AuraHandledException"},
   "recordId": "006000000000001", "record": {"Id": "006000000000001", "StageName": null},
   "topics": ["checkout", "ui"]}
]"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing(&TracingConfig::default())?;

    let entries: Vec<ComponentLogEntry> = serde_json::from_str(PAYLOAD)?;
    let context = ComponentContext {
        transaction_id: "ui-tx-1".to_string(),
        logged_by_id: "005000000000002".to_string(),
        locale: Some("en_US".to_string()),
        ..ComponentContext::default()
    };

    // Users at INFO and above: the DEBUG entry is dropped.
    let logger = ComponentLogger::new(StaticSettings {
        enabled: true,
        level: LoggingLevel::Info,
    });
    let batch = logger.to_batch(&context, &entries)?;

    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(MemoryDirectory::default().with_user(UserRecord {
        id: "005000000000002".to_string(),
        username: "designer@example.com".to_string(),
        profile_name: Some("Standard User".to_string()),
        user_license_id: None,
        user_license_name: None,
        user_license_definition_key: None,
        user_role_name: Some("Sales".to_string()),
    }));
    let handler = LogEventHandler::new(
        store.clone(),
        directory,
        Arc::new(StaticCapability(false)),
        &NormalizerConfig::default(),
    );
    handler.handle(&batch).await?;

    println!(
        "logs={} entries={} tags={:?}",
        store.log_count(),
        store.entry_count(),
        store.tags().into_iter().map(|tag| tag.name).collect::<Vec<_>>()
    );
    Ok(())
}
