use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use log_normalizer::backend::{make_store_from_config, parse_dsn};
use log_normalizer::config::NormalizerConfig;
use log_normalizer::directory::{StaticCapability, UserRecord};
use log_normalizer::event::{EventBatch, LogEvent, LoggingLevel};
use log_normalizer::handler::LogEventHandler;
use log_normalizer::init::{init_tracing, TracingConfig};
use log_normalizer::memory::MemoryDirectory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 1) Configuration comes from LOG_NORMALIZER_* variables; the store
    //    defaults to `memory://`.
    let config = NormalizerConfig::from_env();
    init_tracing(&TracingConfig::from(&config))?;

    let store = make_store_from_config(&parse_dsn(&config.store_dsn)?).await?;
    let directory = Arc::new(MemoryDirectory::default().with_user(UserRecord {
        id: "005000000000001".to_string(),
        username: "demo@example.com".to_string(),
        profile_name: Some("System Administrator".to_string()),
        user_license_id: None,
        user_license_name: Some("Salesforce".to_string()),
        user_license_definition_key: Some("SFDC".to_string()),
        user_role_name: None,
    }));
    let handler = LogEventHandler::new(
        store.clone(),
        directory,
        Arc::new(StaticCapability(false)),
        &config,
    );

    // 2) One delivery: three events from the same transaction.
    let mut events = Vec::new();
    for (n, (level, message, topics)) in [
        (LoggingLevel::Info, "order received", Some("orders")),
        (LoggingLevel::Warn, "inventory low", Some("orders,inventory")),
        (LoggingLevel::Error, "payment declined", Some("payments")),
    ]
    .into_iter()
    .enumerate()
    {
        let mut event = LogEvent::new("demo-tx-1", "005000000000001", level, Utc::now());
        event.transaction_entry_number = n as u32 + 1;
        event.message = Some(message.to_string());
        event.topics = topics.map(str::to_string);
        events.push(event);
    }

    // 3) Normalize and tag, then read back what the export side would see.
    let handled = handler.handle(&EventBatch::delivered(events)).await?;
    if let Some(handled) = handled {
        info!(
            log_id = handled.normalized.log_id(),
            entries = handled.normalized.entries.len(),
            tag_assignments = handled.tag_assignments,
            "batch handled"
        );
    }

    if let Some(log) = store.find_log("demo-tx-1").await? {
        println!("{}", serde_json::to_string_pretty(&log)?);
        for entry in store.entries_for_log(log.id.as_deref().unwrap_or_default()).await? {
            println!("{} {:>5} {}", entry.timestamp, entry.logging_level.as_str(), entry.message.unwrap_or_default());
        }
    }
    Ok(())
}
