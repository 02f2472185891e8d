use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{GovernorLimits, LogEvent, LoggingLevel};

/// Classification of the organization a log was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentType {
    Production,
    Sandbox,
    #[serde(rename = "Scratch Org")]
    ScratchOrg,
}

impl EnvironmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentType::Production => "Production",
            EnvironmentType::Sandbox => "Sandbox",
            EnvironmentType::ScratchOrg => "Scratch Org",
        }
    }
}

/// Session and environment fields copied from the first event of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub api_version: Option<String>,
    pub locale: Option<String>,
    pub login_application: Option<String>,
    pub login_browser: Option<String>,
    pub login_domain: Option<String>,
    pub login_history_id: Option<String>,
    pub login_platform: Option<String>,
    pub login_type: Option<String>,
    pub logout_url: Option<String>,
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
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationFacts {
    pub id: String,
    pub name: String,
    pub instance_name: Option<String>,
    pub organization_type: Option<String>,
    pub domain_url: Option<String>,
    pub namespace_prefix: Option<String>,
    pub environment_type: EnvironmentType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkFacts {
    pub name: Option<String>,
    pub login_url: Option<String>,
    pub logout_url: Option<String>,
    pub self_registration_url: Option<String>,
    pub url_path_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFacts {
    pub username: String,
    pub profile_name: Option<String>,
    pub user_license_id: Option<String>,
    pub user_license_name: Option<String>,
    pub user_license_definition_key: Option<String>,
    /// Absent when the user has no role.
    pub user_role_name: Option<String>,
}

/// Parent record summarizing one transaction, unique by `transaction_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Storage id, set once the log has been upserted.
    pub id: Option<String>,
    pub transaction_id: String,
    /// Foreign key to another log's `transaction_id`; resolved by storage
    /// on demand, never loaded here.
    pub parent_transaction_id: Option<String>,
    pub logged_by_id: String,
    pub logged_by_username: Option<String>,
    pub network_id: Option<String>,
    pub session: SessionContext,
    pub organization: Option<OrganizationFacts>,
    pub network: Option<NetworkFacts>,
    pub user: Option<UserFacts>,
}

impl Log {
    /// Seed a log from the first event of a batch. Enrichment fills in the
    /// organization, network and user facts afterwards.
    pub fn from_event(event: &LogEvent) -> Self {
        Log {
            id: None,
            transaction_id: event.transaction_id.clone(),
            parent_transaction_id: event
                .parent_transaction_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
            logged_by_id: event.logged_by_id.clone(),
            logged_by_username: event.logged_by_username.clone(),
            network_id: event.network_id.clone().filter(|id| !id.trim().is_empty()),
            session: SessionContext {
                api_version: event.api_version.clone(),
                locale: event.locale.clone(),
                login_application: event.login_application.clone(),
                login_browser: event.login_browser.clone(),
                login_domain: event.login_domain.clone(),
                login_history_id: event.login_history_id.clone(),
                login_platform: event.login_platform.clone(),
                login_type: event.login_type.clone(),
                logout_url: event.logout_url.clone(),
                profile_id: event.profile_id.clone(),
                session_id: event.session_id.clone(),
                session_security_level: event.session_security_level.clone(),
                session_type: event.session_type.clone(),
                source_ip: event.source_ip.clone(),
                system_mode: event.system_mode.clone(),
                theme_displayed: event.theme_displayed.clone(),
                timezone_id: event.timezone_id.clone(),
                timezone_name: event.timezone_name.clone(),
                user_logging_level: event.user_logging_level,
                user_role_id: event.user_role_id.clone(),
                user_type: event.user_type.clone(),
            },
            organization: None,
            network: None,
            user: None,
        }
    }
}

/// One normalized record per event, owned by a [`Log`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Option<String>,
    pub log_id: String,
    pub transaction_entry_number: u32,
    pub logging_level: LoggingLevel,
    pub logging_level_ordinal: u8,
    pub message: Option<String>,
    pub message_truncated: bool,
    pub timestamp: DateTime<Utc>,
    pub origin_type: Option<String>,
    pub origin_location: Option<String>,
    pub stack_trace: Option<String>,
    pub exception_type: Option<String>,
    pub exception_message: Option<String>,
    pub exception_stack_trace: Option<String>,
    pub record_id: Option<String>,
    pub record_json: Option<String>,
    pub trigger_is_executing: bool,
    pub trigger_operation_type: Option<String>,
    pub trigger_sobject_type: Option<String>,
    pub topics: Option<String>,
    pub limits: GovernorLimits,
}

/// Named label, globally unique by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Record a tag can be attached to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaggedRecord {
    Log(String),
    LogEntry(String),
}

impl TaggedRecord {
    pub fn id(&self) -> &str {
        match self {
            TaggedRecord::Log(id) | TaggedRecord::LogEntry(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagAssignment {
    pub record: TaggedRecord,
    pub tag_id: String,
}
