use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// The organization the logs belong to. Never changes within a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: String,
    pub name: String,
    pub instance_name: Option<String>,
    pub organization_type: Option<String>,
    pub domain_url: Option<String>,
    pub namespace_prefix: Option<String>,
    pub is_sandbox: bool,
    pub trial_expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    pub name: String,
    pub url_path_prefix: Option<String>,
    pub login_url: Option<String>,
    pub logout_url: Option<String>,
    pub self_registration_url: Option<String>,
}

/// A user joined to its profile, license and (optional) role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub profile_name: Option<String>,
    pub user_license_id: Option<String>,
    pub user_license_name: Option<String>,
    pub user_license_definition_key: Option<String>,
    pub user_role_name: Option<String>,
}

/// Read-only lookups used to enrich a log.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn organization(&self) -> Result<OrganizationRecord, BoxError>;

    /// `Ok(None)` when no network has this id.
    async fn find_network(&self, network_id: &str) -> Result<Option<NetworkRecord>, BoxError>;

    /// `Ok(None)` when the user was deleted or is not visible.
    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, BoxError>;
}

/// Whether the deployment has the network (community) feature at all.
pub trait NetworkCapability: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Capability with a fixed answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCapability(pub bool);

impl NetworkCapability for StaticCapability {
    fn is_available(&self) -> bool {
        self.0
    }
}
