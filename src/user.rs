use std::sync::Arc;

use crate::directory::Directory;
use crate::error::NormalizeError;
use crate::record::{Log, UserFacts};

/// Fills in the acting user's profile, license and role.
///
/// A log without an owner is meaningless, so a missing user fails the
/// whole pass.
pub struct UserContextEnricher {
    directory: Arc<dyn Directory>,
}

impl UserContextEnricher {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    pub async fn enrich(&self, log: &mut Log) -> Result<(), NormalizeError> {
        let user_id = log.logged_by_id.clone();
        let user = self
            .directory
            .find_user(&user_id)
            .await
            .map_err(|source| NormalizeError::UserLookup {
                user_id: user_id.clone(),
                source,
            })?
            .ok_or(NormalizeError::UserNotFound { user_id })?;

        if log.logged_by_username.is_none() {
            log.logged_by_username = Some(user.username.clone());
        }
        log.user = Some(UserFacts {
            username: user.username,
            profile_name: user.profile_name,
            user_license_id: user.user_license_id,
            user_license_name: user.user_license_name,
            user_license_definition_key: user.user_license_definition_key,
            user_role_name: user.user_role_name,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::UserRecord;
    use crate::event::{LogEvent, LoggingLevel};
    use crate::memory::MemoryDirectory;
    use chrono::Utc;

    fn integration_user(role: Option<&str>) -> UserRecord {
        UserRecord {
            id: "005000000000001".to_string(),
            username: "integration@example.com".to_string(),
            profile_name: Some("System Administrator".to_string()),
            user_license_id: Some("100000000000001".to_string()),
            user_license_name: Some("Salesforce".to_string()),
            user_license_definition_key: Some("SFDC".to_string()),
            user_role_name: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn copies_profile_license_and_role() {
        let directory = Arc::new(MemoryDirectory::default().with_user(integration_user(Some("CEO"))));
        let enricher = UserContextEnricher::new(directory);
        let mut log = Log::from_event(&LogEvent::new("tx", "005000000000001", LoggingLevel::Info, Utc::now()));

        enricher.enrich(&mut log).await.unwrap();

        let user = log.user.unwrap();
        assert_eq!(user.profile_name.as_deref(), Some("System Administrator"));
        assert_eq!(user.user_license_definition_key.as_deref(), Some("SFDC"));
        assert_eq!(user.user_role_name.as_deref(), Some("CEO"));
        assert_eq!(log.logged_by_username.as_deref(), Some("integration@example.com"));
    }

    #[tokio::test]
    async fn missing_role_leaves_role_name_absent() {
        let directory = Arc::new(MemoryDirectory::default().with_user(integration_user(None)));
        let enricher = UserContextEnricher::new(directory);
        let mut log = Log::from_event(&LogEvent::new("tx", "005000000000001", LoggingLevel::Info, Utc::now()));

        enricher.enrich(&mut log).await.unwrap();

        assert_eq!(log.user.unwrap().user_role_name, None);
    }

    #[tokio::test]
    async fn unknown_user_is_fatal() {
        let enricher = UserContextEnricher::new(Arc::new(MemoryDirectory::default()));
        let mut log = Log::from_event(&LogEvent::new("tx", "005ghost", LoggingLevel::Info, Utc::now()));

        let err = enricher.enrich(&mut log).await.unwrap_err();

        assert!(matches!(err, NormalizeError::UserNotFound { ref user_id } if user_id == "005ghost"));
        assert!(log.user.is_none());
    }
}
