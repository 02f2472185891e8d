use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::directory::{Directory, OrganizationRecord};
use crate::error::NormalizeError;
use crate::record::{EnvironmentType, Log, OrganizationFacts};

/// Strict priority order: scratch org, then sandbox, then production.
pub fn classify_environment(
    is_sandbox: bool,
    trial_expiration_date: Option<DateTime<Utc>>,
) -> EnvironmentType {
    match (is_sandbox, trial_expiration_date) {
        (true, Some(_)) => EnvironmentType::ScratchOrg,
        (true, None) => EnvironmentType::Sandbox,
        (false, _) => EnvironmentType::Production,
    }
}

/// Fills in organization facts. The organization row is fetched on first
/// use and reused for the lifetime of the enricher.
pub struct OrganizationEnricher {
    directory: Arc<dyn Directory>,
    cached: OnceCell<OrganizationRecord>,
}

impl OrganizationEnricher {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            cached: OnceCell::new(),
        }
    }

    pub async fn enrich(&self, log: &mut Log) -> Result<(), NormalizeError> {
        let org = self
            .cached
            .get_or_try_init(|| async {
                debug!("loading organization record");
                self.directory
                    .organization()
                    .await
                    .map_err(NormalizeError::OrganizationLookup)
            })
            .await?;

        log.organization = Some(OrganizationFacts {
            id: org.id.clone(),
            name: org.name.clone(),
            instance_name: org.instance_name.clone(),
            organization_type: org.organization_type.clone(),
            domain_url: org.domain_url.clone(),
            namespace_prefix: org.namespace_prefix.clone(),
            environment_type: classify_environment(org.is_sandbox, org.trial_expiration_date),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogEvent, LoggingLevel};
    use crate::memory::MemoryDirectory;
    use std::sync::atomic::Ordering;

    #[test]
    fn classification_follows_priority_order() {
        let expiry = Some(Utc::now());
        assert_eq!(classify_environment(true, expiry), EnvironmentType::ScratchOrg);
        assert_eq!(classify_environment(true, None), EnvironmentType::Sandbox);
        assert_eq!(classify_environment(false, expiry), EnvironmentType::Production);
        assert_eq!(classify_environment(false, None), EnvironmentType::Production);
    }

    #[tokio::test]
    async fn organization_is_fetched_once_per_enricher() {
        let directory = Arc::new(MemoryDirectory::default());
        let enricher = OrganizationEnricher::new(directory.clone());
        let event = LogEvent::new("tx", "005A", LoggingLevel::Info, Utc::now());

        for _ in 0..3 {
            let mut log = Log::from_event(&event);
            enricher.enrich(&mut log).await.unwrap();
            assert_eq!(log.organization.unwrap().id, directory.organization.id);
        }

        assert_eq!(directory.organization_lookups.load(Ordering::Relaxed), 1);
    }
}
