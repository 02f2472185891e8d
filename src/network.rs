use std::sync::Arc;

use tracing::debug;

use crate::directory::{Directory, NetworkCapability};
use crate::error::NormalizeError;
use crate::record::{Log, NetworkFacts};

/// Fills in network facts when the log carries a network id and the
/// deployment has the network feature. Anything missing is a silent no-op.
pub struct NetworkEnricher {
    directory: Arc<dyn Directory>,
    capability: Arc<dyn NetworkCapability>,
    legacy_login_url: bool,
}

impl NetworkEnricher {
    /// `legacy_login_url` reproduces the historical mapping where the
    /// login URL ends up holding the logout URL.
    pub fn new(
        directory: Arc<dyn Directory>,
        capability: Arc<dyn NetworkCapability>,
        legacy_login_url: bool,
    ) -> Self {
        Self {
            directory,
            capability,
            legacy_login_url,
        }
    }

    pub async fn enrich(&self, log: &mut Log) -> Result<(), NormalizeError> {
        let Some(network_id) = log.network_id.clone() else {
            return Ok(());
        };
        if !self.capability.is_available() {
            debug!(%network_id, "network feature unavailable, skipping enrichment");
            return Ok(());
        }

        let network = self
            .directory
            .find_network(&network_id)
            .await
            .map_err(|source| NormalizeError::NetworkLookup {
                network_id: network_id.clone(),
                source,
            })?;
        let Some(network) = network else {
            debug!(%network_id, "no network found for id");
            return Ok(());
        };

        let login_url = if self.legacy_login_url {
            network.logout_url.clone()
        } else {
            network.login_url
        };
        log.network = Some(NetworkFacts {
            name: Some(network.name),
            login_url,
            logout_url: network.logout_url,
            self_registration_url: network.self_registration_url,
            url_path_prefix: network.url_path_prefix,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{NetworkRecord, StaticCapability};
    use crate::event::{LogEvent, LoggingLevel};
    use crate::memory::MemoryDirectory;
    use chrono::Utc;
    use std::sync::atomic::Ordering;

    fn partner_portal() -> NetworkRecord {
        NetworkRecord {
            id: "0DB000000000001".to_string(),
            name: "Partner Portal".to_string(),
            url_path_prefix: Some("partners".to_string()),
            login_url: Some("https://example.my.site.com/partners/login".to_string()),
            logout_url: Some("https://example.my.site.com/partners/logout".to_string()),
            self_registration_url: Some("https://example.my.site.com/partners/register".to_string()),
        }
    }

    fn log_for_network(network_id: Option<&str>) -> Log {
        let mut event = LogEvent::new("tx", "005A", LoggingLevel::Info, Utc::now());
        event.network_id = network_id.map(str::to_string);
        Log::from_event(&event)
    }

    #[tokio::test]
    async fn populates_network_facts() {
        let directory = Arc::new(MemoryDirectory::default().with_network(partner_portal()));
        let enricher = NetworkEnricher::new(directory, Arc::new(StaticCapability(true)), false);
        let mut log = log_for_network(Some("0DB000000000001"));

        enricher.enrich(&mut log).await.unwrap();

        let network = log.network.unwrap();
        assert_eq!(network.name.as_deref(), Some("Partner Portal"));
        assert_eq!(network.url_path_prefix.as_deref(), Some("partners"));
        assert_eq!(
            network.self_registration_url.as_deref(),
            Some("https://example.my.site.com/partners/register")
        );
    }

    #[tokio::test]
    async fn login_url_keeps_the_login_address_by_default() {
        let directory = Arc::new(MemoryDirectory::default().with_network(partner_portal()));
        let enricher = NetworkEnricher::new(directory, Arc::new(StaticCapability(true)), false);
        let mut log = log_for_network(Some("0DB000000000001"));

        enricher.enrich(&mut log).await.unwrap();

        let network = log.network.unwrap();
        assert_eq!(network.login_url.as_deref(), Some("https://example.my.site.com/partners/login"));
        assert_eq!(network.logout_url.as_deref(), Some("https://example.my.site.com/partners/logout"));
    }

    // Known deviation: the legacy mapping stored the logout URL in the login
    // URL field. Kept behind a flag until the intended behavior is confirmed.
    #[tokio::test]
    async fn legacy_mapping_overwrites_login_url_with_logout_url() {
        let directory = Arc::new(MemoryDirectory::default().with_network(partner_portal()));
        let enricher = NetworkEnricher::new(directory, Arc::new(StaticCapability(true)), true);
        let mut log = log_for_network(Some("0DB000000000001"));

        enricher.enrich(&mut log).await.unwrap();

        let network = log.network.unwrap();
        assert_eq!(network.login_url, network.logout_url);
    }

    #[tokio::test]
    async fn skips_lookup_when_feature_is_unavailable() {
        let directory = Arc::new(MemoryDirectory::default().with_network(partner_portal()));
        let enricher =
            NetworkEnricher::new(directory.clone(), Arc::new(StaticCapability(false)), false);
        let mut log = log_for_network(Some("0DB000000000001"));

        enricher.enrich(&mut log).await.unwrap();

        assert!(log.network.is_none());
        assert_eq!(directory.network_lookups.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn unknown_or_missing_network_id_is_not_an_error() {
        let directory = Arc::new(MemoryDirectory::default());
        let enricher =
            NetworkEnricher::new(directory.clone(), Arc::new(StaticCapability(true)), false);

        let mut stale = log_for_network(Some("0DB00000000dead"));
        enricher.enrich(&mut stale).await.unwrap();
        assert!(stale.network.is_none());

        let mut none = log_for_network(None);
        enricher.enrich(&mut none).await.unwrap();
        assert!(none.network.is_none());
        assert_eq!(directory.network_lookups.load(Ordering::Relaxed), 1);
    }
}
