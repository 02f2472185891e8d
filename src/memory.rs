use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::directory::{Directory, NetworkRecord, OrganizationRecord, UserRecord};
use crate::error::BoxError;
use crate::record::{Log, LogEntry, Tag, TagAssignment, TaggedRecord};
use crate::store::LogStore;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> BoxError {
    "memory store lock poisoned".into()
}

/// In-process [`LogStore`] keeping everything in maps behind mutexes.
///
/// Useful for tests and local runs. Every write method bumps a counter so
/// callers can assert how many round-trips a pass made, and individual
/// writes can be made to fail.
#[derive(Default)]
pub struct MemoryStore {
    logs: Mutex<HashMap<String, Log>>,
    entries: Mutex<Vec<LogEntry>>,
    tags: Mutex<BTreeMap<String, Tag>>,
    assignments: Mutex<Vec<TagAssignment>>,

    pub log_upserts: AtomicU64,
    pub entry_inserts: AtomicU64,
    pub tag_lookups: AtomicU64,
    pub tag_inserts: AtomicU64,
    pub assignment_inserts: AtomicU64,

    fail_log_upserts: AtomicBool,
    fail_tag_assignments: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `upsert_log` fail.
    pub fn fail_log_upserts(&self, fail: bool) {
        self.fail_log_upserts.store(fail, Ordering::Relaxed);
    }

    /// Make every subsequent `insert_tag_assignments` fail.
    pub fn fail_tag_assignments(&self, fail: bool) {
        self.fail_tag_assignments.store(fail, Ordering::Relaxed);
    }

    pub fn log_count(&self) -> usize {
        self.logs.lock().map(|logs| logs.len()).unwrap_or_default()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags
            .lock()
            .map(|tags| tags.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn assignments(&self) -> Vec<TagAssignment> {
        self.assignments
            .lock()
            .map(|assignments| assignments.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn upsert_log(&self, log: &Log) -> Result<String, BoxError> {
        self.log_upserts.fetch_add(1, Ordering::Relaxed);
        if self.fail_log_upserts.load(Ordering::Relaxed) {
            return Err("log upsert rejected".into());
        }

        let mut logs = self.logs.lock().map_err(poisoned)?;
        let id = logs
            .get(&log.transaction_id)
            .and_then(|existing| existing.id.clone())
            .unwrap_or_else(new_id);
        let mut stored = log.clone();
        stored.id = Some(id.clone());
        logs.insert(log.transaction_id.clone(), stored);
        Ok(id)
    }

    async fn insert_entries(&self, entries: &[LogEntry]) -> Result<Vec<String>, BoxError> {
        self.entry_inserts.fetch_add(1, Ordering::Relaxed);
        let mut stored = self.entries.lock().map_err(poisoned)?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = new_id();
            let mut entry = entry.clone();
            entry.id = Some(id.clone());
            stored.push(entry);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn find_tags(&self, names: &[String]) -> Result<Vec<Tag>, BoxError> {
        self.tag_lookups.fetch_add(1, Ordering::Relaxed);
        let tags = self.tags.lock().map_err(poisoned)?;
        Ok(names.iter().filter_map(|name| tags.get(name).cloned()).collect())
    }

    async fn insert_tags(&self, names: &[String]) -> Result<Vec<Tag>, BoxError> {
        self.tag_inserts.fetch_add(1, Ordering::Relaxed);
        let mut tags = self.tags.lock().map_err(poisoned)?;
        // Names created by a concurrent batch resolve to the stored tag.
        let created = names
            .iter()
            .map(|name| {
                tags.entry(name.clone())
                    .or_insert_with(|| Tag {
                        id: new_id(),
                        name: name.clone(),
                    })
                    .clone()
            })
            .collect();
        Ok(created)
    }

    async fn insert_tag_assignments(&self, assignments: &[TagAssignment]) -> Result<(), BoxError> {
        self.assignment_inserts.fetch_add(1, Ordering::Relaxed);
        if self.fail_tag_assignments.load(Ordering::Relaxed) {
            return Err("tag assignment insert rejected".into());
        }
        self.assignments
            .lock()
            .map_err(poisoned)?
            .extend_from_slice(assignments);
        Ok(())
    }

    async fn find_log(&self, transaction_id: &str) -> Result<Option<Log>, BoxError> {
        Ok(self.logs.lock().map_err(poisoned)?.get(transaction_id).cloned())
    }

    async fn entries_for_log(&self, log_id: &str) -> Result<Vec<LogEntry>, BoxError> {
        let mut entries: Vec<LogEntry> = self
            .entries
            .lock()
            .map_err(poisoned)?
            .iter()
            .filter(|entry| entry.log_id == log_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.timestamp, entry.transaction_entry_number));
        Ok(entries)
    }

    async fn tag_assignments_for(&self, record: &TaggedRecord) -> Result<Vec<TagAssignment>, BoxError> {
        Ok(self
            .assignments
            .lock()
            .map_err(poisoned)?
            .iter()
            .filter(|assignment| &assignment.record == record)
            .cloned()
            .collect())
    }
}

/// In-process [`Directory`] with a fixed organization and registered
/// networks and users.
pub struct MemoryDirectory {
    pub organization: OrganizationRecord,
    networks: HashMap<String, NetworkRecord>,
    users: HashMap<String, UserRecord>,

    pub organization_lookups: AtomicU64,
    pub network_lookups: AtomicU64,
    pub user_lookups: AtomicU64,
}

impl MemoryDirectory {
    pub fn new(organization: OrganizationRecord) -> Self {
        Self {
            organization,
            networks: HashMap::new(),
            users: HashMap::new(),
            organization_lookups: AtomicU64::new(0),
            network_lookups: AtomicU64::new(0),
            user_lookups: AtomicU64::new(0),
        }
    }

    pub fn with_network(mut self, network: NetworkRecord) -> Self {
        self.networks.insert(network.id.clone(), network);
        self
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new(OrganizationRecord {
            id: "00D000000000001".to_string(),
            name: "Local Org".to_string(),
            instance_name: Some("LOCAL1".to_string()),
            organization_type: Some("Developer Edition".to_string()),
            domain_url: Some("https://local.my.example.com".to_string()),
            namespace_prefix: None,
            is_sandbox: false,
            trial_expiration_date: None,
        })
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn organization(&self) -> Result<OrganizationRecord, BoxError> {
        self.organization_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.organization.clone())
    }

    async fn find_network(&self, network_id: &str) -> Result<Option<NetworkRecord>, BoxError> {
        self.network_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.networks.get(network_id).cloned())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, BoxError> {
        self.user_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.users.get(user_id).cloned())
    }
}
