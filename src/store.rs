use async_trait::async_trait;

use crate::error::BoxError;
use crate::record::{Log, LogEntry, Tag, TagAssignment, TaggedRecord};

/// Durable storage for normalized logs, entries and tags.
///
/// Every write method is its own commit boundary: a failure in a later
/// call never rolls back an earlier one. Batch methods must issue a
/// bounded number of round-trips regardless of input size.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Insert the log, or update the existing one with the same
    /// `transaction_id`.
    ///
    /// **Returns**
    /// - the storage id of the inserted or updated log.
    ///
    /// Implementations must serialize concurrent upserts for one
    /// transaction id through a unique key, never creating two logs.
    async fn upsert_log(&self, log: &Log) -> Result<String, BoxError>;

    /// Insert all entries in one batch.
    ///
    /// **Returns**
    /// - the generated ids, in the same order as `entries`.
    async fn insert_entries(&self, entries: &[LogEntry]) -> Result<Vec<String>, BoxError>;

    /// Fetch the existing tags whose names are in `names`.
    ///
    /// An empty `names` slice matches nothing.
    async fn find_tags(&self, names: &[String]) -> Result<Vec<Tag>, BoxError>;

    /// Create a tag for each name in one batch.
    async fn insert_tags(&self, names: &[String]) -> Result<Vec<Tag>, BoxError>;

    /// Insert all assignments in one batch.
    async fn insert_tag_assignments(&self, assignments: &[TagAssignment]) -> Result<(), BoxError>;

    /// Look up a log by transaction id.
    async fn find_log(&self, transaction_id: &str) -> Result<Option<Log>, BoxError>;

    /// Entries of a log, oldest first.
    async fn entries_for_log(&self, log_id: &str) -> Result<Vec<LogEntry>, BoxError>;

    /// Tag assignments attached to one record.
    async fn tag_assignments_for(&self, record: &TaggedRecord) -> Result<Vec<TagAssignment>, BoxError>;
}
