/// Error shape returned by storage and directory collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures while turning a batch of events into a log and its entries.
///
/// Any of these aborts the pass before (or instead of) writing entries.
#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    #[error("organization lookup failed: {0}")]
    OrganizationLookup(#[source] BoxError),

    #[error("network lookup failed for {network_id}: {source}")]
    NetworkLookup {
        network_id: String,
        #[source]
        source: BoxError,
    },

    #[error("user lookup failed for {user_id}: {source}")]
    UserLookup {
        user_id: String,
        #[source]
        source: BoxError,
    },

    #[error("logged-by user {user_id} could not be found")]
    UserNotFound { user_id: String },

    #[error("failed to persist log for transaction {transaction_id}: {source}")]
    LogPersistence {
        transaction_id: String,
        #[source]
        source: BoxError,
    },

    #[error("log for transaction {transaction_id} was persisted without an id")]
    MissingLogId { transaction_id: String },

    #[error("failed to insert log entries for transaction {transaction_id}: {source}")]
    EntryPersistence {
        transaction_id: String,
        #[source]
        source: BoxError,
    },

    #[error("storage returned {actual} entry ids for {expected} entries")]
    EntryIdMismatch { expected: usize, actual: usize },
}

/// Failures while creating tags and tag assignments.
///
/// Logs and entries written before the failure stay committed.
#[derive(thiserror::Error, Debug)]
pub enum TopicError {
    #[error("tag lookup failed: {0}")]
    Lookup(#[source] BoxError),

    #[error("failed to insert tags: {0}")]
    TagPersistence(#[source] BoxError),

    #[error("tag {name:?} has no id after insert")]
    UnresolvedTag { name: String },

    #[error("failed to insert tag assignments: {0}")]
    AssignmentPersistence(#[source] BoxError),
}

/// Error returned by [`crate::handler::LogEventHandler::handle`].
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Topics(#[from] TopicError),
}
