use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::error;

use crate::config::NormalizerConfig;
use crate::directory::{Directory, NetworkCapability};
use crate::error::HandlerError;
use crate::event::EventBatch;
use crate::normalizer::{LogNormalizer, NormalizedBatch};
use crate::store::LogStore;
use crate::topics::TopicAssigner;

/// Outcome of a handled delivery.
#[derive(Debug, Clone)]
pub struct HandledBatch {
    pub normalized: NormalizedBatch,
    pub tag_assignments: usize,
}

/// Entry point invoked once per event delivery: normalizes the batch,
/// then assigns tags to the persisted entries.
///
/// Errors are returned to the caller, which owns retry and dead-lettering.
pub struct LogEventHandler {
    normalizer: LogNormalizer,
    topics: TopicAssigner,
    /// Batches that produced a log.
    pub handled_batches: AtomicU64,
    /// Batches ignored as empty, foreign or mixed.
    pub skipped_batches: AtomicU64,
    /// Batches that returned an error.
    pub failed_batches: AtomicU64,
}

impl LogEventHandler {
    pub fn new(
        store: Arc<dyn LogStore>,
        directory: Arc<dyn Directory>,
        capability: Arc<dyn NetworkCapability>,
        config: &NormalizerConfig,
    ) -> Self {
        Self {
            normalizer: LogNormalizer::new(Arc::clone(&store), directory, capability, config),
            topics: TopicAssigner::new(store),
            handled_batches: AtomicU64::new(0),
            skipped_batches: AtomicU64::new(0),
            failed_batches: AtomicU64::new(0),
        }
    }

    pub async fn handle(&self, batch: &EventBatch) -> Result<Option<HandledBatch>, HandlerError> {
        match self.run(batch).await {
            Ok(Some(handled)) => {
                self.handled_batches.fetch_add(1, Ordering::Relaxed);
                Ok(Some(handled))
            }
            Ok(None) => {
                self.skipped_batches.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => {
                self.failed_batches.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, events = batch.events.len(), "failed to handle log event batch");
                Err(e)
            }
        }
    }

    async fn run(&self, batch: &EventBatch) -> Result<Option<HandledBatch>, HandlerError> {
        let Some(normalized) = self.normalizer.normalize(batch).await? else {
            return Ok(None);
        };
        let tag_assignments = self
            .topics
            .assign_tags(&normalized.entry_topics, normalized.log_id())
            .await?;
        Ok(Some(HandledBatch {
            normalized,
            tag_assignments,
        }))
    }
}
