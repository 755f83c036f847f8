//! At-most-once completions
//!
//! A completion is a single conditional insert on the (user, item) key. There
//! is no existence check beforehand: two racing requests both reach the store
//! and the unique key lets exactly one of them through.

use std::sync::Arc;

use tracing::debug;

use super::error::ProgressResult;
use super::models::{CompletionOutcome, CompletionRecord};
use super::store::ProgressStore;

/// Guards lesson and daily-challenge completions against double crediting
#[derive(Clone)]
pub struct CompletionGuard {
    store: Arc<dyn ProgressStore>,
}

impl CompletionGuard {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Record `record` unless its (user, item) key already exists
    pub async fn try_complete(&self, record: &CompletionRecord) -> ProgressResult<CompletionOutcome> {
        let outcome = self.store.insert_completion(record).await?;
        if outcome == CompletionOutcome::AlreadyCompleted {
            debug!(
                user = %record.user_id(),
                source = %record.credit_source().key(),
                "completion already recorded"
            );
        }
        Ok(outcome)
    }
}
