//! Application State

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

/// References whose transaction has completed
#[derive(Debug, Default)]
pub struct CompletionLedger {
    completed: RwLock<HashSet<String>>,
}

impl CompletionLedger {
    pub async fn is_complete(&self, reference: &str) -> bool {
        self.completed.read().await.contains(reference)
    }

    /// Mark a reference complete; returns `false` if it already was
    pub async fn complete(&self, reference: &str) -> bool {
        self.completed.write().await.insert(reference.to_string())
    }
}

/// Shared application state
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Completion state served by the status endpoint
    pub ledger: Arc<CompletionLedger>,
}
