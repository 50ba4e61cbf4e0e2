//! Timers
//!
//! The poller only ever waits through this trait, so the browser build can
//! use the host's timer queue and tests can skip the wait entirely.

use std::time::Duration;

use async_trait::async_trait;

/// Source of delays
#[async_trait(?Send)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-backed timer for native hosts
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
