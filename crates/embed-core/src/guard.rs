//! Navigation Guard
//!
//! "Confirm before leaving" prompt scoped to one widget instance.

use url::Url;

use crate::error::Result;

/// Message set on the `beforeunload` event (browsers may show their own text)
pub const LEAVE_WARNING: &str =
    "A payment is in progress. Are you sure you want to leave this page?";

/// One registration of a leave-page prompt
pub trait UnloadPrompt {
    /// Register the prompt
    fn install(&self, message: &str) -> Result<()>;

    /// Unregister the prompt
    fn remove(&self) -> Result<()>;
}

/// Page-level services a widget needs besides cookies and HTTP
pub trait PageHost {
    /// A new, not yet installed, leave-page prompt for one instance
    fn unload_prompt(&self) -> Box<dyn UnloadPrompt>;

    /// Navigate the top-level page
    fn navigate(&self, url: &Url) -> Result<()>;
}

/// Guard lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    /// Widget built, payment surface not loaded yet
    Pending,
    /// Prompt registered
    Armed,
    /// Prompt gone for good
    Disarmed,
}

/// Navigation guard for one widget instance
pub struct NavigationGuard {
    state: GuardState,
    prompt: Box<dyn UnloadPrompt>,
}

impl NavigationGuard {
    /// `suppressed` (the no-warning flag) starts the guard disarmed for its whole lifetime
    pub fn new(prompt: Box<dyn UnloadPrompt>, suppressed: bool) -> Self {
        let state = if suppressed {
            GuardState::Disarmed
        } else {
            GuardState::Pending
        };
        Self { state, prompt }
    }

    pub const fn state(&self) -> GuardState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == GuardState::Armed
    }

    /// Register the prompt. Only a pending guard arms; returns whether it did.
    pub fn arm(&mut self) -> bool {
        if self.state != GuardState::Pending {
            return false;
        }
        match self.prompt.install(LEAVE_WARNING) {
            Ok(()) => {
                self.state = GuardState::Armed;
                tracing::debug!("Navigation guard armed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not register leave-page prompt");
                false
            }
        }
    }

    /// Remove the prompt. Returns whether the state changed.
    pub fn disarm(&mut self) -> bool {
        match self.state {
            GuardState::Disarmed => false,
            GuardState::Pending => {
                self.state = GuardState::Disarmed;
                true
            }
            GuardState::Armed => {
                if let Err(e) = self.prompt.remove() {
                    tracing::debug!(error = %e, "Leave-page prompt removal failed");
                }
                self.state = GuardState::Disarmed;
                tracing::debug!("Navigation guard disarmed");
                true
            }
        }
    }
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}
