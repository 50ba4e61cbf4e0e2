//! Widget Lifecycle
//!
//! One mounted embed: its reference, its payload and the live
//! `Unresolved → Resolved` state shared by the poller, the iframe load
//! signal and external completion notices.
//!
//! ```text
//!            build                 poll: terminal
//!   marker ─────────▶ Unresolved ───────────────────▶ Resolved
//!                        │  ▲      notify_external_        │
//!          iframe load   │  │      completion              ├─ cookie deleted
//!          (guard arms)  └──┘ poll: not terminal           ├─ guard disarmed
//!                             (cookie refreshed)           ├─ redirect (optional)
//!                                                          └─ polling stops
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::WidgetConfig;
use crate::cookie::CookieStore;
use crate::error::Result;
use crate::guard::{GuardState, NavigationGuard, PageHost};
use crate::ledger::RefLedger;
use crate::mount::{IframeSpec, MarkerElement};
use crate::payload::{EncodedPayload, PayloadEncoder};
use crate::poller::PollOutcome;
use crate::reference::TransactionReference;
use crate::settings::EmbedSettings;

/// Page-unique widget identifier
pub type InstanceId = u32;

/// Status lifecycle of a widget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetPhase {
    Unresolved,
    Resolved,
}

/// Effect of one poll outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    None,
    /// Still unresolved, cookie window extended
    Refreshed,
    /// Terminal state entered
    Resolved,
}

/// Collaborators shared by every widget on a page
#[derive(Clone)]
pub struct WidgetHost {
    pub settings: EmbedSettings,
    pub cookies: Rc<dyn CookieStore>,
    pub page: Rc<dyn PageHost>,
}

struct LiveState {
    phase: WidgetPhase,
    ledger: RefLedger,
    guard: NavigationGuard,
    in_flight: bool,
}

struct WidgetInner {
    id: InstanceId,
    config: WidgetConfig,
    reference: TransactionReference,
    cookie_ref_at_start: Option<String>,
    payload: EncodedPayload,
    page: Rc<dyn PageHost>,
    state: RefCell<LiveState>,
}

/// Handle to a mounted widget (cheap to clone)
#[derive(Clone)]
pub struct Widget {
    inner: Rc<WidgetInner>,
}

impl Widget {
    /// Build and mount a widget on `marker`.
    ///
    /// Configuration errors abort before anything is written, leaving the
    /// marker untouched.
    pub fn build(
        id: InstanceId,
        config: WidgetConfig,
        host: &WidgetHost,
        marker: &dyn MarkerElement,
    ) -> Result<Self> {
        PayloadEncoder::validate(&config)?;

        let mut ledger = RefLedger::new(host.cookies.clone(), config.variant.cookie_name());
        let previous = ledger.read_previous();
        let ensured = ledger.ensure_reference(previous);
        let payload = PayloadEncoder::encode(
            &config,
            &ensured.reference,
            ensured.cookie_ref_at_start.as_deref(),
        )?;

        let guard = NavigationGuard::new(host.page.unload_prompt(), config.no_warning);
        let iframe = IframeSpec::new(&host.settings.embed_base_url, &payload);

        let widget = Self {
            inner: Rc::new(WidgetInner {
                id,
                config,
                reference: ensured.reference,
                cookie_ref_at_start: ensured.cookie_ref_at_start,
                payload,
                page: host.page.clone(),
                state: RefCell::new(LiveState {
                    phase: WidgetPhase::Unresolved,
                    ledger,
                    guard,
                    in_flight: false,
                }),
            }),
        };

        let weak = Rc::downgrade(&widget.inner);
        marker.mount(
            &iframe,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Self { inner }.on_iframe_loaded();
                }
            }),
        )?;

        if let Err(e) = marker.set_reference(widget.reference().as_str()) {
            tracing::warn!(instance = id, error = %e, "Could not record reference on marker");
        }

        tracing::info!(
            instance = id,
            variant = %widget.config().variant,
            reference = %widget.reference(),
            resumed = widget.inner.cookie_ref_at_start.is_some(),
            "Widget mounted"
        );

        Ok(widget)
    }

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    pub fn reference(&self) -> &TransactionReference {
        &self.inner.reference
    }

    /// Persisted reference found when the widget was built
    pub fn cookie_ref_at_start(&self) -> Option<&str> {
        self.inner.cookie_ref_at_start.as_deref()
    }

    pub fn payload(&self) -> &EncodedPayload {
        &self.inner.payload
    }

    pub fn phase(&self) -> WidgetPhase {
        self.inner.state.borrow().phase
    }

    pub fn is_resolved(&self) -> bool {
        self.phase() == WidgetPhase::Resolved
    }

    pub fn guard_state(&self) -> GuardState {
        self.inner.state.borrow().guard.state()
    }

    /// Iframe reported its first load: arm the leave-page warning
    pub fn on_iframe_loaded(&self) {
        let mut state = self.inner.state.borrow_mut();
        if state.phase == WidgetPhase::Unresolved {
            state.guard.arm();
        }
    }

    /// Apply one poll outcome to the state machine
    pub fn apply(&self, outcome: PollOutcome) -> Transition {
        if self.is_resolved() {
            return Transition::None;
        }
        match outcome {
            PollOutcome::Success { terminal: true } => {
                if self.resolve() {
                    Transition::Resolved
                } else {
                    Transition::None
                }
            }
            PollOutcome::Success { terminal: false } => {
                let refreshed = self
                    .inner
                    .state
                    .borrow_mut()
                    .ledger
                    .refresh(&self.inner.reference);
                if refreshed {
                    Transition::Refreshed
                } else {
                    Transition::None
                }
            }
            PollOutcome::Transient(e) => {
                tracing::debug!(instance = self.id(), error = %e, "Status check failed, retrying next tick");
                Transition::None
            }
        }
    }

    /// Enter `Resolved`. Returns `false` if the widget already was.
    pub fn resolve(&self) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.phase == WidgetPhase::Resolved {
                return false;
            }
            state.phase = WidgetPhase::Resolved;
            state.ledger.clear();
            state.guard.disarm();
        }

        tracing::info!(instance = self.id(), reference = %self.reference(), "Transaction complete");

        if let Some(url) = &self.inner.config.redirect_url {
            tracing::info!(instance = self.id(), url = %url, "Redirecting");
            if let Err(e) = self.inner.page.navigate(url) {
                tracing::warn!(instance = self.id(), error = %e, "Redirect failed");
            }
        }
        true
    }

    /// Claim the single in-flight slot; `false` when resolved or a request is outstanding
    pub(crate) fn try_begin_poll(&self) -> bool {
        let mut state = self.inner.state.borrow_mut();
        if state.phase == WidgetPhase::Resolved || state.in_flight {
            return false;
        }
        state.in_flight = true;
        true
    }

    /// Release the in-flight slot and apply the outcome
    pub(crate) fn finish_poll(&self, outcome: PollOutcome) -> Transition {
        self.inner.state.borrow_mut().in_flight = false;
        self.apply(outcome)
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.inner.id)
            .field("variant", &self.inner.config.variant)
            .field("reference", &self.inner.reference)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
