//! Status Poller
//!
//! Periodically asks the status endpoint whether the widget's transaction
//! reached its terminal state. Failures are never surfaced to the user:
//! they become [`PollOutcome::Transient`] and the next tick simply retries.
//! There is no backoff and no retry cap; only resolution stops the loop.

use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{EmbedError, Result};
use crate::status::StatusClient;
use crate::timer::Timer;
use crate::widget::{Transition, Widget};

/// Result of one status check
#[derive(Debug)]
pub enum PollOutcome {
    /// Endpoint answered with a usable body
    Success { terminal: bool },
    /// Network, HTTP or body problem; try again next tick
    Transient(EmbedError),
}

impl PollOutcome {
    /// Interpret a status response; only a JSON boolean in `terminal_field` counts
    pub fn from_response(response: Result<Value>, terminal_field: &str) -> Self {
        let body = match response {
            Ok(body) => body,
            Err(e) => return Self::Transient(e),
        };
        match body.get(terminal_field) {
            Some(Value::Bool(terminal)) => Self::Success {
                terminal: *terminal,
            },
            Some(other) => Self::Transient(EmbedError::Parse(format!(
                "{terminal_field} is not a boolean: {other}"
            ))),
            None => Self::Transient(EmbedError::Parse(format!(
                "{terminal_field} missing from status body"
            ))),
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { terminal: true })
    }
}

/// Polling loop for one widget
pub struct StatusPoller {
    widget: Widget,
    client: Rc<dyn StatusClient>,
    timer: Rc<dyn Timer>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(
        widget: Widget,
        client: Rc<dyn StatusClient>,
        timer: Rc<dyn Timer>,
        interval: Duration,
    ) -> Self {
        Self {
            widget,
            client,
            timer,
            interval,
        }
    }

    /// One status check. Skipped while another request is outstanding.
    pub async fn tick(&self) -> Transition {
        if !self.widget.try_begin_poll() {
            return Transition::None;
        }

        let config = self.widget.config();
        let response = self
            .client
            .fetch_status(self.widget.reference(), &config.auth_token())
            .await;
        let outcome = PollOutcome::from_response(response, config.variant.terminal_field());

        self.widget.finish_poll(outcome)
    }

    /// Poll every interval until the widget is resolved; returns the number of requests made
    pub async fn run(self) -> u32 {
        tracing::debug!(
            instance = self.widget.id(),
            interval_secs = self.interval.as_secs(),
            "Status polling started"
        );

        let mut requests = 0;
        while !self.widget.is_resolved() {
            self.timer.sleep(self.interval).await;
            if self.widget.is_resolved() {
                break;
            }
            self.tick().await;
            requests += 1;
        }

        tracing::debug!(instance = self.widget.id(), requests, "Status polling stopped");
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_terminal() {
        let outcome = PollOutcome::from_response(Ok(json!({"isPaid": true})), "isPaid");
        assert!(outcome.is_terminal());
    }

    #[test]
    fn test_outcome_not_terminal() {
        let outcome = PollOutcome::from_response(Ok(json!({"isPaid": false})), "isPaid");
        assert!(matches!(outcome, PollOutcome::Success { terminal: false }));
    }

    #[test]
    fn test_outcome_wrong_field_for_variant() {
        let outcome = PollOutcome::from_response(Ok(json!({"isPaid": true})), "isAccepted");
        assert!(matches!(outcome, PollOutcome::Transient(EmbedError::Parse(_))));
    }

    #[test]
    fn test_outcome_non_boolean_is_transient() {
        for body in [json!({"isPaid": "true"}), json!({"isPaid": 1}), json!([true])] {
            let outcome = PollOutcome::from_response(Ok(body), "isPaid");
            assert!(matches!(outcome, PollOutcome::Transient(_)));
        }
    }

    #[test]
    fn test_outcome_error_is_transient() {
        let outcome = PollOutcome::from_response(Err(EmbedError::Status(500)), "isPaid");
        assert!(matches!(outcome, PollOutcome::Transient(EmbedError::Status(500))));
    }
}
