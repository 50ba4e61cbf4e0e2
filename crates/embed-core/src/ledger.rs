//! Reference Ledger
//!
//! Generates the reference for a build and keeps the persisted cookie in
//! step with the status lifecycle. Cookie failures are never surfaced: a
//! cookie that cannot be read is the same as no cookie at all.

use std::rc::Rc;

use chrono::Utc;

use crate::cookie::{CookieSpec, CookieStore};
use crate::reference::TransactionReference;

/// Outcome of [`RefLedger::ensure_reference`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnsuredReference {
    /// Reference for the outgoing payload, always freshly generated
    pub reference: TransactionReference,

    /// Cookie value found at build time, forwarded to the hosted surface
    pub cookie_ref_at_start: Option<String>,
}

/// Reference ledger for one widget instance
pub struct RefLedger {
    store: Rc<dyn CookieStore>,
    cookie_name: &'static str,
    cookie_ref: Option<String>,
}

impl RefLedger {
    pub fn new(store: Rc<dyn CookieStore>, cookie_name: &'static str) -> Self {
        Self {
            store,
            cookie_name,
            cookie_ref: None,
        }
    }

    /// Read the persisted reference, if any
    pub fn read_previous(&self) -> Option<String> {
        match self.store.get(self.cookie_name) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(cookie = self.cookie_name, error = %e, "Cookie read failed");
                None
            }
        }
    }

    /// Produce the reference for this build.
    ///
    /// A new reference is generated even when a cookie exists; the old value
    /// only travels to the hosted surface as `cookie_ref_at_start` so it can
    /// reconcile server-side history. The cookie is only written when absent.
    pub fn ensure_reference(&mut self, previous: Option<String>) -> EnsuredReference {
        let reference = match previous.as_deref() {
            Some(prev) => TransactionReference::generate_distinct(prev),
            None => {
                let reference = TransactionReference::generate();
                self.write(&reference);
                reference
            }
        };

        tracing::debug!(
            cookie = self.cookie_name,
            reference = %reference,
            previous = ?previous,
            "Reference ensured"
        );

        self.cookie_ref.clone_from(&previous);
        EnsuredReference {
            reference,
            cookie_ref_at_start: previous,
        }
    }

    /// Extend the cookie window after an unresolved poll.
    ///
    /// Only instances that started from a persisted cookie refresh it; the
    /// cookie then points at the current reference.
    pub fn refresh(&mut self, current: &TransactionReference) -> bool {
        if self.cookie_ref.is_none() {
            return false;
        }
        self.remove();
        self.write(current);
        self.cookie_ref = Some(current.as_str().to_string());
        true
    }

    /// Forget the persisted reference (terminal state reached)
    pub fn clear(&mut self) {
        self.remove();
        self.cookie_ref = None;
    }

    /// Cookie reference currently tracked by this instance
    pub fn cookie_ref(&self) -> Option<&str> {
        self.cookie_ref.as_deref()
    }

    fn write(&self, reference: &TransactionReference) {
        let cookie = CookieSpec::with_ttl(self.cookie_name, reference.as_str(), Utc::now());
        if let Err(e) = self.store.set(&cookie) {
            tracing::debug!(cookie = self.cookie_name, error = %e, "Cookie write failed");
        }
    }

    fn remove(&self) {
        if let Err(e) = self.store.delete(self.cookie_name) {
            tracing::debug!(cookie = self.cookie_name, error = %e, "Cookie delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::MemoryCookieStore;
    use crate::error::{EmbedError, Result};
    use chrono::Duration;

    const COOKIE: &str = "posfra_ref";

    /// Store whose every operation fails
    struct BrokenStore;

    impl CookieStore for BrokenStore {
        fn get(&self, _name: &str) -> Result<Option<String>> {
            Err(EmbedError::Host("cookies disabled".into()))
        }
        fn set(&self, _cookie: &CookieSpec) -> Result<()> {
            Err(EmbedError::Host("cookies disabled".into()))
        }
        fn delete(&self, _name: &str) -> Result<()> {
            Err(EmbedError::Host("cookies disabled".into()))
        }
    }

    #[test]
    fn test_fresh_reference_is_persisted() {
        let store = Rc::new(MemoryCookieStore::new());
        let mut ledger = RefLedger::new(store.clone(), COOKIE);

        let previous = ledger.read_previous();
        let ensured = ledger.ensure_reference(previous);

        assert_eq!(ensured.cookie_ref_at_start, None);
        assert_eq!(ensured.reference.as_str().len(), 8);
        assert_eq!(
            store.get(COOKIE).unwrap().as_deref(),
            Some(ensured.reference.as_str())
        );
    }

    #[test]
    fn test_existing_cookie_is_forwarded() {
        let store = Rc::new(MemoryCookieStore::new());
        store
            .set(&CookieSpec::with_ttl(COOKIE, "1234a678", Utc::now()))
            .unwrap();
        let mut ledger = RefLedger::new(store.clone(), COOKIE);

        let previous = ledger.read_previous();
        let ensured = ledger.ensure_reference(previous);

        assert_eq!(ensured.cookie_ref_at_start.as_deref(), Some("1234a678"));
        assert_ne!(ensured.reference.as_str(), "1234a678");
        // build leaves the old cookie alone
        assert_eq!(store.get(COOKIE).unwrap().as_deref(), Some("1234a678"));
    }

    #[test]
    fn test_refresh_only_with_prior_cookie() {
        let store = Rc::new(MemoryCookieStore::new());
        let mut ledger = RefLedger::new(store.clone(), COOKIE);
        let ensured = ledger.ensure_reference(None);
        assert!(!ledger.refresh(&ensured.reference));

        let mut ledger = RefLedger::new(store.clone(), COOKIE);
        let ensured = ledger.ensure_reference(Some("1234a678".into()));
        store
            .set(&CookieSpec::with_ttl(COOKIE, "1234a678", Utc::now() - Duration::hours(23)))
            .unwrap();

        assert!(ledger.refresh(&ensured.reference));
        assert_eq!(ledger.cookie_ref(), Some(ensured.reference.as_str()));
        assert_eq!(
            store.get(COOKIE).unwrap().as_deref(),
            Some(ensured.reference.as_str())
        );
        let renewed = store.expires_at(COOKIE).unwrap();
        assert!(renewed > Utc::now() + Duration::hours(23));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = Rc::new(MemoryCookieStore::new());
        let mut ledger = RefLedger::new(store.clone(), COOKIE);
        ledger.ensure_reference(None);

        ledger.clear();
        ledger.clear();
        assert!(store.is_empty());
        assert_eq!(ledger.cookie_ref(), None);
    }

    #[test]
    fn test_broken_store_is_silent() {
        let mut ledger = RefLedger::new(Rc::new(BrokenStore), COOKIE);
        assert_eq!(ledger.read_previous(), None);
        let ensured = ledger.ensure_reference(None);
        assert_eq!(ensured.cookie_ref_at_start, None);
        ledger.clear();
    }
}
