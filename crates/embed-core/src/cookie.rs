//! Cookie Storage
//!
//! The page-wide name/value store that lets a reload resume against the
//! same transaction.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;

/// Lifetime of a persisted reference
pub const REF_COOKIE_TTL_HOURS: i64 = 24;

/// A cookie to be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
}

impl CookieSpec {
    /// Cookie expiring [`REF_COOKIE_TTL_HOURS`] from `now`
    pub fn with_ttl(name: impl Into<String>, value: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: now + Duration::hours(REF_COOKIE_TTL_HOURS),
        }
    }

    /// `document.cookie` assignment string
    pub fn to_cookie_string(&self) -> String {
        format!(
            "{}={}; expires={}; path=/; SameSite=Strict",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT")
        )
    }

    /// Assignment string that removes `name`
    pub fn expired(name: &str) -> String {
        format!("{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/; SameSite=Strict")
    }
}

/// Find `name` in a `document.cookie` style header (`a=1; b=2`)
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Cookie storage trait
pub trait CookieStore {
    /// Read a cookie value
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write (or overwrite) a cookie
    fn set(&self, cookie: &CookieSpec) -> Result<()>;

    /// Remove a cookie; removing an absent cookie is not an error
    fn delete(&self, name: &str) -> Result<()>;
}

/// In-memory cookie store (for tests and native hosts)
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RefCell<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expiry of a stored cookie
    pub fn expires_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.cookies.borrow().get(name).map(|(_, expires)| *expires)
    }

    pub fn len(&self) -> usize {
        self.cookies.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.borrow().is_empty()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let cookies = self.cookies.borrow();
        Ok(cookies
            .get(name)
            .filter(|(_, expires)| *expires > Utc::now())
            .map(|(value, _)| value.clone()))
    }

    fn set(&self, cookie: &CookieSpec) -> Result<()> {
        self.cookies
            .borrow_mut()
            .insert(cookie.name.clone(), (cookie.value.clone(), cookie.expires));
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.cookies.borrow_mut().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cookie_string() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let cookie = CookieSpec::with_ttl("posfra_ref", "1234a678", now);
        assert_eq!(
            cookie.to_cookie_string(),
            "posfra_ref=1234a678; expires=Sat, 02 Mar 2024 12:00:00 GMT; path=/; SameSite=Strict"
        );
    }

    #[test]
    fn test_parse_cookie_header() {
        let header = "theme=dark; posfra_ref=1234a678;other=x";
        assert_eq!(parse_cookie_header(header, "posfra_ref").as_deref(), Some("1234a678"));
        assert_eq!(parse_cookie_header(header, "other").as_deref(), Some("x"));
        assert_eq!(parse_cookie_header(header, "posfra"), None);
        assert_eq!(parse_cookie_header("posfra_ref=", "posfra_ref"), None);
        assert_eq!(parse_cookie_header("", "posfra_ref"), None);
    }

    #[test]
    fn test_memory_store_expiry() {
        let store = MemoryCookieStore::new();
        let stale = CookieSpec::with_ttl("posfra_ref", "old", Utc::now() - Duration::hours(48));
        store.set(&stale).unwrap();
        assert_eq!(store.get("posfra_ref").unwrap(), None);

        store.set(&CookieSpec::with_ttl("posfra_ref", "new", Utc::now())).unwrap();
        assert_eq!(store.get("posfra_ref").unwrap().as_deref(), Some("new"));

        store.delete("posfra_ref").unwrap();
        store.delete("posfra_ref").unwrap();
        assert!(store.is_empty());
    }
}
