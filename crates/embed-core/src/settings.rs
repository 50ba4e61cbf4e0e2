//! Loader Settings
//!
//! Endpoints and timing shared by every widget on the page.

use std::time::Duration;

/// Default hosted payment surface
pub const DEFAULT_EMBED_BASE_URL: &str = "http://127.0.0.1:3000/embed";

/// Default status API
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000/api";

/// Default delay between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Loader settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedSettings {
    /// Base address of the hosted surface; the payload is appended as the last path segment
    pub embed_base_url: String,

    /// Base address of the status API (`{api_base_url}/ref/{reference}`)
    pub api_base_url: String,

    /// Delay between two status checks
    pub poll_interval: Duration,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            embed_base_url: DEFAULT_EMBED_BASE_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl EmbedSettings {
    /// Read settings baked in at compile time (the wasm bundle has no environment)
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("POSFRA_EMBED_BASE_URL").map(String::from),
            option_env!("POSFRA_API_BASE_URL").map(String::from),
            option_env!("POSFRA_POLL_INTERVAL_SECS").map(String::from),
        )
    }

    fn from_values(
        embed_base_url: Option<String>,
        api_base_url: Option<String>,
        poll_interval_secs: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        let poll_interval = poll_interval_secs
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.poll_interval, Duration::from_secs);

        Self {
            embed_base_url: embed_base_url
                .map_or(defaults.embed_base_url, |s| s.trim_end_matches('/').to_string()),
            api_base_url: api_base_url
                .map_or(defaults.api_base_url, |s| s.trim_end_matches('/').to_string()),
            poll_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EmbedSettings::default();
        assert_eq!(settings.embed_base_url, "http://127.0.0.1:3000/embed");
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_trim_trailing_slash() {
        let settings = EmbedSettings::from_values(
            Some("https://pay.example.com/embed/".into()),
            Some("https://api.example.com/".into()),
            Some("5".into()),
        );
        assert_eq!(settings.embed_base_url, "https://pay.example.com/embed");
        assert_eq!(settings.api_base_url, "https://api.example.com");
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_interval_falls_back() {
        let settings = EmbedSettings::from_values(None, None, Some("0".into()));
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);

        let settings = EmbedSettings::from_values(None, None, Some("soon".into()));
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_build_env_settings_are_usable() {
        let settings = EmbedSettings::from_build_env();
        assert!(settings.poll_interval > Duration::ZERO);
        assert!(!settings.embed_base_url.ends_with('/'));
        assert!(!settings.api_base_url.ends_with('/'));
    }
}
