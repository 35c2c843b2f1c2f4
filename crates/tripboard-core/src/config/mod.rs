//! Connection and provider configuration for client apps.
//!
//! Connection credentials are public project values (URL + anon key) and may
//! come from the build, the environment, the application context, or a shared
//! link. The first complete source wins.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const SUPABASE_URL_ENV: &str = "TRIPBOARD_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "TRIPBOARD_SUPABASE_ANON_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";
pub const DESTINATION_ENV: &str = "TRIPBOARD_DESTINATION";

const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_DESTINATION: &str = "Koh Larn";

/// Remote store connection credentials.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConnectionConfig")
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_anon_key",
                &self.supabase_anon_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: Some(url.into()),
            supabase_anon_key: Some(anon_key.into()),
        }
        .normalized()
    }

    /// Values baked in at compile time.
    pub fn build_time() -> Self {
        Self {
            supabase_url: option_env!("TRIPBOARD_SUPABASE_URL").map(str::to_string),
            supabase_anon_key: option_env!("TRIPBOARD_SUPABASE_ANON_KEY").map(str::to_string),
        }
        .normalized()
    }

    /// Values from the process environment.
    pub fn from_env() -> Self {
        Self {
            supabase_url: std::env::var(SUPABASE_URL_ENV).ok(),
            supabase_anon_key: std::env::var(SUPABASE_ANON_KEY_ENV).ok(),
        }
        .normalized()
    }

    /// Trim values, drop empties, and strip a trailing slash from the URL.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            supabase_url: normalize_text_option(self.supabase_url)
                .map(|url| url.trim_end_matches('/').to_string()),
            supabase_anon_key: normalize_text_option(self.supabase_anon_key),
        }
    }

    /// Both values present and the URL has an HTTP scheme.
    pub fn is_configured(&self) -> bool {
        self.supabase_anon_key.is_some()
            && self.supabase_url.as_deref().is_some_and(is_http_url)
    }

    /// Return `(url, anon_key)` or the reason they cannot be used.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.supabase_url.as_deref(), self.supabase_anon_key.as_deref()) {
            (Some(url), Some(key)) if is_http_url(url) => Ok((url, key)),
            (Some(_), Some(_)) => Err(Error::InvalidInput(
                "Supabase URL must include http:// or https://".to_string(),
            )),
            _ => Err(Error::NotConfigured),
        }
    }
}

/// Pick the first complete connection config, in priority order.
pub fn resolve_connection(
    candidates: impl IntoIterator<Item = ConnectionConfig>,
) -> Option<ConnectionConfig> {
    candidates
        .into_iter()
        .map(ConnectionConfig::normalized)
        .find(ConnectionConfig::is_configured)
}

/// Settings for the suggestion provider.
#[derive(Clone, PartialEq, Eq)]
pub struct SuggestionConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Place the suggestions are for
    pub destination: String,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            destination: DEFAULT_DESTINATION.to_string(),
        }
    }
}

impl fmt::Debug for SuggestionConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SuggestionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("destination", &self.destination)
            .finish()
    }
}

impl SuggestionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: normalize_text_option(std::env::var(GEMINI_API_KEY_ENV).ok()),
            model: normalize_text_option(std::env::var(GEMINI_MODEL_ENV).ok())
                .unwrap_or(defaults.model),
            destination: normalize_text_option(std::env::var(DESTINATION_ENV).ok())
                .unwrap_or(defaults.destination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_normalizes_values() {
        let config = ConnectionConfig::new(" https://project.supabase.co/ ", " anon ");
        assert_eq!(
            config.supabase_url.as_deref(),
            Some("https://project.supabase.co")
        );
        assert_eq!(config.supabase_anon_key.as_deref(), Some("anon"));
        assert!(config.is_configured());
    }

    #[test]
    fn test_incomplete_config_is_not_configured() {
        let config = ConnectionConfig {
            supabase_url: Some("https://project.supabase.co".to_string()),
            supabase_anon_key: Some("  ".to_string()),
        }
        .normalized();
        assert!(!config.is_configured());
        assert!(matches!(config.credentials(), Err(Error::NotConfigured)));
    }

    #[test]
    fn test_url_without_scheme_is_invalid() {
        let config = ConnectionConfig::new("project.supabase.co", "anon");
        assert!(!config.is_configured());
        assert!(matches!(config.credentials(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_connection_prefers_first_complete_source() {
        let resolved = resolve_connection([
            ConnectionConfig::default(),
            ConnectionConfig::new("https://env.supabase.co", "env-key"),
            ConnectionConfig::new("https://stored.supabase.co", "stored-key"),
        ])
        .unwrap();
        assert_eq!(
            resolved.supabase_url.as_deref(),
            Some("https://env.supabase.co")
        );
        assert!(resolve_connection([ConnectionConfig::default()]).is_none());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = ConnectionConfig::new("https://project.supabase.co", "secret-anon");
        assert!(!format!("{config:?}").contains("secret-anon"));

        let suggestions = SuggestionConfig {
            api_key: Some("gemini-secret".to_string()),
            ..SuggestionConfig::default()
        };
        assert!(!format!("{suggestions:?}").contains("gemini-secret"));
    }
}
