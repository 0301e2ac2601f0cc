//! Meshy client configuration.

use std::time::Duration;

/// Default public API base URL.
pub const DEFAULT_API_URL: &str = "https://api.meshy.ai/openapi/v1";

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the Meshy API, injected into
/// [`MeshyApi`](crate::api::MeshyApi) at construction.
///
/// A missing `api_key` does not prevent construction: the client reports
/// itself unconfigured and every call fails before touching the network.
#[derive(Clone)]
pub struct MeshyConfig {
    /// Bearer credential. `None` when `MESHY_API_KEY` is unset or blank.
    pub api_key: Option<String>,
    /// Base URL without trailing slash, e.g. `https://api.meshy.ai/openapi/v1`.
    pub api_url: String,
    /// Ask the service for PBR textures (higher-fidelity output).
    pub enable_pbr: bool,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl MeshyConfig {
    /// Build a config for the given key with default settings.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: normalize_key(api_key),
            api_url: DEFAULT_API_URL.to_string(),
            enable_pbr: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default                            |
    /// |---------------------------|------------------------------------|
    /// | `MESHY_API_KEY`           | none (client unconfigured)         |
    /// | `MESHY_API_URL`           | `https://api.meshy.ai/openapi/v1`  |
    /// | `MESHY_ENABLE_PBR`        | `true`                             |
    /// | `MESHY_HTTP_TIMEOUT_SECS` | `30`                               |
    ///
    /// Malformed optional values fall back to their default with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("MESHY_API_KEY").ok());

        if let Ok(url) = std::env::var("MESHY_API_URL") {
            if !url.trim().is_empty() {
                config.api_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Ok(raw) = std::env::var("MESHY_ENABLE_PBR") {
            match parse_bool(&raw) {
                Some(flag) => config.enable_pbr = flag,
                None => tracing::warn!(value = %raw, "Ignoring malformed MESHY_ENABLE_PBR"),
            }
        }

        if let Ok(raw) = std::env::var("MESHY_HTTP_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "Ignoring malformed MESHY_HTTP_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Whether a credential is present.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for MeshyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("enable_pbr", &self.enable_pbr)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_counts_as_missing() {
        assert!(!MeshyConfig::new(Some("  ".to_string())).has_credential());
        assert!(!MeshyConfig::new(None).has_credential());
        assert!(MeshyConfig::new(Some("msy_abc".to_string())).has_credential());
    }

    #[test]
    fn defaults_request_pbr_output() {
        let config = MeshyConfig::new(None);
        assert!(config.enable_pbr);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = MeshyConfig::new(Some("msy_secret".to_string()));
        let printed = format!("{config:?}");
        assert!(!printed.contains("msy_secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
