//! HTTP client configuration

use std::{collections::BTreeMap, path::Path, time::Duration};

use config::{Config, Environment as EnvSource, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix for environment variables read by [`HttpConfig::load`]
pub const ENV_PREFIX: &str = "MACROHTTP";

/// HTTP client configuration
///
/// Caller-supplied values override the defaults: base path `/`, 5s timeout,
/// at most 3 redirects and no credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Prefix joined with every relative request URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout, in milliseconds when (de)serialized
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub timeout: Duration,

    /// Maximum redirects to follow (0 = no redirects)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Keep cookies between requests
    #[serde(default)]
    pub with_credentials: bool,

    /// Reject non-2xx responses with `HttpError::Status`
    #[serde(default = "default_validate_status")]
    pub validate_status: bool,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP/HTTPS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            max_redirects: default_max_redirects(),
            with_credentials: false,
            validate_status: default_validate_status(),
            user_agent: default_user_agent(),
            proxy: None,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file (optional) overlaid with
    /// `MACROHTTP_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(EnvSource::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Set base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum redirects
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Keep cookies between requests
    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    /// Toggle rejection of non-2xx responses
    pub fn with_validate_status(mut self, enabled: bool) -> Self {
        self.validate_status = enabled;
        self
    }

    /// Add a default header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "/".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_max_redirects() -> usize {
    3
}

fn default_validate_status() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("macrohttp/{}", env!("CARGO_PKG_VERSION"))
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, "/");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_redirects, 3);
        assert!(!config.with_credentials);
        assert!(config.validate_status);
    }

    #[test]
    fn test_builder_pattern() {
        let config = HttpConfig::new()
            .with_base_url("https://api.example.com")
            .with_timeout(Duration::from_secs(15))
            .with_max_redirects(0)
            .with_header("X-App", "demo")
            .with_proxy("http://proxy.example.com:8080");

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_redirects, 0);
        assert_eq!(config.headers.get("X-App"), Some(&"demo".to_string()));
        assert_eq!(config.proxy, Some("http://proxy.example.com:8080".to_string()));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: HttpConfig =
            serde_json::from_str(r#"{"base_url": "https://x.test", "timeout": 1500}"#).unwrap();
        assert_eq!(config.base_url, "https://x.test");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_redirects, 3);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "base_url = \"https://files.test\"").unwrap();
        writeln!(file, "timeout = 2000").unwrap();
        writeln!(file, "max_redirects = 1").unwrap();

        let config = HttpConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "https://files.test");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.max_redirects, 1);
        assert!(config.validate_status);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HttpConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.base_url, "/");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
