//! Backend host configuration.
//!
//! # Design
//! `ServicesConfig` is an explicit value handed to `ServicesClient`. For
//! applications that want process-wide access there is a write-once global:
//! `init_global` may succeed once, before first use, and `global` falls back
//! to the defaults (which also locks the global) if it was never set.

use std::sync::OnceLock;

use thiserror::Error;

use crate::path::ValidatedPath;

/// The default public backend host.
pub const DEFAULT_HOST: &str = "https://alpha.services.normcore.io";

/// Environment variable overriding the host in `ServicesConfig::from_env`.
pub const HOST_ENV_VAR: &str = "LOBBY_SERVICES_HOST";

/// Environment variable supplying the app key in `ServicesConfig::from_env`.
pub const APP_KEY_ENV_VAR: &str = "LOBBY_SERVICES_APP_KEY";

static GLOBAL: OnceLock<ServicesConfig> = OnceLock::new();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the global services configuration is already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicesConfig {
    host: String,
    app_key: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            app_key: None,
        }
    }
}

impl ServicesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the host (complete root URL, protocol included).
    #[must_use]
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.host = host.as_ref().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    /// Defaults overridden by `LOBBY_SERVICES_HOST` / `LOBBY_SERVICES_APP_KEY`.
    /// An empty variable counts as unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(host) = env_value(HOST_ENV_VAR) {
            config = config.with_host(host);
        }
        if let Some(key) = env_value(APP_KEY_ENV_VAR) {
            config = config.with_app_key(key);
        }
        config
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn app_key(&self) -> Option<&str> {
        self.app_key.as_deref()
    }

    /// Map an endpoint path to a fully qualified URL.
    pub fn endpoint_url(&self, path: &ValidatedPath) -> String {
        format!("{}/{}", self.host, path)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Install the process-wide configuration. Only the first call succeeds.
pub fn init_global(config: ServicesConfig) -> Result<(), ConfigError> {
    GLOBAL.set(config).map_err(|_| ConfigError::AlreadyInitialized)
}

/// The process-wide configuration, or the defaults if none was installed.
pub fn global() -> &'static ServicesConfig {
    GLOBAL.get_or_init(ServicesConfig::default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::path::format_path;

    #[test]
    fn default_host() {
        let config = ServicesConfig::new();
        assert_eq!(config.host(), DEFAULT_HOST);
        assert!(config.app_key().is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ServicesConfig::new().with_host("http://localhost:3000/");
        let path = format_path("lobbies", ()).unwrap();
        assert_eq!(config.endpoint_url(&path), "http://localhost:3000/lobbies");
    }

    /// Tests touching the process environment take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env(host: Option<&str>, app_key: Option<&str>) -> ServicesConfig {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (name, value) in [(HOST_ENV_VAR, host), (APP_KEY_ENV_VAR, app_key)] {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
        let config = ServicesConfig::from_env();
        std::env::remove_var(HOST_ENV_VAR);
        std::env::remove_var(APP_KEY_ENV_VAR);
        config
    }

    #[test]
    fn from_env_overrides_defaults() {
        let config = with_env(Some("http://lobby.internal:8080/"), Some("key-1"));
        assert_eq!(config.host(), "http://lobby.internal:8080");
        assert_eq!(config.app_key(), Some("key-1"));
    }

    #[test]
    fn from_env_unset_keeps_defaults() {
        assert_eq!(with_env(None, None), ServicesConfig::default());
    }

    #[test]
    fn from_env_ignores_empty_values() {
        let config = with_env(Some(""), Some(""));
        assert_eq!(config.host(), DEFAULT_HOST);
        assert!(config.app_key().is_none());
    }

    #[test]
    fn global_is_write_once() {
        let custom = ServicesConfig::new().with_host("http://127.0.0.1:9");
        init_global(custom.clone()).unwrap();
        assert_eq!(global(), &custom);
        assert_eq!(
            init_global(ServicesConfig::new()),
            Err(ConfigError::AlreadyInitialized)
        );
        assert_eq!(global().host(), "http://127.0.0.1:9");
    }
}
