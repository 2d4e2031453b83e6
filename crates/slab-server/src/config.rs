//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use slab_shared::constants::{
    APP_NAME, DEFAULT_ADMIN_SESSION_TTL_SECS, DEFAULT_HTTP_PORT, DEFAULT_MEMBER_SESSION_TTL_SECS,
    FALLBACK_ADMIN_PASSWORD, MAX_IMAGE_SIZE,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: unset (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Secret for the admin gate.
    /// Env: `ADMIN_PASSWORD`
    /// Default: unset, in which case the fallback password is accepted.
    pub admin_password: Option<String>,

    /// Env: `ADMIN_SESSION_TTL_SECS`
    /// Default: 12 hours
    pub admin_session_ttl_secs: i64,

    /// Env: `MEMBER_SESSION_TTL_SECS`
    /// Default: 7 days
    pub member_session_ttl_secs: i64,

    /// Whether intake forms, board posts and donations need a member session.
    /// Env: `REQUIRE_MEMBER_AUTH` (true/false)
    /// Default: `true`
    pub require_member_auth: bool,

    /// Largest image the editors accept, in bytes.
    /// Env: `MAX_IMAGE_SIZE`
    /// Default: 5 MiB
    pub max_image_size: usize,

    /// Env: `SITE_NAME`
    /// Default: `"Slab City Legends"`
    pub site_name: String,

    /// Load the stock content into an empty store on first start.
    /// Env: `SEED_DEFAULTS` (true/false)
    /// Default: `true`
    pub seed_defaults: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            admin_password: None,
            admin_session_ttl_secs: DEFAULT_ADMIN_SESSION_TTL_SECS,
            member_session_ttl_secs: DEFAULT_MEMBER_SESSION_TTL_SECS,
            require_member_auth: true,
            max_image_size: MAX_IMAGE_SIZE,
            site_name: APP_NAME.to_string(),
            seed_defaults: true,
        }
    }
}

// Keep the admin password out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<set>"))
            .field("admin_session_ttl_secs", &self.admin_session_ttl_secs)
            .field("member_session_ttl_secs", &self.member_session_ttl_secs)
            .field("require_member_auth", &self.require_member_auth)
            .field("max_image_size", &self.max_image_size)
            .field("site_name", &self.site_name)
            .field("seed_defaults", &self.seed_defaults)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from any source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = get("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = get("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(password) = get("ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = Some(password);
            }
        }

        if let Some(ttl) = parse_positive(&get, "ADMIN_SESSION_TTL_SECS") {
            config.admin_session_ttl_secs = ttl;
        }
        if let Some(ttl) = parse_positive(&get, "MEMBER_SESSION_TTL_SECS") {
            config.member_session_ttl_secs = ttl;
        }

        if let Some(val) = get("REQUIRE_MEMBER_AUTH") {
            config.require_member_auth = val != "false" && val != "0";
        }

        if let Some(size) = parse_positive(&get, "MAX_IMAGE_SIZE") {
            config.max_image_size = size as usize;
        }

        if let Some(name) = get("SITE_NAME") {
            if !name.trim().is_empty() {
                config.site_name = name;
            }
        }

        if let Some(val) = get("SEED_DEFAULTS") {
            config.seed_defaults = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    /// The password the admin gate compares against.
    pub fn effective_admin_password(&self) -> &str {
        self.admin_password
            .as_deref()
            .unwrap_or(FALLBACK_ADMIN_PASSWORD)
    }

    pub fn uses_fallback_password(&self) -> bool {
        self.admin_password.is_none()
    }
}

fn parse_positive(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<i64> {
    let raw = get(key)?;
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert!(config.require_member_auth);
        assert!(config.uses_fallback_password());
        assert_eq!(config.effective_admin_password(), FALLBACK_ADMIN_PASSWORD);
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("ADMIN_PASSWORD", "hunter22"),
            ("REQUIRE_MEMBER_AUTH", "false"),
            ("MAX_IMAGE_SIZE", "1024"),
            ("SITE_NAME", "Slabs"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.effective_admin_password(), "hunter22");
        assert!(!config.require_member_auth);
        assert_eq!(config.max_image_size, 1024);
        assert_eq!(config.site_name, "Slabs");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("ADMIN_SESSION_TTL_SECS", "-5"),
            ("ADMIN_PASSWORD", ""),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.admin_session_ttl_secs, DEFAULT_ADMIN_SESSION_TTL_SECS);
        assert!(config.uses_fallback_password());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = from_pairs(&[("ADMIN_PASSWORD", "hunter22")]);
        assert!(!format!("{config:?}").contains("hunter22"));
    }
}
