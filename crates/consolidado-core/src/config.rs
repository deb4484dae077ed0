use serde::{Deserialize, Serialize};

/// Attachment fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_fetch_timeout_seconds")]
    pub timeout_seconds: u64,
}

const fn default_fetch_timeout_seconds() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout_seconds(),
        }
    }
}

/// Fetch cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the in-memory attachment byte cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum cache size in megabytes
    #[serde(default = "default_cache_max_mb")]
    pub max_mb: u64,

    /// Cache TTL in seconds (0 = no expiry)
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_cache_max_mb() -> u64 {
    64
}

const fn default_cache_ttl_seconds() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_mb: default_cache_max_mb(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Blob store prefix under which consolidated PDFs are written
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Attachment fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Fetch cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_storage_prefix() -> String {
    "remisiones".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_prefix: default_storage_prefix(),
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/consolidado/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = config_dir() {
            let user_config = config_dir.join("consolidado").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
fn config_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(std::path::PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| std::path::PathBuf::from(home).join(".config"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.storage_prefix, "remisiones");
        assert_eq!(config.fetch.timeout_seconds, 30);
        assert!(config.cache.enabled);

        let parsed: AppConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(parsed.storage_prefix, "remisiones");
    }

    #[test]
    fn test_partial_toml() {
        let parsed: AppConfig = toml::from_str("[cache]\nttl_seconds = 60\n").expect("parses");
        assert_eq!(parsed.cache.ttl_seconds, 60);
        assert_eq!(parsed.cache.max_mb, 64);
    }
}
