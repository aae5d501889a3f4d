//! Codec configuration: reads `~/.grantstack/grantstack.toml` and falls back
//! to defaults when the file is absent or unreadable.
//!
//! ```toml
//! [wire]
//! require_utc = true
//!
//! [cache]
//! normalized_at_key = "_normalizedAt"
//! image_key = "_image"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name looked up in the GrantStack config directory.
pub const CONFIG_FILE_NAME: &str = "grantstack.toml";

/// Top-level codec configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub wire: WireConfig,
    #[serde(default)]
    pub cache: CacheKeys,
}

/// Wire codec settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConfig {
    /// Reject timestamps carrying an explicit offset instead of `Z`.
    #[serde(default)]
    pub require_utc: bool,
}

/// Reserved keys in every cache dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeys {
    #[serde(default = "default_normalized_at_key")]
    pub normalized_at_key: String,
    #[serde(default = "default_image_key")]
    pub image_key: String,
}

fn default_normalized_at_key() -> String {
    "_normalizedAt".to_string()
}

fn default_image_key() -> String {
    "_image".to_string()
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self {
            normalized_at_key: default_normalized_at_key(),
            image_key: default_image_key(),
        }
    }
}

impl CacheKeys {
    /// Returns the reserved key that is empty or shared by both roles, if any.
    #[must_use]
    pub fn collision(&self) -> Option<&str> {
        if self.normalized_at_key.is_empty() {
            Some(self.normalized_at_key.as_str())
        } else if self.image_key.is_empty() || self.image_key == self.normalized_at_key {
            Some(self.image_key.as_str())
        } else {
            None
        }
    }

    /// Returns true if `name` is one of the reserved keys.
    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.normalized_at_key || name == self.image_key
    }
}

impl CodecConfig {
    /// Loads `grantstack.toml` from the GrantStack config directory.
    pub fn load() -> Self {
        Self::load_from(config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from an explicit path.
    /// Falls back to defaults with a warning on read or parse errors.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No codec config found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(mut config) => {
                    if let Some(key) = config.cache.collision() {
                        warn!(
                            "Reserved cache key {:?} in {:?} is empty or duplicated, \
                             using defaults",
                            key, path
                        );
                        config.cache = CacheKeys::default();
                    }
                    info!("Loaded codec config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse codec config {:?}: {}. Falling back to defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read codec config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Resolve the GrantStack config directory.
fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".grantstack"))
        .unwrap_or_else(|| PathBuf::from(".grantstack"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.cache.normalized_at_key, "_normalizedAt");
        assert_eq!(config.cache.image_key, "_image");
        assert!(!config.wire.require_utc);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[wire]
require_utc = true

[cache]
normalized_at_key = "lastSync"
image_key = "logo"
"#;
        let config = CodecConfig::from_toml_str(toml_str).unwrap();
        assert!(config.wire.require_utc);
        assert_eq!(config.cache.normalized_at_key, "lastSync");
        assert_eq!(config.cache.image_key, "logo");
    }

    #[test]
    fn partial_cache_section_keeps_other_default() {
        let config = CodecConfig::from_toml_str("[cache]\nimage_key = \"img\"\n").unwrap();
        assert_eq!(config.cache.image_key, "img");
        assert_eq!(config.cache.normalized_at_key, "_normalizedAt");
    }

    #[test]
    fn duplicate_reserved_keys_are_a_collision() {
        let keys = CacheKeys {
            normalized_at_key: "meta".into(),
            image_key: "meta".into(),
        };
        assert_eq!(keys.collision(), Some("meta"));
        assert_eq!(CacheKeys::default().collision(), None);
        assert!(CacheKeys::default().is_reserved("_image"));
        assert!(!CacheKeys::default().is_reserved("image"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(CodecConfig::from_toml_str("[wire\nrequire_utc = ").is_err());
    }
}
