// ============================
// inventory-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path for the flat-file store
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Token settings
    pub token: TokenSettings,
    /// Backend-store dial timeout in seconds
    pub connect_timeout_secs: u64,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
}

/// Bearer token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Signing secret. When unset, an ephemeral secret is generated at
    /// startup and every token dies with the process.
    pub secret: Option<String>,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            token: TokenSettings::default(),
            connect_timeout_secs: 5,
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: 60 * 60 * 24, // 24 hours
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 10,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl Settings {
    /// Load settings from config files and environment variables
    pub fn load() -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"))
            .merge(Yaml::file("config.yaml"))
            .merge(Json::file("config.json"))
            .merge(Env::prefixed("INVENTORY_").split("__"))
            .extract()?;

        Ok(settings)
    }

    /// Load settings from an explicit TOML file, still honoring env overrides
    pub fn load_from<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.into()))
            .merge(Env::prefixed("INVENTORY_").split("__"))
            .extract()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 3000);
        assert_eq!(settings.token.ttl_secs, 86_400);
        assert_eq!(settings.connect_timeout_secs, 5);
        assert!(settings.token.secret.is_none());
    }

    #[test]
    fn load_without_files_falls_back_to_defaults() {
        figment::Jail::expect_with(|_jail| {
            let settings = Settings::load().expect("defaults should extract");
            assert_eq!(settings.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("INVENTORY_LOG_LEVEL", "debug");
            jail.set_env("INVENTORY_TOKEN__TTL_SECS", "60");
            let settings = Settings::load().expect("env should extract");
            assert_eq!(settings.log_level, "debug");
            assert_eq!(settings.token.ttl_secs, 60);
            Ok(())
        });
    }
}
