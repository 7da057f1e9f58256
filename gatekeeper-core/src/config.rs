//! Gatekeeper configuration

use crate::error::{GatekeeperError, GatekeeperResult};
use crate::logging::LoggingConfig;
use crate::types::AccessLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Random bytes in a CSRF token. The cookie format expects exactly twice this
/// many hex characters, so the two must change together.
pub const CSRF_TOKEN_BYTES: usize = 8;

/// Random bytes in a session token
pub const SESSION_TOKEN_BYTES: usize = 16;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub session: SessionSettings,
    pub csrf: CsrfSettings,
    /// Resource policies in evaluation order
    pub policies: Vec<PolicyConfig>,
    /// Accounts known to the bundled identity provider
    pub users: Vec<UserConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Session lifetime in seconds
    pub ttl_seconds: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CsrfSettings {
    /// CSRF token lifetime in seconds
    pub ttl_seconds: u32,
    /// Random bytes per token, must equal [`CSRF_TOKEN_BYTES`]
    pub token_bytes: usize,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            token_bytes: CSRF_TOKEN_BYTES,
        }
    }
}

/// How a policy recognizes the paths it governs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherConfig {
    /// Case-insensitive equality against a fixed list of paths
    Paths { paths: Vec<String> },
    /// Every file under a directory of the static root, resolved by the host
    /// into a `Paths` matcher before the registry is built
    StaticDir { dir: String },
    /// Case-sensitive glob such as `/Level1/**`
    Glob { pattern: String },
    /// Case-sensitive path prefix
    Prefix { prefix: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    pub name: String,
    pub required: AccessLevel,
    #[serde(default)]
    pub allow_anonymous: bool,
    pub matcher: MatcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserConfig {
    pub name: String,
    /// Plain password, hashed when the identity provider loads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-computed PHC hash string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Highest tier this user may authenticate at
    pub max_level: AccessLevel,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            csrf: CsrfSettings::default(),
            policies: vec![
                PolicyConfig {
                    name: "public".to_string(),
                    required: AccessLevel::Level0,
                    allow_anonymous: true,
                    matcher: MatcherConfig::StaticDir {
                        dir: "public".to_string(),
                    },
                },
                PolicyConfig {
                    name: "level1".to_string(),
                    required: AccessLevel::Level1,
                    allow_anonymous: false,
                    matcher: MatcherConfig::Glob {
                        pattern: "/Level1/**".to_string(),
                    },
                },
                PolicyConfig {
                    name: "level2".to_string(),
                    required: AccessLevel::Level2,
                    allow_anonymous: false,
                    matcher: MatcherConfig::Glob {
                        pattern: "/Level2/**".to_string(),
                    },
                },
            ],
            users: vec![
                UserConfig {
                    name: "bob".to_string(),
                    password: Some("12341".to_string()),
                    password_hash: None,
                    max_level: AccessLevel::Level1,
                },
                UserConfig {
                    name: "alice".to_string(),
                    password: Some("wonderland".to_string()),
                    password_hash: None,
                    max_level: AccessLevel::Level2,
                },
            ],
            logging: LoggingConfig::default(),
        }
    }
}

impl GatekeeperConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GatekeeperResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GatekeeperError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> GatekeeperResult<Self> {
        let config: GatekeeperConfig = toml::from_str(content).map_err(|e| GatekeeperError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GatekeeperResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| GatekeeperError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| GatekeeperError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> GatekeeperResult<()> {
        if self.session.ttl_seconds == 0 {
            return Err(crate::validation_error!(
                "Session TTL must be greater than 0",
                "session.ttl_seconds",
                "config"
            ));
        }

        if self.csrf.ttl_seconds == 0 {
            return Err(crate::validation_error!(
                "CSRF TTL must be greater than 0",
                "csrf.ttl_seconds",
                "config"
            ));
        }

        if self.csrf.token_bytes != CSRF_TOKEN_BYTES {
            return Err(GatekeeperError::Config {
                message: format!(
                    "CSRF token length of {} bytes does not match the {}-hex-char cookie format",
                    self.csrf.token_bytes,
                    CSRF_TOKEN_BYTES * 2
                ),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Remove csrf.token_bytes or set it to 8"),
            });
        }

        let mut names = HashSet::new();
        for policy in &self.policies {
            if !names.insert(policy.name.as_str()) {
                return Err(crate::validation_error!(
                    format!("Duplicate policy name '{}'", policy.name),
                    "policies.name",
                    "config"
                ));
            }

            if let MatcherConfig::Glob { pattern } = &policy.matcher {
                glob::Pattern::new(pattern).map_err(|e| GatekeeperError::Config {
                    message: format!("Invalid glob pattern '{}': {}", pattern, e),
                    source: Some(Box::new(e)),
                    context: crate::ErrorContext::new("config")
                        .with_operation("validate")
                        .with_detail("policy", &policy.name),
                })?;
            }
        }

        for user in &self.users {
            if user.name.trim().is_empty() {
                return Err(crate::validation_error!(
                    "User name must not be empty",
                    "users.name",
                    "config"
                ));
            }
            if user.password.is_none() && user.password_hash.is_none() {
                return Err(crate::validation_error!(
                    format!("User '{}' needs a password or password_hash", user.name),
                    "users.password",
                    "config"
                ));
            }
        }

        Ok(())
    }
}
