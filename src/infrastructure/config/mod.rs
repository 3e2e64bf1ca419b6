//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::application::SessionOptions;
use crate::domain::entities::{Credentials, Identity};

/// Handler entries whose name ends with this are registered at startup
pub const HANDLER_SUFFIX: &str = "_handler";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub session: SessionConfig,
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    #[serde(default)]
    pub jid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HandlerConfig {
    pub jid: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_socket")]
    pub socket: PathBuf,
}

fn default_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_true() -> bool {
    true
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn default_socket() -> PathBuf {
    std::env::temp_dir().join(format!("{}.sock", env!("CARGO_PKG_NAME")))
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            socket: default_socket(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut handlers = BTreeMap::new();
        handlers.insert(
            "build_handler".to_string(),
            HandlerConfig {
                jid: "builder@example.com".to_string(),
            },
        );

        Self {
            session: SessionConfig {
                jid: "parley@example.com/bot".to_string(),
                password: "change-me".to_string(),
                name: "Parley".to_string(),
            },
            handlers,
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Load `path` if it exists, otherwise build the config from the
    /// environment. Either way environment variables take precedence.
    pub fn resolve(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve_with(path, env_var)
    }

    fn resolve_with<F>(path: impl Into<PathBuf>, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.into();
        if path.exists() {
            Ok(Self::load(path)?.with_vars(&var))
        } else {
            Self::from_vars(var)
        }
    }

    /// Build a config from `PARLEY_JID` and `PARLEY_PASSWORD` (both required)
    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jid = var("PARLEY_JID").ok_or_else(|| ConfigError::MissingField("PARLEY_JID".to_string()))?;
        let password = var("PARLEY_PASSWORD")
            .ok_or_else(|| ConfigError::MissingField("PARLEY_PASSWORD".to_string()))?;

        let config = Self {
            session: SessionConfig {
                jid,
                password,
                name: default_name(),
            },
            handlers: BTreeMap::new(),
            gateway: GatewayConfig::default(),
        };
        Ok(config.with_vars(&var))
    }

    /// Override values from `PARLEY_JID`, `PARLEY_PASSWORD` and `PARLEY_SOCKET`
    pub fn with_env(self) -> Self {
        self.with_vars(env_var)
    }

    fn with_vars<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(jid) = var("PARLEY_JID") {
            self.session.jid = jid;
        }
        if let Some(password) = var("PARLEY_PASSWORD") {
            self.session.password = password;
        }
        if let Some(socket) = var("PARLEY_SOCKET") {
            self.gateway.socket = PathBuf::from(socket);
        }
        self
    }

    /// Handler identities to register at startup, in key order
    pub fn bootstrap_handlers(&self) -> Vec<Identity> {
        self.handlers
            .iter()
            .filter(|(name, _)| name.ends_with(HANDLER_SUFFIX))
            .map(|(_, handler)| Identity::parse(&handler.jid))
            .collect()
    }

    /// Validate and turn the session section into startup options
    pub fn session_options(&self) -> Result<SessionOptions, ConfigError> {
        if self.session.jid.trim().is_empty() {
            return Err(ConfigError::MissingField("session.jid".to_string()));
        }
        if self.session.password.is_empty() {
            return Err(ConfigError::MissingField("session.password".to_string()));
        }

        let identity = Identity::parse(&self.session.jid);
        if identity.node().is_none() || identity.domain().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "session.jid must look like node@domain: {}",
                self.session.jid
            )));
        }

        for (name, handler) in &self.handlers {
            if name.ends_with(HANDLER_SUFFIX) && handler.jid.trim().is_empty() {
                return Err(ConfigError::MissingField(format!("handlers.{}.jid", name)));
            }
        }

        Ok(SessionOptions {
            identity,
            credentials: Credentials::new(self.session.password.clone()),
            display_name: self.session.name.clone(),
            bootstrap_handlers: self.bootstrap_handlers(),
        })
    }
}
