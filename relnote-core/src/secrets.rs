//! Secrets management for relnote
//!
//! Secrets are stored separately from configuration to avoid accidental
//! sharing. The secrets file is located at `~/.config/relnote/secrets.toml`
//! and must have restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (LINEAR_API_KEY, ANTHROPIC_API_KEY, SLACK_WEBHOOK_URL)
//! 2. Secrets file (~/.config/relnote/secrets.toml)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Linear configuration
    pub linear: LinearSecrets,
    /// Anthropic configuration
    pub anthropic: AnthropicSecrets,
    /// Slack configuration
    pub slack: SlackSecrets,
}

/// Linear-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LinearSecrets {
    /// Linear API key
    pub api_key: Option<String>,
}

/// Anthropic-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AnthropicSecrets {
    /// Anthropic API key
    pub api_key: Option<String>,
}

/// Slack-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackSecrets {
    /// Incoming webhook URL
    pub webhook_url: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            // Check if file is readable by group or others (mode & 0o077)
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        // Trim whitespace from stored values
        for value in [
            &mut secrets.linear.api_key,
            &mut secrets.anthropic.api_key,
            &mut secrets.slack.webhook_url,
        ] {
            if let Some(v) = value {
                *v = v.trim().to_string();
            }
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/relnote/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("relnote").join("secrets.toml"))
    }

    /// Get the Linear API key with environment variable override
    ///
    /// Priority: LINEAR_API_KEY env var > secrets file
    pub fn linear_api_key(&self) -> Option<String> {
        env_or(&self.linear.api_key, "LINEAR_API_KEY")
    }

    /// Get the Anthropic API key with environment variable override
    ///
    /// Priority: ANTHROPIC_API_KEY env var > secrets file
    pub fn anthropic_api_key(&self) -> Option<String> {
        env_or(&self.anthropic.api_key, "ANTHROPIC_API_KEY")
    }

    /// Get the Slack webhook URL with environment variable override
    ///
    /// Priority: SLACK_WEBHOOK_URL env var > secrets file
    pub fn slack_webhook_url(&self) -> Option<String> {
        env_or(&self.slack.webhook_url, "SLACK_WEBHOOK_URL")
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# relnote Secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[linear]
# Linear API key, created at https://linear.app/settings/api
api_key = ""

[anthropic]
# Anthropic API key, created at https://console.anthropic.com/
api_key = ""

[slack]
# Slack incoming-webhook URL for delivering release notes
webhook_url = ""
"#;

        std::fs::write(&path, template).map_err(Error::Io)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your keys");

        Ok(path)
    }
}

/// Environment variable override, falling back to a stored value
fn env_or(stored: &Option<String>, var: &str) -> Option<String> {
    if let Ok(value) = std::env::var(var) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            debug!(var, "Using secret from environment variable");
            return Some(value);
        }
    }

    match stored {
        Some(v) if !v.is_empty() => Some(v.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_secrets() {
        let secrets = Secrets::default();
        assert!(secrets.linear.api_key.is_none());
        assert!(secrets.anthropic.api_key.is_none());
        assert!(secrets.slack.webhook_url.is_none());
    }

    #[test]
    fn test_parse_secrets() {
        let toml = r#"
[linear]
api_key = "lin_api_xxxx"

[anthropic]
api_key = "sk-ant-xxxx"

[slack]
webhook_url = "https://hooks.slack.com/services/T/B/X"
"#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.linear.api_key, Some("lin_api_xxxx".to_string()));
        assert_eq!(secrets.anthropic.api_key, Some("sk-ant-xxxx".to_string()));
        assert_eq!(
            secrets.slack.webhook_url,
            Some("https://hooks.slack.com/services/T/B/X".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[linear]\napi_key = \"test\"").unwrap();

        // Set world-readable permissions
        let perms = std::fs::Permissions::from_mode(0o644);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let result = Secrets::load_from_file(&file.path().to_path_buf());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_permissions_accepted() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[linear]\napi_key = \"  lin_api_test  \"").unwrap();

        // Set owner-only permissions
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let result = Secrets::load_from_file(&file.path().to_path_buf()).unwrap();
        // load_from_file trims stored values
        assert_eq!(result.linear.api_key, Some("lin_api_test".to_string()));
    }
}
