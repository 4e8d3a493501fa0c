//! CLI command implementations

pub mod changelog;
pub mod customer;
pub mod state;
pub mod tickets;

pub use changelog::ChangelogArgs;
pub use customer::CustomerArgs;
pub use state::StateArgs;
pub use tickets::TicketsArgs;

use chrono::{DateTime, NaiveDate, Utc};
use relnote_core::{Config, Secrets, StateStore};

/// State store from config, falling back to the default location
pub(crate) fn state_store(config: &Config) -> anyhow::Result<StateStore> {
    match &config.run.state_path {
        Some(path) => Ok(StateStore::new(path)),
        None => Ok(StateStore::default_location()?),
    }
}

/// Required secret, with a pointer at where to put it
pub(crate) fn require_secret(value: Option<String>, what: &str, env: &str) -> anyhow::Result<String> {
    value.ok_or_else(|| {
        anyhow::anyhow!(
            "{} not found. Set {} or add it to secrets.toml (run `relnote init-secrets`)",
            what,
            env
        )
    })
}

/// Parse a window-start argument as RFC 3339 or a bare date
pub(crate) fn parse_since(s: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = s.parse::<DateTime<Utc>>() {
        return Ok(ts);
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Could not parse '{}' as RFC 3339 or YYYY-MM-DD", s))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{}'", s))?;
    Ok(midnight.and_utc())
}

/// Load required secrets for a run
pub(crate) struct RunSecrets {
    pub linear_api_key: String,
    pub anthropic_api_key: String,
    pub slack_webhook_url: Option<String>,
}

impl RunSecrets {
    pub fn load() -> anyhow::Result<Self> {
        let secrets = Secrets::load()?;
        Ok(Self {
            linear_api_key: require_secret(
                secrets.linear_api_key(),
                "Linear API key",
                "LINEAR_API_KEY",
            )?,
            anthropic_api_key: require_secret(
                secrets.anthropic_api_key(),
                "Anthropic API key",
                "ANTHROPIC_API_KEY",
            )?,
            slack_webhook_url: secrets.slack_webhook_url(),
        })
    }
}
