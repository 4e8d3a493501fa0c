//! Generic release-notes command

use clap::Args;
use relnote_core::model::AnthropicClient;
use relnote_core::run::Runner;
use relnote_core::Config;
use relnote_linear::LinearClient;
use relnote_slack::SlackWebhook;

use super::{parse_since, state_store, RunSecrets};

/// Generate release notes for the window since the last run
#[derive(Args, Debug)]
pub struct ChangelogArgs {
    /// Window start override (RFC 3339 or YYYY-MM-DD)
    #[arg(long, env = "RELNOTE_SINCE")]
    since: Option<String>,

    /// Draft the notes but skip Slack delivery
    #[arg(long)]
    dry_run: bool,
}

impl ChangelogArgs {
    /// Execute the changelog command
    ///
    /// Run state always advances on completion, including dry runs; tickets
    /// previewed and discarded were still reviewed.
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let secrets = RunSecrets::load()?;
        let since = self.since.as_deref().map(parse_since).transpose()?;

        let source = LinearClient::new(secrets.linear_api_key)?;
        let model = AnthropicClient::new(secrets.anthropic_api_key, config.model.clone())?;
        let store = state_store(config)?;

        let webhook = if self.dry_run {
            None
        } else {
            match secrets.slack_webhook_url {
                Some(url) => Some(SlackWebhook::new(url)?),
                None => {
                    tracing::warn!("No Slack webhook configured, printing notes instead");
                    None
                }
            }
        };

        let mut runner = Runner::new(&source, &model, store, config.clone());
        if let Some(webhook) = webhook.as_ref() {
            runner = runner.with_publisher(webhook);
        }

        let report = runner.run(since, true).await?;

        println!("Window: {}", report.window);
        println!("Tickets fetched: {}", report.tickets_fetched);

        if let Some(result) = &report.result {
            if !result.excluded.is_empty() {
                println!("Excluded as internal: {}", result.excluded.len());
                if verbose {
                    for item in &result.excluded {
                        println!("  {} {} ({})", item.ticket.id, item.ticket.title, item.reason);
                    }
                }
            }
        }

        match &report.message {
            Some(message) if report.delivered => {
                println!("Posted to Slack.");
                if verbose {
                    println!();
                    println!("{}", message);
                }
            }
            Some(message) => {
                println!();
                println!("{}", message);
            }
            None => {
                println!("Nothing customer-worthy this window.");
            }
        }

        if let Some(err) = report.delivery_error {
            anyhow::bail!("Notes drafted and state saved, but delivery failed: {}", err);
        }

        Ok(())
    }
}
