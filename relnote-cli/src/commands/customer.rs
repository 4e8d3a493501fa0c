//! Customer-tailored release-notes command

use clap::Args;
use relnote_core::model::AnthropicClient;
use relnote_core::run::Runner;
use relnote_core::Config;
use relnote_linear::LinearClient;
use relnote_slack::SlackWebhook;

use super::{parse_since, state_store, RunSecrets};

/// Generate release notes tailored to one customer
#[derive(Args, Debug)]
pub struct CustomerArgs {
    /// Customer name (matched against configured meeting-folder aliases)
    name: String,

    /// Window start override (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,

    /// Days of tickets and meetings to look back
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// Post to Slack instead of printing
    #[arg(long)]
    slack: bool,
}

impl CustomerArgs {
    /// Execute the customer command
    ///
    /// Previews never advance run state; only a delivered run does.
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let secrets = RunSecrets::load()?;
        let since = self.since.as_deref().map(parse_since).transpose()?;

        let source = LinearClient::new(secrets.linear_api_key)?;
        let model = AnthropicClient::new(secrets.anthropic_api_key, config.model.clone())?;
        let store = state_store(config)?;

        let webhook = if self.slack {
            let url = secrets.slack_webhook_url.ok_or_else(|| {
                anyhow::anyhow!("--slack requires a webhook. Set SLACK_WEBHOOK_URL or add it to secrets.toml")
            })?;
            Some(SlackWebhook::new(url)?)
        } else {
            None
        };

        let mut runner = Runner::new(&source, &model, store, config.clone());
        if let Some(webhook) = webhook.as_ref() {
            runner = runner.with_publisher(webhook);
        }

        let report = runner
            .run_customer(&self.name, self.days, since, self.slack)
            .await?;

        println!("Window: {}", report.window);
        println!("Tickets fetched: {}", report.tickets_fetched);

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
                println!("Nothing customer-worthy for {} this window.", self.name);
            }
        }

        if let Some(err) = report.delivery_error {
            anyhow::bail!("Notes drafted and state saved, but delivery failed: {}", err);
        }

        Ok(())
    }
}
