//! Raw ticket listing for debugging a window

use chrono::{Duration, Utc};
use clap::Args;
use relnote_core::{Config, Secrets, TicketSource, Window};
use relnote_linear::LinearClient;

use super::{parse_since, require_secret};

/// List completed tickets in the window without drafting anything
#[derive(Args, Debug)]
pub struct TicketsArgs {
    /// Window start override (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,

    /// Days to look back when --since is absent
    #[arg(long, default_value_t = 7)]
    days: i64,
}

impl TicketsArgs {
    /// Execute the tickets command
    pub async fn execute(&self, _config: &Config) -> anyhow::Result<()> {
        let secrets = Secrets::load()?;
        let api_key = require_secret(secrets.linear_api_key(), "Linear API key", "LINEAR_API_KEY")?;

        let now = Utc::now();
        let start = match &self.since {
            Some(s) => parse_since(s)?,
            None => now - Duration::days(self.days),
        };
        let window = Window::new(start, now)?;

        let client = LinearClient::new(api_key)?;
        let tickets = client.completed_in_window(&window).await?;

        println!("Completed tickets {} ({} total)", window, tickets.len());
        println!();
        for ticket in &tickets {
            println!(
                "{}  {:<10} {}  [{} / {}]",
                ticket.completed_at.format("%Y-%m-%d"),
                ticket.id,
                ticket.title,
                ticket.team.as_deref().unwrap_or("-"),
                ticket.assignee_name(),
            );
        }

        Ok(())
    }
}
