//! Run-state inspection

use clap::Args;
use relnote_core::Config;

use super::state_store;

/// Show or clear the persisted run state
#[derive(Args, Debug)]
pub struct StateArgs {
    /// Remove the persisted state, forcing the next run to use the lookback
    #[arg(long)]
    clear: bool,
}

impl StateArgs {
    /// Execute the state command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = state_store(config)?;

        if self.clear {
            store.clear()?;
            println!("Run state cleared ({})", store.path().display());
            return Ok(());
        }

        match store.load()?.last_run {
            Some(ts) => println!("Last run: {}", ts.to_rfc3339()),
            None => println!("No runs recorded (state file: {})", store.path().display()),
        }

        Ok(())
    }
}
