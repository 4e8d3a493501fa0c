//! Relnote Slack - Slack webhook delivery for relnote
//!
//! Posts finished release notes to an incoming webhook and exposes the
//! webhook through the core publisher seam.

mod error;
mod webhook;

pub use error::{Error, Result};
pub use webhook::SlackWebhook;
