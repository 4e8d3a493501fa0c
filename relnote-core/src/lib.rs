//! Relnote Core - Core library for release-notes automation
//!
//! This crate turns completed issue-tracker tickets into customer-facing
//! release notes through a model-driven filter, group, draft pipeline, and
//! orchestrates fetch, delivery, and run-state persistence around it.

pub mod config;
pub mod error;
pub mod meetings;
pub mod model;
pub mod pipeline;
pub mod publish;
pub mod retry;
pub mod run;
pub mod secrets;
pub mod state;
pub mod ticket;

pub use config::Config;
pub use error::{Error, Result};
pub use secrets::Secrets;
pub use state::{RunState, StateStore};
pub use ticket::{Assignee, Ticket, TicketSource, Window};
