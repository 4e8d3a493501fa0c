//! Relnote Linear - Linear issue-tracker integration for relnote
//!
//! This crate fetches completed issues from the Linear GraphQL API and
//! exposes them through the core ticket-source seam.

mod client;
mod error;
mod tickets;

pub use client::LinearClient;
pub use error::{Error, Result};
