//! Interactive planning REPL
//!
//! Drives one planning session from the terminal in place of a web front end.

mod command;
mod display;
mod session;

pub use command::{ReplCommand, parse_command, split_city};
pub use session::PlanSession;

use std::sync::Arc;

use eyre::{Context, Result};

use crate::config::Config;
use crate::hotels::StubLodgingSource;
use crate::llm::create_client;
use crate::workflow::TripPlanner;

/// Run the interactive planner
///
/// This is the main entry point for `tp plan`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let planner = TripPlanner::new(config, llm, Arc::new(StubLodgingSource::new()));

    let mut session = PlanSession::new(planner)?;
    session.run().await
}
