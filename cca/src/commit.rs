//! Orchestration for `cca commit`.

use anyhow::{Result, bail};

use crate::agent::Agent;
use crate::core::types::RunResult;
use crate::io::config::AgentConfig;

/// Message used when the user does not supply one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update project";

/// Commit everything in `cfg.repo` and optionally push it.
pub fn run_commit(cfg: &AgentConfig, message: Option<&str>, push: bool) -> Result<RunResult> {
    if !cfg.repo.is_dir() {
        bail!("repository {} does not exist", cfg.repo.display());
    }
    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_COMMIT_MESSAGE);
    let agent = Agent::from_config(cfg)?;
    agent.commit_and_push(message, push)
}
