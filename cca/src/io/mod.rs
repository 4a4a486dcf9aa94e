//! Side-effecting adapters: completion service, prompts, git, filesystem, config.

pub mod completion;
pub mod config;
pub mod git;
pub mod prompt;
pub mod workspace;
