//! Command-line agent that turns a project description into a working module.
//!
//! The architecture keeps a strict split between pure logic and side effects:
//!
//! - **[`core`]**: Deterministic logic (fence stripping, naming, fallback
//!   heuristic, scaffold bounds). No I/O.
//! - **[`io`]**: Completion client, prompt templates, git, filesystem, config.
//!
//! [`infer`] and [`agent`] implement structure inference and the generation
//! pipeline; [`create`] and [`commit`] wire them to CLI commands.

pub mod agent;
pub mod commit;
pub mod core;
pub mod create;
pub mod exit_codes;
pub mod infer;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
