//! Git adapter for the generated project's working directory.
//!
//! A thin wrapper around `git` subprocess calls. Commit and push report the
//! captured output alongside the success flag instead of erroring, since the
//! caller shows that output to the user verbatim.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

/// Success flag plus the diagnostic text a git command printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            success: output.status.success(),
            output: combined_output(output),
        }
    }
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run `git init` in the working directory.
    #[instrument(skip_all, fields(workdir = %self.workdir.display()))]
    pub fn init(&self) -> Result<ToolOutput> {
        let out = ToolOutput::from_output(&self.run(&["init"])?);
        if !out.success {
            warn!(output = %out.output, "git init failed");
        }
        Ok(out)
    }

    /// Stage everything (respects .gitignore) and commit it with `message`.
    ///
    /// A failing `git add` is reported without attempting the commit.
    #[instrument(skip_all)]
    pub fn commit_all(&self, message: &str) -> Result<ToolOutput> {
        let add = ToolOutput::from_output(&self.run(&["add", "-A"])?);
        if !add.success {
            warn!(output = %add.output, "git add failed");
            return Ok(add);
        }
        debug!("committing staged changes");
        let commit = ToolOutput::from_output(&self.run(&["commit", "-m", message])?);
        if !commit.success {
            warn!(output = %commit.output, "git commit failed");
        }
        Ok(commit)
    }

    /// Push the current branch to its configured upstream.
    #[instrument(skip_all)]
    pub fn push(&self) -> Result<ToolOutput> {
        let push = ToolOutput::from_output(&self.run(&["push"])?);
        if !push.success {
            warn!(output = %push.output, "git push failed");
        }
        Ok(push)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

/// Trimmed stdout followed by trimmed stderr, skipping empty streams.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
