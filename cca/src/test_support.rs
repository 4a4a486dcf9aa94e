//! Test doubles for the completion service and the repository tools.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};

use crate::io::completion::{Completion, CompletionError};
use crate::io::git::ToolOutput;
use crate::io::workspace::Repository;

/// Completion that replays queued answers in order and records every prompt.
///
/// Running out of answers is reported as an API error so a test that makes
/// one call too many fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: RefCell<VecDeque<Result<String, String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.borrow_mut().push_back(Ok(text.into()));
        self
    }

    /// Queue a transport-style failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.borrow_mut().push_back(Err(message.into()));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl Completion for ScriptedCompletion {
    fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(CompletionError::Api {
                status: 503,
                message,
            }),
            None => Err(CompletionError::Api {
                status: 500,
                message: "scripted completion exhausted".to_string(),
            }),
        }
    }
}

/// Repository operation recorded by [`MemoryRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    Read(String),
    Write(String),
    Commit(String),
    Push,
}

/// In-memory repository with scripted commit/push results.
#[derive(Debug)]
pub struct MemoryRepository {
    files: RefCell<BTreeMap<String, String>>,
    calls: RefCell<Vec<RepoCall>>,
    commit_result: ToolOutput,
    push_result: ToolOutput,
    failing_writes: Vec<String>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            calls: RefCell::new(Vec::new()),
            commit_result: ToolOutput {
                success: true,
                output: "[main abc1234] commit".to_string(),
            },
            push_result: ToolOutput {
                success: true,
                output: "pushed".to_string(),
            },
            failing_writes: Vec::new(),
        }
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file before the run.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_commit_result(mut self, success: bool, output: &str) -> Self {
        self.commit_result = ToolOutput {
            success,
            output: output.to_string(),
        };
        self
    }

    pub fn with_push_result(mut self, success: bool, output: &str) -> Self {
        self.push_result = ToolOutput {
            success,
            output: output.to_string(),
        };
        self
    }

    /// Make writes to `path` fail with an I/O-style error.
    pub fn with_failing_write(mut self, path: &str) -> Self {
        self.failing_writes.push(path.to_string());
        self
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.borrow().clone()
    }

    /// Paths written, in order (repeats included).
    pub fn writes(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RepoCall::Write(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Repository for MemoryRepository {
    fn read(&self, path: &str) -> Result<String> {
        self.calls.borrow_mut().push(RepoCall::Read(path.to_string()));
        Ok(self.files.borrow().get(path).cloned().unwrap_or_default())
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(RepoCall::Write(path.to_string()));
        if self.failing_writes.iter().any(|p| p == path) {
            return Err(anyhow!("write {path}: permission denied"));
        }
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<ToolOutput> {
        self.calls
            .borrow_mut()
            .push(RepoCall::Commit(message.to_string()));
        Ok(self.commit_result.clone())
    }

    fn push(&self) -> Result<ToolOutput> {
        self.calls.borrow_mut().push(RepoCall::Push);
        Ok(self.push_result.clone())
    }
}

/// Temporary git repository with a committer identity configured.
pub struct TempProject {
    dir: tempfile::TempDir,
}

impl TempProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        let project = Self { dir };
        project.git(&["init"])?;
        project.git(&["config", "user.name", "cca tests"])?;
        project.git(&["config", "user.email", "cca@example.com"])?;
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, rel: &str, content: &str) -> Result<()> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))
    }

    /// Run a git command in the project and return its stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
