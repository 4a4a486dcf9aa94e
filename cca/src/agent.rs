//! Generation pipeline: scaffold, then plan → draft → review → write.
//!
//! Stages run strictly in order and every intermediate artifact stays in
//! memory. The module file is written once, after the review stage returns
//! non-empty code; an empty stage output ends the run with a failed
//! [`RunResult`] and a transport error propagates as `Err` without touching
//! the module file. Scaffold failures are logged and skipped.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::fence::strip_code_fences;
use crate::core::scaffold::{
    IGNORE_FILE, IGNORE_FILE_PATH, MANIFEST_MAX_CHARS, MANIFEST_PATH, README_MAX_CHARS,
    README_PATH, accept_artifact,
};
use crate::core::types::{ArtifactOutcome, RunResult, ScaffoldReport};
use crate::io::completion::Completion;
use crate::io::config::AgentConfig;
use crate::io::prompt::{draft_prompt, manifest_prompt, plan_prompt, readme_prompt, review_prompt};
use crate::io::workspace::{Repository, Workspace};

pub const EMPTY_PLAN: &str = "Model returned empty plan.";
pub const EMPTY_DRAFT: &str = "Model returned empty module draft.";
pub const EMPTY_FINAL: &str = "Model returned empty final module.";
pub const COMMIT_OK: &str = "Commit succeeded.";
pub const COMMIT_AND_PUSH_OK: &str = "Commit and push succeeded.";
pub const PUSH_FAILED_PREFIX: &str = "Commit succeeded, but push failed:";

/// The agent: one completion client and one repository for one invocation.
pub struct Agent<C, R> {
    client: C,
    repo: R,
}

impl Agent<Box<dyn Completion>, Workspace> {
    /// Build the agent for `cfg.repo` with the configured execution strategy.
    pub fn from_config(cfg: &AgentConfig) -> Result<Self> {
        let client = cfg.client().context("build completion client")?;
        Ok(Self::new(cfg.strategy.wrap(client), Workspace::new(&cfg.repo)))
    }
}

impl<C: Completion, R: Repository> Agent<C, R> {
    pub fn new(client: C, repo: R) -> Self {
        Self { client, repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create or update the module at `module_path` from `description`.
    ///
    /// Scaffold files are generated first when the module does not exist yet
    /// (reads as empty).
    #[instrument(skip_all, fields(module_path))]
    pub fn create_program(&self, description: &str, module_path: &str) -> Result<RunResult> {
        let existing = self.repo.read(module_path)?;
        if existing.is_empty() {
            info!("new project, generating scaffold files");
            self.generate_scaffold(description, module_path);
        }

        let plan = self
            .run_stage("plan", &plan_prompt(description, &existing, module_path))?
            .trim()
            .to_string();
        if plan.is_empty() {
            return Ok(RunResult::failure(EMPTY_PLAN));
        }

        let draft_raw = self.run_stage(
            "draft",
            &draft_prompt(description, &existing, module_path, &plan),
        )?;
        let draft = strip_code_fences(&draft_raw);
        if draft.trim().is_empty() {
            return Ok(RunResult::failure(EMPTY_DRAFT));
        }

        let final_raw = self.run_stage(
            "review",
            &review_prompt(description, module_path, &plan, &draft),
        )?;
        let final_code = strip_code_fences(&final_raw);
        let final_code = final_code.trim_end();
        if final_code.trim().is_empty() {
            return Ok(RunResult::failure(EMPTY_FINAL));
        }

        self.repo.write(module_path, &format!("{final_code}\n"))?;
        info!(module_path, "module written");
        Ok(RunResult::success(format!("Wrote module: {module_path}")))
    }

    /// Generate `requirements.txt`, `README.md` and the fixed `.gitignore`.
    ///
    /// Never fails: each file is attempted independently and its outcome
    /// recorded in the report.
    #[instrument(skip_all)]
    pub fn generate_scaffold(&self, description: &str, module_path: &str) -> ScaffoldReport {
        let mut report = ScaffoldReport::default();

        let generated = [
            (
                MANIFEST_PATH,
                manifest_prompt(description, module_path),
                MANIFEST_MAX_CHARS,
            ),
            (
                README_PATH,
                readme_prompt(description, module_path),
                README_MAX_CHARS,
            ),
        ];
        for (path, prompt, max_chars) in generated {
            let outcome = self.generated_artifact(path, &prompt, max_chars);
            log_artifact(path, &outcome);
            report.record(path, outcome);
        }

        let outcome = match self.repo.write(IGNORE_FILE_PATH, IGNORE_FILE) {
            Ok(()) => ArtifactOutcome::Written,
            Err(err) => ArtifactOutcome::Failed {
                error: format!("{err:#}"),
            },
        };
        log_artifact(IGNORE_FILE_PATH, &outcome);
        report.record(IGNORE_FILE_PATH, outcome);

        report
    }

    /// Commit pending changes and optionally push them.
    ///
    /// A failed push leaves the commit in place.
    #[instrument(skip_all, fields(push))]
    pub fn commit_and_push(&self, message: &str, push: bool) -> Result<RunResult> {
        let commit = self.repo.commit(message)?;
        if !commit.success {
            return Ok(RunResult::failure(commit.output));
        }
        if !push {
            return Ok(RunResult::success(COMMIT_OK));
        }

        let pushed = self.repo.push()?;
        if !pushed.success {
            return Ok(RunResult::failure(format!(
                "{PUSH_FAILED_PREFIX}\n{}",
                pushed.output
            )));
        }
        Ok(RunResult::success(COMMIT_AND_PUSH_OK))
    }

    fn generated_artifact(&self, path: &str, prompt: &str, max_chars: usize) -> ArtifactOutcome {
        let raw = match self.client.generate(prompt) {
            Ok(raw) => raw,
            Err(err) => {
                return ArtifactOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };
        let text = match accept_artifact(&raw, max_chars) {
            Ok(text) => text,
            Err(reason) => return ArtifactOutcome::Rejected { reason },
        };
        match self.repo.write(path, &format!("{text}\n")) {
            Ok(()) => ArtifactOutcome::Written,
            Err(err) => ArtifactOutcome::Failed {
                error: format!("{err:#}"),
            },
        }
    }

    fn run_stage(&self, stage: &str, prompt: &str) -> Result<String> {
        debug!(stage, %prompt, "stage prompt");
        let response = self
            .client
            .generate(prompt)
            .with_context(|| format!("{stage} stage"))?;
        debug!(stage, %response, "stage response");
        Ok(response)
    }
}

fn log_artifact(path: &str, outcome: &ArtifactOutcome) {
    match outcome {
        ArtifactOutcome::Written => info!(path, "scaffold file written"),
        ArtifactOutcome::Rejected { reason } => warn!(path, %reason, "scaffold file skipped"),
        ArtifactOutcome::Failed { error } => warn!(path, %error, "scaffold file failed"),
    }
}
