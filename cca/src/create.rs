//! Orchestration for `cca create`.
//!
//! Resolves where the project lives (inferring what the user left out),
//! prepares the working directory as a git repository, and runs the agent.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::core::types::{InferenceOutcome, RunResult};
use crate::infer::infer_with_service;
use crate::io::config::{AgentConfig, Settings};
use crate::io::git::Git;
use crate::io::workspace::Workspace;

/// What the user asked for on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub description: String,
    pub module: Option<String>,
    pub repo: Option<PathBuf>,
}

/// Where the module will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub repo: PathBuf,
    pub module_path: String,
    /// Present when inference ran (repo or module was not given).
    pub inference: Option<InferenceOutcome>,
}

/// Fill in the repository and module path, inferring them only when missing.
pub fn resolve_target(request: &CreateRequest, settings: &Settings, now: NaiveDateTime) -> Target {
    if let (Some(repo), Some(module)) = (&request.repo, &request.module) {
        debug!("repo and module given, skipping inference");
        return Target {
            repo: repo.clone(),
            module_path: module.clone(),
            inference: None,
        };
    }

    let inference = infer_with_service(
        &settings.model,
        &settings.host,
        settings.strategy,
        &request.description,
    );
    let structure = inference.structure();
    let repo = request
        .repo
        .clone()
        .unwrap_or_else(|| repo_dir(&settings.output_dir, &structure.project_name, now));
    let module_path = request
        .module
        .clone()
        .unwrap_or_else(|| structure.module_path.clone());
    Target {
        repo,
        module_path,
        inference: Some(inference),
    }
}

/// `{output_dir}/{project_name}_{YYYYmmdd_HHMMSS}`.
pub fn repo_dir(output_dir: &Path, project_name: &str, now: NaiveDateTime) -> PathBuf {
    output_dir.join(format!("{project_name}_{}", now.format("%Y%m%d_%H%M%S")))
}

/// Create the repository directory and `git init` it if it did not exist.
///
/// An existing directory is used as is, repository or not.
///
/// A failing `git init` is logged; the pipeline can still write files.
pub fn prepare_repo(repo: &Path) -> Result<Workspace> {
    if !repo.exists() {
        fs::create_dir_all(repo)
            .with_context(|| format!("create repository directory {}", repo.display()))?;
        match Git::new(repo).init() {
            Ok(out) if out.success => info!(repo = %repo.display(), "initialized git repository"),
            Ok(out) => warn!(output = %out.output, "git init failed"),
            Err(err) => warn!(error = %format!("{err:#}"), "git init failed"),
        }
    }
    Workspace::ensure(repo)
}

/// Run the generation pipeline for an already resolved target.
pub fn run_create(cfg: &AgentConfig, description: &str, module_path: &str) -> Result<RunResult> {
    cfg.validate()?;
    prepare_repo(&cfg.repo)?;
    let agent = Agent::from_config(cfg)?;
    agent.create_program(description, module_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 10)
            .and_then(|d| d.and_hms_opt(12, 0, 5))
            .expect("valid timestamp")
    }

    fn offline_settings() -> Settings {
        Settings {
            host: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn repo_dir_is_timestamped() {
        let dir = repo_dir(Path::new("output"), "calculator", noon());
        assert_eq!(dir, PathBuf::from("output/calculator_20240210_120005"));
    }

    #[test]
    fn explicit_repo_and_module_skip_inference() {
        let request = CreateRequest {
            description: "anything".to_string(),
            module: Some("src/tool.py".to_string()),
            repo: Some(PathBuf::from("work/tool")),
        };
        let target = resolve_target(&request, &offline_settings(), noon());
        assert_eq!(target.repo, PathBuf::from("work/tool"));
        assert_eq!(target.module_path, "src/tool.py");
        assert!(target.inference.is_none());
    }

    #[test]
    fn missing_values_come_from_fallback_when_offline() {
        let request = CreateRequest {
            description: "streamlit weather dashboard".to_string(),
            module: None,
            repo: None,
        };
        let target = resolve_target(&request, &offline_settings(), noon());
        assert_eq!(
            target.repo,
            PathBuf::from("output/streamlit_weather_dashboard_20240210_120005")
        );
        assert_eq!(target.module_path, "src/app.py");
        assert!(target.inference.as_ref().is_some_and(InferenceOutcome::is_fallback));
    }

    #[test]
    fn user_module_is_kept_when_only_repo_is_inferred() {
        let request = CreateRequest {
            description: "calculator".to_string(),
            module: Some("lib/calc.py".to_string()),
            repo: None,
        };
        let target = resolve_target(&request, &offline_settings(), noon());
        assert_eq!(target.module_path, "lib/calc.py");
        assert!(target.repo.starts_with("output"));
    }

    #[test]
    fn prepare_repo_initializes_git_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("proj");
        let ws = prepare_repo(&repo).expect("prepare");
        assert!(ws.root().is_dir());
        assert!(repo.join(".git").exists());
        prepare_repo(&repo).expect("prepare again");
    }
}
