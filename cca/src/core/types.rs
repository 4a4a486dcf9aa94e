//! Shared types passed between the inferencer, the pipeline and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal outcome of a pipeline run or a commit.
///
/// Always fully populated: `details` is safe to show to an end user whether
/// the run succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub ok: bool,
    pub details: String,
}

impl RunResult {
    pub fn success(details: impl Into<String>) -> Self {
        Self {
            ok: true,
            details: details.into(),
        }
    }

    pub fn failure(details: impl Into<String>) -> Self {
        Self {
            ok: false,
            details: details.into(),
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.details)
    }
}

/// Project name and module path resolved from a free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStructure {
    /// Normalized token string (lowercase, underscores).
    pub project_name: String,
    /// Relative path of the module, e.g. `src/app.py`.
    pub module_path: String,
}

/// How a [`ProjectStructure`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceOutcome {
    /// The completion service produced a usable answer.
    Inferred(ProjectStructure),
    /// The heuristic supplied the answer; `reason` says why the model answer was unusable.
    Fallback {
        structure: ProjectStructure,
        reason: String,
    },
}

impl InferenceOutcome {
    pub fn structure(&self) -> &ProjectStructure {
        match self {
            Self::Inferred(structure) | Self::Fallback { structure, .. } => structure,
        }
    }

    pub fn into_structure(self) -> ProjectStructure {
        match self {
            Self::Inferred(structure) | Self::Fallback { structure, .. } => structure,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Result of producing one scaffold file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Written,
    /// Generated text was empty or over its size bound; nothing was written.
    Rejected { reason: String },
    /// Generation or the write itself failed; nothing was written.
    Failed { error: String },
}

/// Per-file outcomes of the scaffold stage, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub artifacts: Vec<(String, ArtifactOutcome)>,
}

impl ScaffoldReport {
    pub fn record(&mut self, path: &str, outcome: ArtifactOutcome) {
        self.artifacts.push((path.to_string(), outcome));
    }

    pub fn outcome(&self, path: &str) -> Option<&ArtifactOutcome> {
        self.artifacts
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, outcome)| outcome)
    }

    /// Paths that ended up on disk.
    pub fn written(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|(_, outcome)| *outcome == ArtifactOutcome::Written)
            .map(|(path, _)| path.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure() -> ProjectStructure {
        ProjectStructure {
            project_name: "todo_app".to_string(),
            module_path: "src/app.py".to_string(),
        }
    }

    #[test]
    fn fallback_outcome_still_yields_structure() {
        let outcome = InferenceOutcome::Fallback {
            structure: structure(),
            reason: "bad json".to_string(),
        };
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_structure(), structure());
    }

    #[test]
    fn report_lists_only_written_artifacts() {
        let mut report = ScaffoldReport::default();
        report.record("requirements.txt", ArtifactOutcome::Written);
        report.record(
            "README.md",
            ArtifactOutcome::Rejected {
                reason: "empty".to_string(),
            },
        );
        report.record(".gitignore", ArtifactOutcome::Written);
        assert_eq!(report.written(), vec!["requirements.txt", ".gitignore"]);
        assert!(matches!(
            report.outcome("README.md"),
            Some(ArtifactOutcome::Rejected { .. })
        ));
    }
}
