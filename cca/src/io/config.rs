//! Agent configuration.
//!
//! [`AgentConfig`] is assembled once at process start from command-line
//! flags, an optional `cca.toml` settings file and built-in defaults, then
//! handed to every component. Nothing below `main` reads the environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::completion::{CompletionError, OllamaClient, Strategy};

pub const DEFAULT_MODEL: &str = "devstral-small-2:24b-cloud";
pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
/// Settings file looked up in the current directory when `--config` is absent.
pub const SETTINGS_FILE: &str = "cca.toml";

/// Settings file contents (TOML). Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Model identifier passed to the completion service.
    pub model: String,
    /// Base URL of the Ollama server.
    pub host: String,
    /// Sampling temperature for pipeline stages (0 leans deterministic).
    pub temperature: f32,
    pub strategy: Strategy,
    /// Parent directory for auto-named project repositories.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            temperature: 0.0,
            strategy: Strategy::Direct,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host must be non-empty"));
        }
        validate_temperature(self.temperature)?;
        if self.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("output_dir must be non-empty"));
        }
        Ok(())
    }

    /// Overlay command-line values on top of the file/default values.
    pub fn apply(mut self, overrides: &SettingsOverrides) -> Result<Self> {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(strategy) = overrides.strategy {
            self.strategy = strategy;
        }
        self.validate()?;
        Ok(self)
    }

    /// Freeze these settings into the configuration for one repository.
    pub fn agent_config(&self, repo: impl Into<PathBuf>, verbose: bool) -> AgentConfig {
        AgentConfig {
            repo: repo.into(),
            model: self.model.clone(),
            host: self.host.clone(),
            temperature: self.temperature,
            verbose,
            strategy: self.strategy,
        }
    }
}

/// Values given explicitly on the command line (or via their env fallbacks).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub model: Option<String>,
    pub host: Option<String>,
    pub temperature: Option<f32>,
    pub strategy: Option<Strategy>,
}

/// Settings file to read: the explicit path, else `cca.toml` in `cwd`.
pub fn settings_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.join(SETTINGS_FILE))
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// Immutable per-invocation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Working directory of the generated project.
    pub repo: PathBuf,
    pub model: String,
    pub host: String,
    pub temperature: f32,
    pub verbose: bool,
    pub strategy: Strategy,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host must be non-empty"));
        }
        validate_temperature(self.temperature)
    }

    /// Client for pipeline stages, at the configured temperature.
    pub fn client(&self) -> Result<OllamaClient, CompletionError> {
        OllamaClient::new(self.model.clone(), &self.host, self.temperature)
    }

}

fn validate_temperature(temperature: f32) -> Result<()> {
    if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
        return Err(anyhow!(
            "temperature must be within 0.0..=2.0 (got {temperature})"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cca.toml");
        fs::write(&path, "model = \"llama3\"\nstrategy = \"chain\"\n").expect("write");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.strategy, Strategy::Chain);
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cca.toml");
        fs::write(&path, "temperature = 7.5\n").expect("write");
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn rejects_unknown_strategy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cca.toml");
        fs::write(&path, "strategy = \"magic\"\n").expect("write");
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cca.toml");
        fs::write(&path, "model = \"from-file\"\nhost = \"http://file:1\"\n").expect("write");
        let settings = load_settings(&path)
            .expect("load")
            .apply(&SettingsOverrides {
                model: Some("from-flag".to_string()),
                temperature: Some(0.3),
                ..SettingsOverrides::default()
            })
            .expect("apply");
        assert_eq!(settings.model, "from-flag");
        assert_eq!(settings.host, "http://file:1");
        assert_eq!(settings.temperature, 0.3);

        let cfg = settings.agent_config("output/demo", true);
        assert_eq!(cfg.repo, PathBuf::from("output/demo"));
        assert_eq!(cfg.model, "from-flag");
        assert!(cfg.verbose);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let err = Settings::default()
            .apply(&SettingsOverrides {
                temperature: Some(-1.0),
                ..SettingsOverrides::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn settings_path_prefers_explicit_file() {
        let cwd = Path::new("/work");
        assert_eq!(settings_path(None, cwd), PathBuf::from("/work/cca.toml"));
        assert_eq!(
            settings_path(Some(Path::new("other.toml")), cwd),
            PathBuf::from("other.toml")
        );
    }

    #[test]
    fn agent_config_validates_fields() {
        let cfg = AgentConfig {
            repo: PathBuf::from("output/x"),
            model: "m".to_string(),
            host: DEFAULT_HOST.to_string(),
            temperature: 0.2,
            verbose: false,
            strategy: Strategy::Direct,
        };
        cfg.validate().expect("valid");
        assert!(
            AgentConfig {
                model: " ".to_string(),
                ..cfg.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            AgentConfig {
                temperature: f32::NAN,
                ..cfg
            }
            .validate()
            .is_err()
        );
    }
}
