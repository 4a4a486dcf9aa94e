//! `cca`: natural-language code generation from the command line.
//!
//! `cca create` infers a project layout from a description, scaffolds a new
//! repository and runs the plan/draft/review pipeline against a local Ollama
//! server. `cca commit` commits (and optionally pushes) the result.

use std::path::PathBuf;

use anyhow::{Result, bail};
use cca::commit::run_commit;
use cca::core::types::{InferenceOutcome, RunResult};
use cca::create::{CreateRequest, resolve_target, run_create};
use cca::exit_codes;
use cca::io::completion::Strategy;
use cca::io::config::{Settings, SettingsOverrides, load_settings, settings_path};
use cca::logging;
use clap::{Parser, Subcommand};

const EXAMPLES: &str = "\
Examples:
  cca create \"calculator with basic operations\"
  cca create \"streamlit weather dashboard\"
  cca --repo output/my_todo create \"todo app\"
  cca --repo output/calculator_20240210_120000 commit
  cca --repo output/calculator_20240210_120000 commit \"Add memory keys\" --push";

#[derive(Parser)]
#[command(
    name = "cca",
    version,
    about = "Natural-language code generation agent",
    after_help = EXAMPLES
)]
struct Cli {
    /// Repository path (auto-generated for `create` if omitted).
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Ollama model.
    #[arg(long, global = true, env = "OLLAMA_MODEL")]
    model: Option<String>,

    /// Ollama host.
    #[arg(long, global = true, env = "OLLAMA_HOST")]
    host: Option<String>,

    /// Sampling temperature for generation stages.
    #[arg(long, global = true, env = "OLLAMA_TEMPERATURE")]
    temperature: Option<f32>,

    /// How completion calls run: `direct` or `chain`.
    #[arg(long, global = true, env = "CCA_STRATEGY")]
    strategy: Option<Strategy>,

    /// Settings file (defaults to `cca.toml` in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log stage prompts and raw model responses.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update a module from a natural-language description.
    Create {
        /// What to create (e.g. "calculator app").
        description: String,
        /// Module path (inferred if omitted).
        #[arg(long)]
        module: Option<String>,
    },
    /// Commit and optionally push changes.
    Commit {
        /// Commit message (defaults to "Update project").
        message: Option<String>,
        /// Also run `git push`.
        #[arg(long)]
        push: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let settings = resolve_settings(&cli)?;
    match cli.command {
        Command::Create {
            ref description,
            ref module,
        } => cmd_create(&cli, &settings, description, module.clone()),
        Command::Commit { ref message, push } => {
            cmd_commit(&cli, &settings, message.as_deref(), push)
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    if let Some(missing) = cli.config.as_deref().filter(|path| !path.exists()) {
        bail!("config file {} not found", missing.display());
    }
    let path = settings_path(cli.config.as_deref(), &cwd);
    load_settings(&path)?.apply(&SettingsOverrides {
        model: cli.model.clone(),
        host: cli.host.clone(),
        temperature: cli.temperature,
        strategy: cli.strategy,
    })
}

fn cmd_create(
    cli: &Cli,
    settings: &Settings,
    description: &str,
    module: Option<String>,
) -> Result<i32> {
    println!("Analyzing project description...");
    let request = CreateRequest {
        description: description.to_string(),
        module,
        repo: cli.repo.clone(),
    };
    let target = resolve_target(&request, settings, chrono::Local::now().naive_local());
    if target
        .inference
        .as_ref()
        .is_some_and(InferenceOutcome::is_fallback)
    {
        println!("Could not infer structure from the model, used heuristic defaults.");
    }
    println!("Repository: {}", target.repo.display());
    println!("Module: {}", target.module_path);
    println!("\n{}\nCreating: {description}\n{}\n", "=".repeat(60), "=".repeat(60));

    let cfg = settings.agent_config(&target.repo, cli.verbose);
    let result = run_create(&cfg, description, &target.module_path)?;
    let code = report(&result);
    if result.ok {
        println!("\n{}", "=".repeat(60));
        println!("Success! Next steps:");
        println!(
            "1. Review code: {}",
            target.repo.join(&target.module_path).display()
        );
        println!("2. Commit: cca --repo {} commit", target.repo.display());
        println!("{}\n", "=".repeat(60));
    }
    Ok(code)
}

fn cmd_commit(
    cli: &Cli,
    settings: &Settings,
    message: Option<&str>,
    push: bool,
) -> Result<i32> {
    let Some(repo) = &cli.repo else {
        bail!("--repo is required for the commit command");
    };
    let cfg = settings.agent_config(repo, cli.verbose);
    let result = run_commit(&cfg, message, push)?;
    Ok(report(&result))
}

/// Print the run result on the matching stream and map it to an exit code.
fn report(result: &RunResult) -> i32 {
    if result.ok {
        println!("{result}");
        exit_codes::OK
    } else {
        eprintln!("{result}");
        exit_codes::FAILED
    }
}
