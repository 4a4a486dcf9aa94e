//! Project naming, module-path normalization and the heuristic structure
//! used when the model cannot be asked (or answers nonsense).

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::ProjectStructure;

/// Directory every generated module lives under.
pub const SOURCE_DIR_PREFIX: &str = "src/";
/// Suffix every generated module carries.
pub const SOURCE_SUFFIX: &str = ".py";

pub const APP_MODULE_PATH: &str = "src/app.py";
pub const CALCULATOR_MODULE_PATH: &str = "src/calculator.py";
pub const DEFAULT_MODULE_PATH: &str = "src/main.py";
pub const DEFAULT_PROJECT_NAME: &str = "project";

/// Words that never contribute to a heuristic project name.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "with", "for", "to", "in", "on", "of", "and", "or", "create", "make",
];

/// Descriptions mentioning any of these get the app module.
const WEB_KEYWORDS: &[&str] = &["streamlit", "web", "dashboard"];

const MAX_NAME_TOKENS: usize = 4;

/// Turn arbitrary text into a directory-safe token string.
///
/// Lowercases, drops everything except word characters, whitespace and `-`,
/// collapses whitespace/hyphen runs into one `_`, and trims `_` from both
/// ends. Applying it twice gives the same result as applying it once.
pub fn sanitize_name(text: &str) -> String {
    static DISALLOWED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid disallowed-char regex"));
    static SEPARATORS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid separator regex"));

    let lowered = text.to_lowercase();
    let kept = DISALLOWED.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(&kept, "_");
    joined.trim_matches('_').to_string()
}

/// Ensure a module path sits under `src/` and ends in `.py`.
///
/// `calculator` becomes `src/calculator.py`; an already-normalized path is
/// returned unchanged.
pub fn normalize_module_path(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let mut normalized = if trimmed.starts_with(SOURCE_DIR_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{SOURCE_DIR_PREFIX}{trimmed}")
    };
    if !normalized.ends_with(SOURCE_SUFFIX) {
        normalized.push_str(SOURCE_SUFFIX);
    }
    normalized
}

/// True if `path` is relative and never climbs out of its base directory.
pub fn is_contained_relative_path(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Deterministic structure derived from the description alone. Never fails.
pub fn fallback_structure(description: &str) -> ProjectStructure {
    let lowered = description.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .take(MAX_NAME_TOKENS)
        .collect();
    let project_name = project_name_or_default(&tokens.join("_"));

    let module_path = if WEB_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        APP_MODULE_PATH
    } else if lowered.contains("calculator") {
        CALCULATOR_MODULE_PATH
    } else {
        DEFAULT_MODULE_PATH
    };

    ProjectStructure {
        project_name,
        module_path: module_path.to_string(),
    }
}

/// Sanitize `raw`, substituting the default name when nothing survives.
pub fn project_name_or_default(raw: &str) -> String {
    let name = sanitize_name(raw);
    if name.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        name
    }
}
