//! Scaffold file names, size bounds and the fixed ignore-file.

use crate::core::fence::strip_code_fences;

pub const MANIFEST_PATH: &str = "requirements.txt";
pub const README_PATH: &str = "README.md";
pub const IGNORE_FILE_PATH: &str = ".gitignore";

/// Generated manifests at or above this many characters are discarded.
pub const MANIFEST_MAX_CHARS: usize = 1000;
/// Generated readmes at or above this many characters are discarded.
pub const README_MAX_CHARS: usize = 5000;

/// Check generated scaffold text against its size bound.
///
/// Returns the text to write, or the reason it was rejected.
pub fn accept_artifact(raw: &str, max_chars: usize) -> Result<String, String> {
    let text = strip_code_fences(raw.trim());
    let text = text.trim();
    if text.is_empty() {
        return Err("model returned no content".to_string());
    }
    let chars = text.chars().count();
    if chars >= max_chars {
        return Err(format!("{chars} characters exceeds limit of {max_chars}"));
    }
    Ok(text.to_string())
}

pub const IGNORE_FILE: &str = "\
# Python
__pycache__/
*.py[cod]
*$py.class
*.so
.Python
build/
develop-eggs/
dist/
downloads/
eggs/
.eggs/
lib/
lib64/
parts/
sdist/
var/
wheels/
*.egg-info/
.installed.cfg
*.egg
MANIFEST

# Virtual Environment
venv/
ENV/
env/
.venv

# IDEs
.vscode/
.idea/
*.swp
*.swo
*~
.DS_Store

# Testing
.pytest_cache/
.coverage
htmlcov/
.tox/
.hypothesis/

# Environment
.env
.env.local

# Logs
*.log
";
