//! Prompt builder for every completion stage.
//!
//! Templates are embedded at compile time and rendered with minijinja. All
//! functions here are pure: same inputs, same prompt.

use std::sync::LazyLock;

use minijinja::{Environment, Value, context};

const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
const DRAFT_TEMPLATE: &str = include_str!("prompts/draft.md");
const REVIEW_TEMPLATE: &str = include_str!("prompts/review.md");
const MANIFEST_TEMPLATE: &str = include_str!("prompts/manifest.md");
const README_TEMPLATE: &str = include_str!("prompts/readme.md");
const STRUCTURE_TEMPLATE: &str = include_str!("prompts/structure.md");

static ENGINE: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    for (name, source) in [
        ("plan", PLAN_TEMPLATE),
        ("draft", DRAFT_TEMPLATE),
        ("review", REVIEW_TEMPLATE),
        ("manifest", MANIFEST_TEMPLATE),
        ("readme", README_TEMPLATE),
        ("structure", STRUCTURE_TEMPLATE),
    ] {
        env.add_template(name, source)
            .expect("embedded prompt template should be valid");
    }
    env
});

fn render(name: &str, ctx: Value) -> String {
    ENGINE
        .get_template(name)
        .and_then(|template| template.render(ctx))
        .expect("prompt template rendering should not fail")
}

/// Stage 1: ask for an ordered implementation plan.
pub fn plan_prompt(description: &str, existing: &str, module_path: &str) -> String {
    render(
        "plan",
        context! {
            description => description,
            existing => existing,
            module_path => module_path,
        },
    )
}

/// Stage 2: ask for the full module following `plan`.
pub fn draft_prompt(description: &str, existing: &str, module_path: &str, plan: &str) -> String {
    render(
        "draft",
        context! {
            description => description,
            existing => existing,
            module_path => module_path,
            plan => plan,
        },
    )
}

/// Stage 3: ask for a reviewed (and possibly corrected) module.
pub fn review_prompt(description: &str, module_path: &str, plan: &str, draft: &str) -> String {
    render(
        "review",
        context! {
            description => description,
            module_path => module_path,
            plan => plan,
            draft => draft,
        },
    )
}

/// Scaffold: dependency manifest (`requirements.txt`).
pub fn manifest_prompt(description: &str, module_path: &str) -> String {
    render(
        "manifest",
        context! { description => description, module_path => module_path },
    )
}

/// Scaffold: `README.md`.
pub fn readme_prompt(description: &str, module_path: &str) -> String {
    render(
        "readme",
        context! { description => description, module_path => module_path },
    )
}

/// Structure inference: ask for `{"project_name", "module_path"}` as JSON.
pub fn structure_prompt(description: &str) -> String {
    render("structure", context! { description => description })
}
