//! Removal of Markdown code fences that models wrap around their answers.

const FENCE: &str = "```";

/// Strip a wrapping code fence from a model response.
///
/// If the trimmed text opens with a fence line (optionally carrying a language
/// tag such as ```` ```python ````), that line and a closing fence line at the
/// very end are dropped and everything in between is returned byte for byte.
/// A missing closing fence drops only the opening line. Text that does not
/// open with a fence is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return text.to_string();
    }
    let Some((_, body)) = trimmed.split_once('\n') else {
        // Nothing but the opening marker.
        return String::new();
    };
    match body.rfind('\n') {
        Some(idx) if is_fence_line(&body[idx + 1..]) => body[..idx].to_string(),
        None if is_fence_line(body) => String::new(),
        _ => body.to_string(),
    }
}

/// Return the content of the first fenced block, or the trimmed text when it
/// does not open with a fence.
///
/// Unlike [`strip_code_fences`] this ignores anything after the first closing
/// marker, which is what a JSON answer followed by commentary needs.
pub fn first_fenced_block(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .skip(1)
        .take_while(|line| !line.trim_start().starts_with(FENCE))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_fence_line(line: &str) -> bool {
    line.trim() == FENCE
}
