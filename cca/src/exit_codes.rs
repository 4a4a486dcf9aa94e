//! Stable exit codes for `cca` commands.

/// The command's run result was successful.
pub const OK: i32 = 0;
/// The run result was a failure, or an error propagated (e.g. the completion
/// service was unreachable mid-pipeline).
pub const FAILED: i32 = 1;
