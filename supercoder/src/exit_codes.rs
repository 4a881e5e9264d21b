//! Stable exit codes for the supercoder CLI.

/// The pipeline produced a passing program.
pub const OK: i32 = 0;
/// Invalid usage/config, or a resource fault aborted the run.
pub const INVALID: i32 = 1;
/// The attempt budget was exhausted without a passing program.
pub const UNSOLVED: i32 = 2;
