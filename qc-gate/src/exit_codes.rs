//! Stable exit codes for the hook entry points.

/// Operation allowed (also used for warnings and every fail-open path).
pub const ALLOW: i32 = 0;
/// Operation blocked; remediation text is on stderr.
pub const BLOCK: i32 = 2;
