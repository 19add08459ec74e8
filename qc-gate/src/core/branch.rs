//! Branch-name protection policy.

use std::path::Path;

use crate::core::types::{BranchClass, BranchState};

/// Branches where direct writes are refused.
pub const PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop", "production"];
/// Branch-name prefixes treated like [`PROTECTED_BRANCHES`].
pub const PROTECTED_PREFIXES: &[&str] = &["release/"];
/// Writes are allowed here but the user is nudged toward a feature branch.
pub const WARN_BRANCH: &str = "staging";

/// Capability to classify the branch that owns a path.
///
/// Implementations must degrade to [`BranchClass::NotInRepo`] on any failure,
/// never to [`BranchClass::Protected`].
pub trait BranchClassifier {
    fn classify(&self, path: &Path) -> BranchState;
}

/// Classify a branch (or ref) name.
pub fn classify_branch_name(name: &str) -> BranchClass {
    if PROTECTED_BRANCHES.contains(&name) {
        return BranchClass::Protected;
    }
    if PROTECTED_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        return BranchClass::Protected;
    }
    if name == WARN_BRANCH {
        return BranchClass::WarnOnly;
    }
    BranchClass::Unprotected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_names() {
        for name in ["main", "master", "develop", "production", "release/1.2"] {
            assert_eq!(classify_branch_name(name), BranchClass::Protected, "{name}");
        }
    }

    #[test]
    fn staging_warns() {
        assert_eq!(classify_branch_name("staging"), BranchClass::WarnOnly);
    }

    #[test]
    fn everything_else_is_unprotected() {
        for name in ["feature/x", "mainline", "Main", "releases", "HEAD", "staging-2"] {
            assert_eq!(classify_branch_name(name), BranchClass::Unprotected, "{name}");
        }
    }
}
