//! Snapshot of the environment controls the gate reads.

use std::path::PathBuf;

use crate::core::engine::Overrides;
use crate::core::session::SessionEnv;

pub const QC_OVERRIDE_VAR: &str = "CLAUDE_QC_OVERRIDE";
pub const MAIN_OVERRIDE_VAR: &str = "CLAUDE_MAIN_OVERRIDE";
pub const ENV_FILE_VAR: &str = "CLAUDE_ENV_FILE";
pub const QUALITY_CYCLE_MODE_VAR: &str = "QUALITY_CYCLE_MODE";

/// Environment values captured once per process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateEnv {
    pub qc_override: bool,
    pub main_override: bool,
    /// Raw context-store location; validated by the store.
    pub env_file: Option<PathBuf>,
    pub quality_cycle_mode: bool,
    pub home: Option<PathBuf>,
}

impl GateEnv {
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).as_deref() == Some("true");
        Self {
            qc_override: flag(QC_OVERRIDE_VAR),
            main_override: flag(MAIN_OVERRIDE_VAR),
            env_file: lookup(ENV_FILE_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            quality_cycle_mode: flag(QUALITY_CYCLE_MODE_VAR),
            home,
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            quality_cycle: self.qc_override,
            branch: self.main_override,
        }
    }

    pub fn session_env(&self) -> SessionEnv {
        SessionEnv {
            home: self.home.clone(),
            explicit_mode: self.quality_cycle_mode,
        }
    }

    /// `~/.claude`, the root for the debug log, audit log and config file.
    pub fn claude_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(".claude"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> GateEnv {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateEnv::from_lookup(|key| map.get(key).cloned(), Some(PathBuf::from("/home/dev")))
    }

    #[test]
    fn flags_require_exact_true() {
        let env = env_of(&[
            (QC_OVERRIDE_VAR, "true"),
            (MAIN_OVERRIDE_VAR, "1"),
            (QUALITY_CYCLE_MODE_VAR, "TRUE"),
        ]);
        assert!(env.qc_override);
        assert!(!env.main_override);
        assert!(!env.quality_cycle_mode);
    }

    #[test]
    fn empty_env_file_is_unset() {
        assert_eq!(env_of(&[(ENV_FILE_VAR, "")]).env_file, None);
        assert_eq!(
            env_of(&[(ENV_FILE_VAR, "/tmp/env")]).env_file,
            Some(PathBuf::from("/tmp/env"))
        );
    }

    #[test]
    fn overrides_mirror_flags() {
        let env = env_of(&[(MAIN_OVERRIDE_VAR, "true")]);
        assert_eq!(
            env.overrides(),
            Overrides {
                quality_cycle: false,
                branch: true
            }
        );
        assert_eq!(env.claude_dir(), Some(PathBuf::from("/home/dev/.claude")));
    }
}
