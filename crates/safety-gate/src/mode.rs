//! Operating-mode resolution.

use gateway_config_and_utils::SafetyPolicy;
use serde::Serialize;
use std::fmt;

/// How a single invocation is allowed to behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Mutations are sent to the remote API.
    Live,
    /// The caller (or the process default) asked for a preview.
    DryRun,
    /// The process is in test mode; everything is a preview.
    TestMode,
}

impl OperatingMode {
    /// True for every mode that must not mutate remote state.
    pub fn is_preview(self) -> bool {
        !matches!(self, OperatingMode::Live)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatingMode::Live => "live",
            OperatingMode::DryRun => "dry run",
            OperatingMode::TestMode => "test mode",
        })
    }
}

/// Resolves the operating mode of each call.
#[derive(Debug, Clone, Copy)]
pub struct SafetyGate {
    test_mode: bool,
    dry_run_by_default: bool,
}

impl SafetyGate {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            test_mode: policy.test_mode,
            dry_run_by_default: policy.dry_run_by_default,
        }
    }

    /// Test mode wins unconditionally, then an explicit flag, then the
    /// process default.
    pub fn resolve(&self, explicit_dry_run: Option<bool>) -> OperatingMode {
        if self.test_mode {
            return OperatingMode::TestMode;
        }
        match explicit_dry_run.unwrap_or(self.dry_run_by_default) {
            true => OperatingMode::DryRun,
            false => OperatingMode::Live,
        }
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(test_mode: bool, dry_run_by_default: bool) -> SafetyGate {
        SafetyGate::new(SafetyPolicy {
            test_mode,
            dry_run_by_default,
            require_bulk_confirmation: false,
        })
    }

    #[test]
    fn test_mode_ignores_explicit_flag() {
        let gate = gate(true, false);
        for explicit in [None, Some(true), Some(false)] {
            assert_eq!(gate.resolve(explicit), OperatingMode::TestMode);
        }
    }

    #[test]
    fn explicit_flag_overrides_default() {
        assert_eq!(gate(false, true).resolve(Some(false)), OperatingMode::Live);
        assert_eq!(gate(false, false).resolve(Some(true)), OperatingMode::DryRun);
    }

    #[test]
    fn absent_flag_uses_default() {
        assert_eq!(gate(false, true).resolve(None), OperatingMode::DryRun);
        assert_eq!(gate(false, false).resolve(None), OperatingMode::Live);
    }

    #[test]
    fn preview_modes() {
        assert!(!OperatingMode::Live.is_preview());
        assert!(OperatingMode::DryRun.is_preview());
        assert!(OperatingMode::TestMode.is_preview());
    }

    #[test]
    fn full_precedence_table() {
        for test_mode in [false, true] {
            for default in [false, true] {
                for explicit in [None, Some(false), Some(true)] {
                    let expected = if test_mode {
                        OperatingMode::TestMode
                    } else if explicit.unwrap_or(default) {
                        OperatingMode::DryRun
                    } else {
                        OperatingMode::Live
                    };
                    assert_eq!(gate(test_mode, default).resolve(explicit), expected);
                }
            }
        }
    }
}
