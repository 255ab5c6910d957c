//! Human-readable previews for dry-run and test-mode calls.

use crate::mode::OperatingMode;
use serde_json::Value;

/// What a mutating call would have done.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub mode: OperatingMode,
    pub label: String,
    pub targets: Vec<String>,
    pub details: Option<Value>,
}

impl Preview {
    pub fn new(mode: OperatingMode, label: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            mode,
            label: label.into(),
            targets,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Render the preview block.
    ///
    /// ```text
    /// DRY RUN - Sync site 4
    ///
    /// Would affect 1 target(s):
    ///   - 4
    ///
    /// Details:
    /// { ... }
    ///
    /// To execute this operation, set dry_run=false
    /// ```
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.targets.len() + 8);

        match self.mode {
            OperatingMode::TestMode => {
                lines.push(format!("TEST MODE - {}", self.label));
                lines.push(String::new());
                lines.push("Test mode is enabled. No changes were made.".to_string());
                lines.push(String::new());
            }
            _ => {
                lines.push(format!("DRY RUN - {}", self.label));
                lines.push(String::new());
            }
        }

        lines.push(format!("Would affect {} target(s):", self.targets.len()));
        lines.extend(self.targets.iter().map(|t| format!("  - {}", t)));

        if let Some(details) = &self.details {
            lines.push(String::new());
            lines.push("Details:".to_string());
            lines.push(serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string()));
        }

        lines.push(String::new());
        lines.push(match self.mode {
            OperatingMode::TestMode => "Disable TEST_MODE to execute this operation".to_string(),
            _ => "To execute this operation, set dry_run=false".to_string(),
        });

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dry_run_block() {
        let preview = Preview::new(
            OperatingMode::DryRun,
            "Activate plugins on 4",
            vec!["akismet".into(), "jetpack".into()],
        )
        .with_details(json!({"site": "4"}));

        assert_eq!(
            preview.render(),
            "DRY RUN - Activate plugins on 4\n\
             \n\
             Would affect 2 target(s):\n  - akismet\n  - jetpack\n\
             \n\
             Details:\n{\n  \"site\": \"4\"\n}\n\
             \n\
             To execute this operation, set dry_run=false"
        );
    }

    #[test]
    fn test_mode_block_without_details() {
        let text = Preview::new(OperatingMode::TestMode, "Sync all sites", vec!["all sites".into()])
            .render();

        assert!(text.starts_with("TEST MODE - Sync all sites\n\nTest mode is enabled."));
        assert!(text.contains("Would affect 1 target(s):\n  - all sites"));
        assert!(!text.contains("Details:"));
        assert!(text.ends_with("Disable TEST_MODE to execute this operation"));
    }
}
