//! Plugin and theme operations.

use crate::ops::sites::blank;
use crate::outcome::Outcome;
use crate::tools::{split_list, FleetTools};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteListingParams {
    pub site: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TogglePluginsParams {
    pub site: String,
    /// Comma-separated plugin slugs.
    pub plugins: String,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageParams {
    pub site: String,
    pub slug: String,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateThemeParams {
    pub site: String,
    pub theme: String,
    pub dry_run: Option<bool>,
}

/// Whether a package operation targets plugins or themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Plugin,
    Theme,
}

impl PackageKind {
    fn noun(self) -> &'static str {
        match self {
            PackageKind::Plugin => "plugin",
            PackageKind::Theme => "theme",
        }
    }

    fn capitalized(self) -> &'static str {
        match self {
            PackageKind::Plugin => "Plugin",
            PackageKind::Theme => "Theme",
        }
    }
}

/// Install or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAction {
    Install,
    Delete,
}

impl PackageAction {
    fn path(self) -> &'static str {
        match self {
            PackageAction::Install => "install",
            PackageAction::Delete => "delete",
        }
    }
}

impl FleetTools {
    pub async fn plugins_list(&self, params: SiteListingParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid("Site ID or domain is required");
        }
        let result = self.client.list_plugins(&params.site).await;
        Outcome::from_read(format!("Failed to list plugins on {}", params.site), result)
    }

    pub async fn themes_list(&self, params: SiteListingParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid("Site ID or domain is required");
        }
        let result = self.client.list_themes(&params.site).await;
        Outcome::from_read(format!("Failed to list themes on {}", params.site), result)
    }

    /// `activate == false` deactivates. More than one plugin is a bulk call.
    pub async fn plugins_toggle(&self, activate: bool, params: TogglePluginsParams) -> Outcome {
        let (verb, past, action) = if activate {
            ("Activate", "activated", "activate")
        } else {
            ("Deactivate", "deactivated", "deactivate")
        };
        let plugins = split_list(&params.plugins);
        if plugins.is_empty() {
            return Outcome::invalid("At least one plugin slug is required");
        }
        if let Err(e) = self.guard.check(plugins.len(), params.confirmed) {
            return Outcome::from_guard(e);
        }

        let site = params.site.as_str();
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("{verb} plugins on {site}"),
                plugins,
                Some(json!({ "site": site, "action": action })),
            );
        }

        match self.client.toggle_plugins(site, action, &plugins).await {
            Ok(result) => {
                let message = format!("Successfully {past} {} plugin(s) on {site}", plugins.len());
                info!(%message, "Fleet mutation applied");
                Outcome::success(json!({
                    "message": message,
                    "plugins": plugins,
                    "result": result,
                }))
            }
            Err(e) => Outcome::from_client(format!("Failed to {action} plugins on {site}"), &e),
        }
    }

    pub async fn package(
        &self,
        kind: PackageKind,
        action: PackageAction,
        params: PackageParams,
    ) -> Outcome {
        let slug = params.slug.trim();
        if slug.is_empty() {
            return Outcome::invalid(format!("{} slug is required", kind.capitalized()));
        }
        let site = params.site.as_str();
        let noun = kind.noun();
        let (label, done, failed) = match action {
            PackageAction::Install => (
                format!("Install {noun} \"{slug}\" on {site}"),
                format!("Successfully installed {noun} \"{slug}\" on {site}"),
                format!("Failed to install {noun} \"{slug}\" on {site}"),
            ),
            PackageAction::Delete => (
                format!("Delete {noun} \"{slug}\" from {site}"),
                format!("Successfully deleted {noun} \"{slug}\" from {site}"),
                format!("Failed to delete {noun} \"{slug}\" from {site}"),
            ),
        };

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                label,
                vec![slug.to_string()],
                Some(json!({ "site": site, "action": action.path() })),
            );
        }

        let result = match kind {
            PackageKind::Plugin => self.client.plugin_package(site, action.path(), slug).await,
            PackageKind::Theme => self.client.theme_package(site, action.path(), slug).await,
        };
        match result {
            Ok(result) => Outcome::applied(done, result),
            Err(e) => Outcome::from_client(failed, &e),
        }
    }

    pub async fn themes_activate(&self, params: ActivateThemeParams) -> Outcome {
        let theme = params.theme.trim();
        if theme.is_empty() {
            return Outcome::invalid("Theme slug is required");
        }
        let site = params.site.as_str();
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Activate theme on {site}"),
                vec![theme.to_string()],
                Some(json!({ "site": site, "action": "activate" })),
            );
        }
        match self.client.activate_theme(site, theme).await {
            Ok(result) => Outcome::applied(
                format!("Successfully activated theme \"{theme}\" on {site}"),
                result,
            ),
            Err(e) => Outcome::from_client(format!("Failed to activate theme on {site}"), &e),
        }
    }
}
