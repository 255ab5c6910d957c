//! Tool registry and dispatcher.

use crate::ops::plugins::{PackageAction, PackageKind};
use crate::ops::sites::SiteAction;
use crate::ops::updates::UpdateStep;
use crate::outcome::{Outcome, ToolResult};
use crate::tools::FleetTools;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// A registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

const fn tool(name: &'static str, description: &'static str) -> ToolSpec {
    ToolSpec { name, description }
}

/// Every tool, in listing order.
pub const TOOLS: &[ToolSpec] = &[
    // Sites
    tool("sites_list", "List all WordPress sites managed by the dashboard"),
    tool("sites_get", "Get detailed information about a specific site"),
    tool("sites_count", "Get the total count of connected sites"),
    tool("sites_sync", "Sync one site, or every site when none is given"),
    tool("sites_bulk_sync", "Sync a comma-separated list of sites, reporting per site"),
    tool("sites_check", "Check the health and connectivity status of a site"),
    tool("sites_add", "Add a new WordPress site to the dashboard"),
    tool("sites_reconnect", "Reconnect to a site that has lost connection"),
    tool("sites_disconnect", "Disconnect a site from the dashboard (keeps site data)"),
    tool("sites_suspend", "Suspend a site (disable monitoring and updates)"),
    tool("sites_unsuspend", "Unsuspend a site (re-enable monitoring and updates)"),
    tool("sites_edit", "Edit site settings (name, groups)"),
    tool("sites_changes", "List changes made outside the dashboard"),
    tool("sites_remove", "Permanently remove a site (requires confirmation)"),
    // Plugins
    tool("plugins_list", "List installed plugins on a site"),
    tool("plugins_activate", "Activate one or more plugins on a site"),
    tool("plugins_deactivate", "Deactivate one or more plugins on a site"),
    tool("plugins_install", "Install a plugin on a site"),
    tool("plugins_delete", "Delete a plugin from a site"),
    // Themes
    tool("themes_list", "List installed themes on a site"),
    tool("themes_activate", "Activate a theme on a site"),
    tool("themes_install", "Install a theme on a site"),
    tool("themes_delete", "Delete a theme from a site"),
    // Updates
    tool("updates_list", "List pending updates for one site or the whole fleet"),
    tool("updates_apply", "Apply wp, plugin, theme or all updates to a site"),
    tool("updates_wp", "Update WordPress core on a site"),
    tool("updates_plugins", "Update plugins on a site"),
    tool("updates_themes", "Update themes on a site"),
    tool("updates_translations", "Update translations on a site"),
    tool("updates_bulk_apply", "Apply updates across several sites, reporting per site"),
    tool("updates_ignore", "Ignore a plugin or theme update, globally or per site"),
    tool("updates_unignore", "Stop ignoring a plugin or theme update"),
    tool("updates_ignored", "List ignored updates"),
    // Clients
    tool("clients_list", "List clients (Pro: Client Reports)"),
    tool("clients_get", "Get a client (Pro: Client Reports)"),
    tool("clients_add", "Add a client (Pro: Client Reports)"),
    tool("clients_edit", "Edit a client (Pro: Client Reports)"),
    tool("clients_delete", "Delete a client, requires confirmation (Pro: Client Reports)"),
    // Costs
    tool("costs_list", "List tracked costs (Pro: Cost Tracker)"),
    tool("costs_get", "Get a cost entry (Pro: Cost Tracker)"),
    tool("costs_add", "Add a cost entry (Pro: Cost Tracker)"),
    tool("costs_edit", "Edit a cost entry (Pro: Cost Tracker)"),
    tool("costs_delete", "Delete a cost entry, requires confirmation (Pro: Cost Tracker)"),
    // Tags
    tool("tags_list", "List tags, derived from the site list if the tag endpoint fails"),
    tool("tags_sites", "List sites carrying a tag, derived from the site list if needed"),
];

fn parse<P: DeserializeOwned>(tool: &str, arguments: Value) -> Result<P, Outcome> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| Outcome::invalid(format!("Invalid arguments for {tool}: {e}")))
}

async fn with_params<P, F, Fut>(tool: &str, arguments: Value, run: F) -> Outcome
where
    P: DeserializeOwned,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = Outcome>,
{
    match parse::<P>(tool, arguments) {
        Ok(params) => run(params).await,
        Err(outcome) => outcome,
    }
}

/// Routes tool names to orchestrators.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: FleetTools,
}

impl ToolRegistry {
    pub fn new(tools: FleetTools) -> Self {
        Self { tools }
    }

    pub fn specs(&self) -> &'static [ToolSpec] {
        TOOLS
    }

    pub fn contains(&self, name: &str) -> bool {
        TOOLS.iter().any(|t| t.name == name)
    }

    /// Run a tool and render its outcome.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolResult {
        let outcome = self.run(name, arguments).await;
        debug!(tool = name, is_error = outcome.is_error(), "Tool call finished");
        outcome.render()
    }

    /// Run a tool. Unknown names and malformed arguments are validation
    /// failures.
    pub async fn run(&self, name: &str, args: Value) -> Outcome {
        let t = &self.tools;
        debug!(tool = name, "Dispatching tool call");

        match name {
            "sites_list" => with_params(name, args, move |p| t.sites_list(p)).await,
            "sites_get" => with_params(name, args, move |p| t.sites_get(p)).await,
            "sites_count" => t.sites_count().await,
            "sites_sync" => with_params(name, args, move |p| t.sites_sync(p)).await,
            "sites_bulk_sync" => with_params(name, args, move |p| t.sites_bulk_sync(p)).await,
            "sites_check" => with_params(name, args, move |p| t.sites_check(p)).await,
            "sites_add" => with_params(name, args, move |p| t.sites_add(p)).await,
            "sites_reconnect" => {
                with_params(name, args, move |p| t.sites_action(SiteAction::Reconnect, p)).await
            }
            "sites_disconnect" => {
                with_params(name, args, move |p| t.sites_action(SiteAction::Disconnect, p)).await
            }
            "sites_suspend" => {
                with_params(name, args, move |p| t.sites_action(SiteAction::Suspend, p)).await
            }
            "sites_unsuspend" => {
                with_params(name, args, move |p| t.sites_action(SiteAction::Unsuspend, p)).await
            }
            "sites_edit" => with_params(name, args, move |p| t.sites_edit(p)).await,
            "sites_changes" => with_params(name, args, move |p| t.sites_changes(p)).await,
            "sites_remove" => with_params(name, args, move |p| t.sites_remove(p)).await,

            "plugins_list" => with_params(name, args, move |p| t.plugins_list(p)).await,
            "plugins_activate" => with_params(name, args, move |p| t.plugins_toggle(true, p)).await,
            "plugins_deactivate" => with_params(name, args, move |p| t.plugins_toggle(false, p)).await,
            "plugins_install" => {
                with_params(name, args, move |p| {
                    t.package(PackageKind::Plugin, PackageAction::Install, p)
                })
                .await
            }
            "plugins_delete" => {
                with_params(name, args, move |p| {
                    t.package(PackageKind::Plugin, PackageAction::Delete, p)
                })
                .await
            }

            "themes_list" => with_params(name, args, move |p| t.themes_list(p)).await,
            "themes_activate" => with_params(name, args, move |p| t.themes_activate(p)).await,
            "themes_install" => {
                with_params(name, args, move |p| {
                    t.package(PackageKind::Theme, PackageAction::Install, p)
                })
                .await
            }
            "themes_delete" => {
                with_params(name, args, move |p| {
                    t.package(PackageKind::Theme, PackageAction::Delete, p)
                })
                .await
            }

            "updates_list" => with_params(name, args, move |p| t.updates_list(p)).await,
            "updates_apply" => with_params(name, args, move |p| t.updates_apply(p)).await,
            "updates_wp" => {
                with_params(name, args, move |p| t.updates_single(UpdateStep::Core, p)).await
            }
            "updates_plugins" => {
                with_params(name, args, move |p| t.updates_single(UpdateStep::Plugins, p)).await
            }
            "updates_themes" => {
                with_params(name, args, move |p| t.updates_single(UpdateStep::Themes, p)).await
            }
            "updates_translations" => {
                with_params(name, args, move |p| t.updates_single(UpdateStep::Translations, p)).await
            }
            "updates_bulk_apply" => with_params(name, args, move |p| t.updates_bulk_apply(p)).await,
            "updates_ignore" => with_params(name, args, move |p| t.updates_set_ignored(true, p)).await,
            "updates_unignore" => {
                with_params(name, args, move |p| t.updates_set_ignored(false, p)).await
            }
            "updates_ignored" => with_params(name, args, move |p| t.updates_ignored(p)).await,

            "clients_list" => with_params(name, args, move |p| t.clients_list(p)).await,
            "clients_get" => with_params(name, args, move |p| t.clients_get(p)).await,
            "clients_add" => with_params(name, args, move |p| t.clients_add(p)).await,
            "clients_edit" => with_params(name, args, move |p| t.clients_edit(p)).await,
            "clients_delete" => with_params(name, args, move |p| t.clients_delete(p)).await,

            "costs_list" => with_params(name, args, move |p| t.costs_list(p)).await,
            "costs_get" => with_params(name, args, move |p| t.costs_get(p)).await,
            "costs_add" => with_params(name, args, move |p| t.costs_add(p)).await,
            "costs_edit" => with_params(name, args, move |p| t.costs_edit(p)).await,
            "costs_delete" => with_params(name, args, move |p| t.costs_delete(p)).await,

            "tags_list" => with_params(name, args, move |p| t.tags_list(p)).await,
            "tags_sites" => with_params(name, args, move |p| t.tags_sites(p)).await,

            unknown => Outcome::invalid(format!("Unknown tool: {unknown}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FailureCause;
    use fleet_api_client::testing::ScriptedTransport;
    use fleet_api_client::{FleetApiClient, Method, RateLimiter};
    use gateway_config_and_utils::SafetyPolicy;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn registry(transport: Arc<ScriptedTransport>) -> ToolRegistry {
        let client = FleetApiClient::new(transport, Arc::new(RateLimiter::new(1_000)));
        ToolRegistry::new(FleetTools::new(client, SafetyPolicy::default()))
    }

    #[test]
    fn tool_names_are_unique() {
        let names: HashSet<_> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[tokio::test]
    async fn every_listed_tool_is_routed() {
        let registry = registry(Arc::new(ScriptedTransport::new()));
        for spec in TOOLS {
            let outcome = registry.run(spec.name, json!({})).await;
            if let Outcome::Failure { message, .. } = &outcome {
                assert!(
                    !message.starts_with("Unknown tool"),
                    "{} is listed but not routed",
                    spec.name
                );
            }
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_a_validation_failure() {
        let registry = registry(Arc::new(ScriptedTransport::new()));
        let outcome = registry.run("sites_explode", json!({})).await;
        assert_eq!(outcome.cause(), Some(&FailureCause::Validation));
        assert_eq!(
            registry.dispatch("sites_explode", Value::Null).await,
            ToolResult::error("Unknown tool: sites_explode")
        );
    }

    #[tokio::test]
    async fn malformed_arguments_are_a_validation_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        let registry = registry(transport.clone());

        let outcome = registry
            .run("updates_apply", json!({"site": "4", "type": "everything"}))
            .await;
        assert_eq!(outcome.cause(), Some(&FailureCause::Validation));
        assert!(outcome
            .render()
            .text
            .starts_with("Invalid arguments for updates_apply:"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn null_arguments_mean_no_arguments() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::Get, "/sites/count", Ok(json!({"count": 3})));
        let registry = registry(transport);

        let result = registry.dispatch("sites_count", Value::Null).await;
        assert_eq!(result, ToolResult::ok("{\n  \"count\": 3\n}"));

        let listed = registry.dispatch("tags_list", Value::Null).await;
        assert!(listed.is_error, "no scripted /tags or /sites reply");
    }
}
