//! Update operations, including the ordered composite update.

use crate::ops::sites::{blank, pretty};
use crate::outcome::{FailureCause, Outcome};
use crate::tools::{split_list, FleetTools};
use fleet_api_client::{ClientError, ClientResult, IgnoreKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tracing::warn;

/// What `updates_apply` should update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Wp,
    Plugins,
    Themes,
    All,
}

impl UpdateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateKind::Wp => "wp",
            UpdateKind::Plugins => "plugins",
            UpdateKind::Themes => "themes",
            UpdateKind::All => "all",
        }
    }

    /// Steps in execution order.
    pub fn steps(self) -> &'static [UpdateStep] {
        match self {
            UpdateKind::Wp => &[UpdateStep::Core],
            UpdateKind::Plugins => &[UpdateStep::Plugins],
            UpdateKind::Themes => &[UpdateStep::Themes],
            UpdateKind::All => &[UpdateStep::Core, UpdateStep::Plugins, UpdateStep::Themes],
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStep {
    #[serde(rename = "wp")]
    Core,
    Plugins,
    Themes,
    Translations,
}

impl UpdateStep {
    fn noun(self) -> &'static str {
        match self {
            UpdateStep::Core => "WordPress core",
            UpdateStep::Plugins => "plugins",
            UpdateStep::Themes => "themes",
            UpdateStep::Translations => "translations",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatesListParams {
    pub site: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyUpdatesParams {
    pub site: String,
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    /// Comma-separated slugs; absent means everything pending.
    pub items: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShortcutParams {
    pub site: String,
    #[serde(alias = "plugins", alias = "themes")]
    pub items: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkApplyParams {
    pub sites: Option<String>,
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgnoreParams {
    #[serde(rename = "type")]
    pub kind: IgnoreKind,
    pub slug: String,
    pub site: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoredParams {
    pub site: Option<String>,
}

/// Result of one step of a composite update.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: UpdateStep,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every step of a composite, run in order. A failed step does not stop
/// the ones after it.
#[derive(Debug, Clone, Default)]
pub struct CompositeReport {
    pub steps: Vec<StepReport>,
    pub first_failure: Option<FailureCause>,
}

impl CompositeReport {
    pub fn failed(&self) -> usize {
        self.steps.iter().filter(|s| !s.success).count()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.steps).unwrap_or_else(|_| json!([]))
    }
}

fn describe(items: Option<&[String]>, noun: &str) -> String {
    match items {
        Some(items) => items.join(", "),
        None => format!("all {noun}"),
    }
}

impl FleetTools {
    pub async fn updates_list(&self, params: UpdatesListParams) -> Outcome {
        match params.site.as_deref().filter(|s| !blank(s)) {
            Some(site) => Outcome::from_read(
                format!("Failed to list updates for {site}"),
                self.client.site_updates(site).await,
            ),
            None => Outcome::from_read("Failed to list updates", self.client.list_updates().await),
        }
    }

    async fn run_step(
        &self,
        site: &str,
        step: UpdateStep,
        items: Option<&[String]>,
    ) -> ClientResult<Value> {
        match step {
            UpdateStep::Core => self.client.update_core(site).await,
            UpdateStep::Plugins => self.client.update_plugins(site, items).await,
            UpdateStep::Themes => self.client.update_themes(site, items).await,
            UpdateStep::Translations => self.client.update_translations(site).await,
        }
    }

    /// Run `steps` in order against one site, recording each result.
    pub async fn run_composite(&self, site: &str, steps: &[UpdateStep]) -> CompositeReport {
        let mut report = CompositeReport::default();
        for &step in steps {
            match self.run_step(site, step, None).await {
                Ok(result) => report.steps.push(StepReport {
                    step,
                    success: true,
                    result: Some(result),
                    error: None,
                }),
                Err(e) => {
                    warn!(site, step = step.noun(), error = %e, "Update step failed, continuing");
                    report
                        .first_failure
                        .get_or_insert_with(|| FailureCause::from(&e));
                    report.steps.push(StepReport {
                        step,
                        success: false,
                        result: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        report
    }

    /// Current pending updates for a preview.
    async fn preview_read(&self, site: &str) -> Result<Value, ClientError> {
        self.client.site_updates(site).await
    }

    pub async fn updates_apply(&self, params: ApplyUpdatesParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid("Site ID or domain is required");
        }
        let site = params.site.as_str();
        let items = params
            .items
            .as_deref()
            .map(split_list)
            .filter(|list| !list.is_empty());
        let description = match &items {
            Some(list) => format!("{} updates for: {}", params.kind, list.join(", ")),
            None if params.kind == UpdateKind::All => "all updates".to_string(),
            None => format!("all {} updates", params.kind),
        };
        let failed = format!("Failed to apply updates on {site}");

        let target_count = items.as_ref().map_or(1, Vec::len);
        if let Err(e) = self.guard.check(target_count, params.confirmed) {
            return Outcome::from_guard(e);
        }

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            let current = match self.preview_read(site).await {
                Ok(current) => current,
                Err(e) => return Outcome::from_client(failed, &e),
            };
            return Outcome::simulated(
                mode,
                format!("Apply {description} on {site}"),
                vec![site.to_string()],
                Some(json!({
                    "type": params.kind.as_str(),
                    "items": items.as_ref().map_or(json!("all"), |list| json!(list)),
                    "current_updates": current,
                })),
            );
        }

        if params.kind == UpdateKind::All {
            let report = self.run_composite(site, params.kind.steps()).await;
            let steps = report.to_value();
            if report.failed() > 0 {
                return Outcome::Failure {
                    message: format!(
                        "Failed to apply all updates on {site}: {} of {} step(s) failed\n{}",
                        report.failed(),
                        report.steps.len(),
                        pretty(&steps)
                    ),
                    cause: report.first_failure,
                };
            }
            return Outcome::applied(
                format!("Successfully applied {description} on {site}"),
                json!({ "steps": steps }),
            );
        }

        let step = params.kind.steps()[0];
        match self.run_step(site, step, items.as_deref()).await {
            Ok(result) => {
                Outcome::applied(format!("Successfully applied {description} on {site}"), result)
            }
            Err(e) => Outcome::from_client(failed, &e),
        }
    }

    /// Single-kind shortcut: core, plugins, themes or translations.
    pub async fn updates_single(&self, step: UpdateStep, params: UpdateShortcutParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid("Site ID or domain is required");
        }
        let site = params.site.as_str();
        let items = match step {
            UpdateStep::Plugins | UpdateStep::Themes => params
                .items
                .as_deref()
                .map(split_list)
                .filter(|list| !list.is_empty()),
            _ => None,
        };
        let target = match step {
            UpdateStep::Core | UpdateStep::Translations => step.noun().to_string(),
            _ => describe(items.as_deref(), step.noun()),
        };
        let failed = format!("Failed to update {} on {site}", step.noun());

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            let current = match self.preview_read(site).await {
                Ok(current) => current,
                Err(e) => return Outcome::from_client(failed, &e),
            };
            let mut details = json!({ "current_updates": current });
            if matches!(step, UpdateStep::Plugins | UpdateStep::Themes) {
                details[step.noun()] = items.as_ref().map_or(json!("all"), |list| json!(list));
            }
            return Outcome::simulated(
                mode,
                format!("Update {target} on {site}"),
                vec![site.to_string()],
                Some(details),
            );
        }

        match self.run_step(site, step, items.as_deref()).await {
            Ok(result) => Outcome::applied(format!("Successfully updated {target} on {site}"), result),
            Err(e) => Outcome::from_client(failed, &e),
        }
    }

    /// Per-site composite across a list of sites, or every site when none
    /// are listed.
    pub async fn updates_bulk_apply(&self, params: BulkApplyParams) -> Outcome {
        let sites = match params.sites.as_deref().map(split_list) {
            Some(list) if !list.is_empty() => list,
            _ => match self.all_site_ids().await {
                Ok(ids) => ids,
                Err(e) => return Outcome::from_client("Failed to list sites for bulk update", &e),
            },
        };
        if sites.is_empty() {
            return Outcome::invalid("No sites to update");
        }
        if let Err(e) = self.guard.check(sites.len(), params.confirmed) {
            return Outcome::from_guard(e);
        }

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Apply all {} updates on {} site(s)", params.kind, sites.len()),
                sites,
                Some(json!({ "type": params.kind.as_str() })),
            );
        }

        let mut per_site = Vec::with_capacity(sites.len());
        let mut failed_sites = 0usize;
        let mut first_failure = None;
        for site in &sites {
            let report = self.run_composite(site, params.kind.steps()).await;
            let ok = report.failed() == 0;
            if !ok {
                failed_sites += 1;
                if first_failure.is_none() {
                    first_failure = report.first_failure.clone();
                }
            }
            per_site.push(json!({ "site": site, "success": ok, "steps": report.to_value() }));
        }

        let summary = json!({ "type": params.kind.as_str(), "total": sites.len(), "failed": failed_sites, "sites": per_site });
        if failed_sites > 0 {
            return Outcome::Failure {
                message: format!(
                    "Failed to apply {} updates on {failed_sites} of {} site(s):\n{}",
                    params.kind,
                    sites.len(),
                    pretty(&summary)
                ),
                cause: first_failure,
            };
        }
        Outcome::applied(
            format!("Successfully applied {} updates on {} site(s)", params.kind, sites.len()),
            summary,
        )
    }

    /// `ignore == false` lifts the rule.
    pub async fn updates_set_ignored(&self, ignore: bool, params: IgnoreParams) -> Outcome {
        let kind = params.kind.as_str();
        let slug = params.slug.trim();
        if slug.is_empty() {
            return Outcome::invalid(format!("{kind} slug is required"));
        }
        let site = params.site.as_deref().filter(|s| !blank(s));
        let verb = if ignore { "ignore" } else { "unignore" };
        let capitalized = if ignore { "Ignore" } else { "Unignore" };

        let mode = self.gate.resolve(None);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("{capitalized} {kind} \"{slug}\" updates"),
                vec![site.unwrap_or("global").to_string()],
                Some(json!({ "type": kind, "slug": slug, "site": site })),
            );
        }

        match self
            .client
            .set_update_ignored(ignore, params.kind, slug, site)
            .await
        {
            Ok(result) => {
                let scope = site.map_or_else(|| "globally".to_string(), |s| format!("on {s}"));
                Outcome::applied(
                    format!("Successfully {verb}d {kind} \"{slug}\" updates {scope}"),
                    result,
                )
            }
            Err(e) => Outcome::from_client(format!("Failed to {verb} {kind} \"{slug}\" update"), &e),
        }
    }

    pub async fn updates_ignored(&self, params: IgnoredParams) -> Outcome {
        let site = params.site.as_deref().filter(|s| !blank(s));
        Outcome::from_read(
            "Failed to list ignored updates",
            self.client.list_ignored_updates(site).await,
        )
    }
}
