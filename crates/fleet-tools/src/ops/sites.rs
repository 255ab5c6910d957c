//! Site operations.

use crate::fallback::records;
use crate::outcome::{FailureCause, Outcome};
use crate::tools::{split_list, FleetTools};
use safety_gate::FLEET_WIDE;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Full,
    Basic,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitesListParams {
    #[serde(default)]
    pub format: ListFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteParams {
    pub site: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncParams {
    pub site: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkSyncParams {
    /// Comma-separated ids or domains; absent means the whole fleet.
    pub sites: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSiteParams {
    pub url: String,
    pub name: Option<String>,
    pub admin: Option<String>,
    #[serde(alias = "uniqueId")]
    pub unique_id: Option<String>,
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
    pub groupids: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteActionParams {
    pub site: String,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditSiteParams {
    pub site: String,
    pub name: Option<String>,
    pub groupids: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveSiteParams {
    pub site: String,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

/// Connection-state actions that share one endpoint shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteAction {
    Reconnect,
    Disconnect,
    Suspend,
    Unsuspend,
}

impl SiteAction {
    fn path(self) -> &'static str {
        match self {
            SiteAction::Reconnect => "reconnect",
            SiteAction::Disconnect => "disconnect",
            SiteAction::Suspend => "suspend",
            SiteAction::Unsuspend => "unsuspend",
        }
    }

    fn label(self, site: &str) -> String {
        match self {
            SiteAction::Reconnect => format!("Reconnect to site {site}"),
            SiteAction::Disconnect => format!("Disconnect site {site}"),
            SiteAction::Suspend => format!("Suspend site {site}"),
            SiteAction::Unsuspend => format!("Unsuspend site {site}"),
        }
    }

    fn done(self, site: &str) -> String {
        match self {
            SiteAction::Reconnect => format!("Successfully reconnected to site: {site}"),
            SiteAction::Disconnect => format!("Successfully disconnected site: {site}"),
            SiteAction::Suspend => format!("Successfully suspended site: {site}"),
            SiteAction::Unsuspend => format!("Successfully unsuspended site: {site}"),
        }
    }

    fn failed(self, site: &str) -> String {
        match self {
            SiteAction::Reconnect => format!("Failed to reconnect to site {site}"),
            SiteAction::Disconnect => format!("Failed to disconnect site {site}"),
            SiteAction::Suspend => format!("Failed to suspend site {site}"),
            SiteAction::Unsuspend => format!("Failed to unsuspend site {site}"),
        }
    }
}

#[derive(Serialize)]
struct NewSite<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin: Option<&'a str>,
    #[serde(rename = "uniqueId", skip_serializing_if = "Option::is_none")]
    unique_id: Option<&'a str>,
    ssl_verify: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    groupids: Option<&'a str>,
}

pub(crate) fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

const SITE_REQUIRED: &str = "Site ID or domain is required";

impl FleetTools {
    pub async fn sites_list(&self, params: SitesListParams) -> Outcome {
        let result = match params.format {
            ListFormat::Full => self.client.list_sites().await,
            ListFormat::Basic => self.client.list_sites_basic().await,
        };
        Outcome::from_read("Failed to list sites", result)
    }

    pub async fn sites_get(&self, params: SiteParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid(SITE_REQUIRED);
        }
        let result = self.client.get_site(&params.site).await;
        Outcome::from_read(format!("Failed to get site {}", params.site), result)
    }

    pub async fn sites_count(&self) -> Outcome {
        Outcome::from_read("Failed to get site count", self.client.count_sites().await)
    }

    /// One site, or the whole fleet when no site is given.
    pub async fn sites_sync(&self, params: SyncParams) -> Outcome {
        let site = match params.site.as_deref().filter(|s| !blank(s)) {
            Some(site) => site,
            None => return self.sync_fleet(params.confirmed, params.dry_run).await,
        };

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Sync site {site}"),
                vec![site.to_string()],
                Some(json!({ "action": "sync" })),
            );
        }
        match self.client.sync_site(site).await {
            Ok(result) => Outcome::applied(format!("Successfully synced site: {site}"), result),
            Err(e) => Outcome::from_client("Failed to sync site(s)", &e),
        }
    }

    async fn sync_fleet(&self, confirmed: bool, dry_run: Option<bool>) -> Outcome {
        if let Err(e) = self.guard.check(FLEET_WIDE, confirmed) {
            return Outcome::from_guard(e);
        }
        let mode = self.gate.resolve(dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                "Sync all sites",
                vec!["all sites".to_string()],
                Some(json!({ "action": "sync" })),
            );
        }
        match self.client.sync_all_sites().await {
            Ok(result) => Outcome::applied("Successfully initiated sync for all sites", result),
            Err(e) => Outcome::from_client("Failed to sync site(s)", &e),
        }
    }

    /// Sync each listed site in order and report per site.
    pub async fn sites_bulk_sync(&self, params: BulkSyncParams) -> Outcome {
        let sites = params.sites.as_deref().map(split_list).unwrap_or_default();
        if sites.is_empty() {
            return self.sync_fleet(params.confirmed, params.dry_run).await;
        }
        if let Err(e) = self.guard.check(sites.len(), params.confirmed) {
            return Outcome::from_guard(e);
        }

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Sync {} site(s)", sites.len()),
                sites,
                Some(json!({ "action": "sync" })),
            );
        }

        let mut report = Vec::with_capacity(sites.len());
        let mut failures = 0usize;
        let mut first_cause = None;
        for site in &sites {
            match self.client.sync_site(site).await {
                Ok(result) => report.push(json!({ "site": site, "success": true, "result": result })),
                Err(e) => {
                    failures += 1;
                    first_cause.get_or_insert_with(|| FailureCause::from(&e));
                    report.push(json!({ "site": site, "success": false, "error": e.to_string() }));
                }
            }
        }

        let summary = json!({ "total": sites.len(), "failed": failures, "sites": report });
        if failures > 0 {
            return Outcome::Failure {
                message: format!(
                    "Failed to sync {failures} of {} site(s):\n{}",
                    sites.len(),
                    pretty(&summary)
                ),
                cause: first_cause,
            };
        }
        Outcome::applied(format!("Successfully synced {} site(s)", sites.len()), summary)
    }

    pub async fn sites_check(&self, params: SiteParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid(SITE_REQUIRED);
        }
        let mode = self.gate.resolve(None);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Check site {}", params.site),
                vec![params.site.clone()],
                Some(json!({ "action": "check" })),
            );
        }
        match self.client.check_site(&params.site).await {
            Ok(result) => Outcome::success(json!({
                "message": format!("Health check completed for: {}", params.site),
                "result": result,
            })),
            Err(e) => Outcome::from_client(format!("Failed to check site {}", params.site), &e),
        }
    }

    pub async fn sites_add(&self, params: AddSiteParams) -> Outcome {
        if blank(&params.url) {
            return Outcome::invalid("Site URL is required");
        }
        let body = NewSite {
            url: &params.url,
            name: params.name.as_deref(),
            admin: params.admin.as_deref(),
            unique_id: params.unique_id.as_deref(),
            ssl_verify: u8::from(params.ssl_verify),
            groupids: params.groupids.as_deref(),
        };
        let body = serde_json::to_value(&body).unwrap_or_else(|_| json!({ "url": params.url }));

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Add site {}", params.url),
                vec![params.url.clone()],
                Some(body),
            );
        }
        match self.client.add_site(body).await {
            Ok(result) => Outcome::applied(format!("Successfully added site: {}", params.url), result),
            Err(e) => Outcome::from_client(format!("Failed to add site {}", params.url), &e),
        }
    }

    pub async fn sites_action(&self, action: SiteAction, params: SiteActionParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid(SITE_REQUIRED);
        }
        let site = params.site.as_str();
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                action.label(site),
                vec![site.to_string()],
                Some(json!({ "action": action.path() })),
            );
        }
        match self.client.site_action(site, action.path()).await {
            Ok(result) => Outcome::applied(action.done(site), result),
            Err(e) => Outcome::from_client(action.failed(site), &e),
        }
    }

    pub async fn sites_edit(&self, params: EditSiteParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid(SITE_REQUIRED);
        }
        let mut updates = serde_json::Map::new();
        if let Some(name) = params.name.as_deref().filter(|s| !blank(s)) {
            updates.insert("name".into(), json!(name));
        }
        if let Some(groupids) = params.groupids.as_deref().filter(|s| !blank(s)) {
            updates.insert("groupids".into(), json!(groupids));
        }
        if updates.is_empty() {
            return Outcome::invalid("At least one field (name or groupids) must be provided");
        }
        let updates = Value::Object(updates);

        let site = params.site.as_str();
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Edit site {site}"),
                vec![site.to_string()],
                Some(json!({ "updates": updates })),
            );
        }
        match self.client.edit_site(site, updates).await {
            Ok(result) => Outcome::applied(format!("Successfully updated site: {site}"), result),
            Err(e) => Outcome::from_client(format!("Failed to edit site {site}"), &e),
        }
    }

    pub async fn sites_changes(&self, params: SiteParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid(SITE_REQUIRED);
        }
        match self.client.site_changes(&params.site).await {
            Ok(result) => Outcome::success(with_field("site", &params.site, result)),
            Err(e) => Outcome::from_client(
                format!("Failed to get non-MainWP changes for {}", params.site),
                &e,
            ),
        }
    }

    pub async fn sites_remove(&self, params: RemoveSiteParams) -> Outcome {
        if blank(&params.site) {
            return Outcome::invalid(SITE_REQUIRED);
        }
        let site = params.site.as_str();
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Remove site {site}"),
                vec![site.to_string()],
                Some(json!({ "action": "remove", "confirmed": params.confirmed })),
            );
        }
        if let Err(e) = self.guard.check_destructive(
            &format!("Removing site {site}"),
            "This permanently deletes all site data from MainWP.",
            params.confirmed,
        ) {
            return Outcome::from_guard(e);
        }
        match self.client.remove_site(site).await {
            Ok(result) => Outcome::applied(format!("Successfully removed site: {site}"), result),
            Err(e) => Outcome::from_client(format!("Failed to remove site {site}"), &e),
        }
    }

    /// Ids of every site in the basic listing.
    pub(crate) async fn all_site_ids(&self) -> Result<Vec<String>, fleet_api_client::ClientError> {
        let listing = self.client.list_sites_basic().await?;
        Ok(records(&listing)
            .iter()
            .filter_map(|record| match record.get("id") {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .collect())
    }
}

/// Add `key: value` to an object payload; non-objects are nested under
/// `result`.
pub(crate) fn with_field(key: &str, value: &str, payload: Value) -> Value {
    let mut merged = serde_json::Map::new();
    merged.insert(key.to_string(), json!(value));
    match payload {
        Value::Object(map) => merged.extend(map),
        other => {
            merged.insert("result".into(), other);
        }
    }
    Value::Object(merged)
}

pub(crate) fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
