//! Endpoint catalogue for the remote fleet-management API.

use crate::error::{ClientError, ClientResult};
use crate::rate_limiter::RateLimiter;
use crate::transport::{ApiRequest, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// Percent-encode a caller-supplied identifier for use as a path segment.
fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Which kind of update an ignore rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreKind {
    Plugin,
    Theme,
}

impl IgnoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreKind::Plugin => "plugin",
            IgnoreKind::Theme => "theme",
        }
    }
}

/// Client for the remote API. One instance (one limiter, one transport) is
/// shared by every operation in the process.
#[derive(Clone)]
pub struct FleetApiClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
}

impl FleetApiClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Self { transport, limiter }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Reserve a rate-limit slot, then send.
    pub async fn request(&self, request: ApiRequest) -> ClientResult<Value> {
        self.limiter.reserve()?;

        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "Dispatching fleet API call");

        self.transport.send(request).await.map_err(|e| {
            error!(%method, %path, status = ?e.status, error = %e.message, "Fleet API call failed");
            ClientError::Api(e)
        })
    }

    // =========================================================================
    // Sites
    // =========================================================================

    pub async fn list_sites(&self) -> ClientResult<Value> {
        self.request(ApiRequest::get("/sites")).await
    }

    pub async fn list_sites_basic(&self) -> ClientResult<Value> {
        self.request(ApiRequest::get("/sites/basic")).await
    }

    pub async fn count_sites(&self) -> ClientResult<Value> {
        self.request(ApiRequest::get("/sites/count")).await
    }

    pub async fn get_site(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/sites/{}", seg(site))))
            .await
    }

    pub async fn sync_site(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::post(format!("/sites/{}/sync", seg(site))))
            .await
    }

    pub async fn sync_all_sites(&self) -> ClientResult<Value> {
        self.request(ApiRequest::post("/sites/sync")).await
    }

    pub async fn check_site(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::post(format!("/sites/{}/check", seg(site))))
            .await
    }

    pub async fn add_site(&self, body: Value) -> ClientResult<Value> {
        self.request(ApiRequest::post("/sites/add").body(body)).await
    }

    /// `action` is one of `reconnect`, `disconnect`, `suspend`, `unsuspend`.
    pub async fn site_action(&self, site: &str, action: &str) -> ClientResult<Value> {
        self.request(ApiRequest::post(format!("/sites/{}/{}", seg(site), action)))
            .await
    }

    pub async fn edit_site(&self, site: &str, body: Value) -> ClientResult<Value> {
        self.request(ApiRequest::put(format!("/sites/{}/edit", seg(site))).body(body))
            .await
    }

    pub async fn site_changes(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!(
            "/sites/{}/non-mainwp-changes",
            seg(site)
        )))
        .await
    }

    pub async fn remove_site(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::delete(format!("/sites/{}", seg(site))))
            .await
    }

    // =========================================================================
    // Plugins
    // =========================================================================

    pub async fn list_plugins(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/sites/{}/plugins", seg(site))))
            .await
    }

    /// `action` is `activate` or `deactivate`.
    pub async fn toggle_plugins(
        &self,
        site: &str,
        action: &str,
        plugins: &[String],
    ) -> ClientResult<Value> {
        self.request(
            ApiRequest::post(format!("/sites/{}/plugins/{}", seg(site), action))
                .body(json!({ "plugins": plugins.join(",") })),
        )
        .await
    }

    /// `action` is `install` or `delete`.
    pub async fn plugin_package(&self, site: &str, action: &str, slug: &str) -> ClientResult<Value> {
        self.request(
            ApiRequest::post(format!("/sites/{}/plugins/{}", seg(site), action))
                .body(json!({ "slug": slug })),
        )
        .await
    }

    // =========================================================================
    // Themes
    // =========================================================================

    pub async fn list_themes(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/sites/{}/themes", seg(site))))
            .await
    }

    pub async fn activate_theme(&self, site: &str, theme: &str) -> ClientResult<Value> {
        self.request(
            ApiRequest::post(format!("/sites/{}/themes/activate", seg(site)))
                .body(json!({ "theme": theme })),
        )
        .await
    }

    /// `action` is `install` or `delete`.
    pub async fn theme_package(&self, site: &str, action: &str, slug: &str) -> ClientResult<Value> {
        self.request(
            ApiRequest::post(format!("/sites/{}/themes/{}", seg(site), action))
                .body(json!({ "slug": slug })),
        )
        .await
    }

    // =========================================================================
    // Updates
    // =========================================================================

    pub async fn list_updates(&self) -> ClientResult<Value> {
        self.request(ApiRequest::get("/updates")).await
    }

    pub async fn site_updates(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/updates/{}", seg(site))))
            .await
    }

    pub async fn update_core(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::post(format!("/updates/{}/update/wp", seg(site))))
            .await
    }

    /// Update the named plugins, or every plugin with a pending update.
    pub async fn update_plugins(&self, site: &str, plugins: Option<&[String]>) -> ClientResult<Value> {
        let body = match plugins {
            Some(list) => json!({ "plugins": list.join(",") }),
            None => json!({}),
        };
        self.request(ApiRequest::post(format!("/updates/{}/update/plugins", seg(site))).body(body))
            .await
    }

    /// Update the named themes, or every theme with a pending update.
    pub async fn update_themes(&self, site: &str, themes: Option<&[String]>) -> ClientResult<Value> {
        let body = match themes {
            Some(list) => json!({ "themes": list.join(",") }),
            None => json!({}),
        };
        self.request(ApiRequest::post(format!("/updates/{}/update/themes", seg(site))).body(body))
            .await
    }

    pub async fn update_translations(&self, site: &str) -> ClientResult<Value> {
        self.request(ApiRequest::post(format!(
            "/updates/{}/update/translations",
            seg(site)
        )))
        .await
    }

    /// `ignore == false` lifts an existing ignore rule.
    pub async fn set_update_ignored(
        &self,
        ignore: bool,
        kind: IgnoreKind,
        slug: &str,
        site: Option<&str>,
    ) -> ClientResult<Value> {
        let path = if ignore { "/updates/ignore" } else { "/updates/unignore" };
        let mut body = json!({ "type": kind.as_str(), "slug": slug });
        if let Some(site) = site {
            body["site"] = json!(site);
        }
        self.request(ApiRequest::post(path).body(body)).await
    }

    pub async fn list_ignored_updates(&self, site: Option<&str>) -> ClientResult<Value> {
        self.request(ApiRequest::get("/updates/ignored").query("site", site))
            .await
    }

    // =========================================================================
    // Clients
    // =========================================================================

    pub async fn list_clients(
        &self,
        search: Option<&str>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> ClientResult<Value> {
        self.request(
            ApiRequest::get("/clients")
                .query("page", page)
                .query("per_page", per_page)
                .query("search", search),
        )
        .await
    }

    pub async fn get_client(&self, client: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/clients/{}", seg(client))))
            .await
    }

    pub async fn add_client(&self, body: Value) -> ClientResult<Value> {
        self.request(ApiRequest::post("/clients/add").body(body)).await
    }

    pub async fn edit_client(&self, client: &str, body: Value) -> ClientResult<Value> {
        self.request(ApiRequest::put(format!("/clients/{}/edit", seg(client))).body(body))
            .await
    }

    pub async fn delete_client(&self, client: &str) -> ClientResult<Value> {
        self.request(ApiRequest::delete(format!("/clients/{}", seg(client))))
            .await
    }

    // =========================================================================
    // Costs
    // =========================================================================

    pub async fn list_costs(
        &self,
        search: Option<&str>,
        kind: Option<&str>,
        category: Option<&str>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> ClientResult<Value> {
        self.request(
            ApiRequest::get("/costs")
                .query("page", page)
                .query("per_page", per_page)
                .query("search", search)
                .query("category", category)
                .query("type", kind),
        )
        .await
    }

    pub async fn get_cost(&self, cost: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/costs/{}", seg(cost))))
            .await
    }

    pub async fn add_cost(&self, body: Value) -> ClientResult<Value> {
        self.request(ApiRequest::put("/costs/add").body(body)).await
    }

    pub async fn edit_cost(&self, cost: &str, body: Value) -> ClientResult<Value> {
        self.request(ApiRequest::put(format!("/costs/{}/edit", seg(cost))).body(body))
            .await
    }

    pub async fn delete_cost(&self, cost: &str) -> ClientResult<Value> {
        self.request(ApiRequest::delete(format!("/costs/{}", seg(cost))))
            .await
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub async fn list_tags(&self) -> ClientResult<Value> {
        self.request(ApiRequest::get("/tags")).await
    }

    pub async fn tag_sites(&self, tag: &str) -> ClientResult<Value> {
        self.request(ApiRequest::get(format!("/tags/{}/sites", seg(tag))))
            .await
    }
}

impl std::fmt::Debug for FleetApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetApiClient")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}
