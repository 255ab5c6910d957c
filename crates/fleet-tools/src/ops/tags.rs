//! Tag lookups with a site-listing fallback.

use crate::fallback::FallbackResolver;
use crate::ops::sites::with_field;
use crate::outcome::Outcome;
use crate::tools::FleetTools;
use fleet_api_client::ClientError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsListParams {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagSitesParams {
    pub tag: String,
}

/// Keep entries of `data` whose `name` contains `search`, case-insensitively.
fn filter_by_name(mut payload: Value, search: &str) -> Value {
    let needle = search.to_lowercase();
    if let Some(data) = payload.get_mut("data").and_then(Value::as_array_mut) {
        data.retain(|tag| {
            tag.get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        });
    }
    payload
}

impl FleetTools {
    pub async fn tags_list(&self, params: TagsListParams) -> Outcome {
        let search = params.search.as_deref().filter(|s| !s.is_empty());

        let primary = match self.client.list_tags().await {
            Ok(payload) => {
                return Outcome::success(match search {
                    Some(search) => filter_by_name(payload, search),
                    None => payload,
                })
            }
            Err(ClientError::Api(e)) => e,
            Err(e) => return Outcome::from_client("Failed to list tags", &e),
        };
        debug!(error = %primary, "Tag listing failed, trying site listing");

        match self.client.list_sites().await {
            Ok(sites) => Outcome::success(FallbackResolver::list(&sites, search, "Tags")),
            Err(e) => Outcome::from_client("Failed to list tags", &e),
        }
    }

    pub async fn tags_sites(&self, params: TagSitesParams) -> Outcome {
        let tag = params.tag.trim();
        if tag.is_empty() {
            return Outcome::invalid("Tag ID or name is required");
        }

        let primary = match self.client.tag_sites(tag).await {
            Ok(payload) => return Outcome::success(with_field("tag", tag, payload)),
            Err(ClientError::Api(e)) => e,
            Err(e) => return Outcome::from_client(format!("Failed to get sites for tag {tag}"), &e),
        };
        debug!(tag, error = %primary, "Tag sites lookup failed, trying site listing");

        match self.client.list_sites().await {
            Ok(sites) => {
                Outcome::success(FallbackResolver::sites_for_tag(&sites, tag, "Tag sites"))
            }
            Err(e) => Outcome::from_client(format!("Failed to get sites for tag {tag}"), &e),
        }
    }
}
