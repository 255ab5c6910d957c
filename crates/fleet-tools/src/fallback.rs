//! Best-effort derivation of tag data from the full site listing.
//!
//! Used only after a tag endpoint has failed. Every payload produced here
//! carries `degraded: true`, a `source` naming the listing it came from and
//! a `warning` naming the endpoint that failed.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Value of the `source` marker on derived payloads.
pub const SITES_LIST_SOURCE: &str = "sites_list";

/// One tag seen across the site listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedTag {
    pub id: String,
    #[serde(rename = "name")]
    pub label: String,
    #[serde(rename = "site_count")]
    pub count: usize,
}

/// Tag id to label and member count, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedIndex {
    entries: Vec<DerivedTag>,
}

impl DerivedIndex {
    pub fn get(&self, id: &str) -> Option<&DerivedTag> {
        self.entries.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<DerivedTag> {
        self.entries
    }

    fn record(&mut self, id: &str, label: String) {
        match self.entries.iter_mut().find(|t| t.id == id) {
            Some(existing) => existing.count += 1,
            None => self.entries.push(DerivedTag {
                id: id.to_string(),
                label,
                count: 1,
            }),
        }
    }
}

/// Records of a listing response: either a bare array or `{ "data": [...] }`.
pub fn records(listing: &Value) -> &[Value] {
    listing
        .as_array()
        .or_else(|| listing.get("data").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A record's embedded tag map as `(id, label)` pairs. Missing or non-object
/// maps yield nothing.
fn embedded_tags(record: &Value) -> Vec<(&str, String)> {
    record
        .get("tags")
        .and_then(Value::as_object)
        .map(|tags| {
            tags.iter()
                .map(|(id, label)| (id.as_str(), label_text(label)))
                .collect()
        })
        .unwrap_or_default()
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stateless; every call derives from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResolver;

impl FallbackResolver {
    /// Count every tag across `sites`.
    pub fn derive_index(sites: &Value) -> DerivedIndex {
        let mut index = DerivedIndex::default();
        for record in records(sites) {
            for (id, label) in embedded_tags(record) {
                index.record(id, label);
            }
        }
        index
    }

    /// Tag listing with an optional case-insensitive name filter.
    pub fn list(sites: &Value, search: Option<&str>, failed_endpoint: &str) -> Value {
        let mut tags = Self::derive_index(sites).into_entries();
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            tags.retain(|t| t.label.to_lowercase().contains(&needle));
        }

        warn!(
            endpoint = failed_endpoint,
            derived = tags.len(),
            "Tag endpoint failed, derived tags from site listing"
        );
        let data = serde_json::to_value(&tags).unwrap_or_else(|_| json!([]));
        degraded(
            data,
            tags.len(),
            format!("{failed_endpoint} endpoint failed; tags derived from sites list."),
        )
    }

    /// Sites carrying `tag`, matched by id or case-insensitive label.
    pub fn sites_for_tag(sites: &Value, tag: &str, failed_endpoint: &str) -> Value {
        let wanted = tag.to_lowercase();
        let matching: Vec<Value> = records(sites)
            .iter()
            .filter(|record| {
                embedded_tags(record)
                    .iter()
                    .any(|(id, label)| *id == tag || label.to_lowercase() == wanted)
            })
            .map(|record| {
                json!({
                    "id": record.get("id").cloned().unwrap_or(Value::Null),
                    "name": record.get("name").cloned().unwrap_or(Value::Null),
                    "url": record.get("url").cloned().unwrap_or(Value::Null),
                })
            })
            .collect();

        warn!(
            endpoint = failed_endpoint,
            tag,
            derived = matching.len(),
            "Tag sites endpoint failed, derived members from site listing"
        );
        let total = matching.len();
        let mut payload = degraded(
            Value::Array(matching),
            total,
            format!("{failed_endpoint} endpoint failed; results derived from sites list."),
        );
        payload["tag"] = json!(tag);
        payload
    }
}

fn degraded(data: Value, total: usize, warning: String) -> Value {
    json!({
        "success": 1,
        "total": total,
        "data": data,
        "degraded": true,
        "source": SITES_LIST_SOURCE,
        "warning": warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> Value {
        json!({
            "data": [
                {"id": 1, "name": "Alpha", "url": "https://a.example", "tags": {"7": "Staging", "9": "Clients"}},
                {"id": 2, "name": "Beta", "url": "https://b.example", "tags": {"7": "Staging"}},
                {"id": 3, "name": "Gamma", "url": "https://c.example"},
            ]
        })
    }

    #[test]
    fn index_counts_repeat_keys() {
        let index = FallbackResolver::derive_index(&fleet());
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get("7"),
            Some(&DerivedTag {
                id: "7".into(),
                label: "Staging".into(),
                count: 2
            })
        );
        assert_eq!(index.get("9").map(|t| t.count), Some(1));
    }

    #[test]
    fn index_accepts_bare_arrays_and_ignores_junk() {
        let sites = json!([{"tags": {"1": "x"}}, {"tags": ["not", "a", "map"]}, 42]);
        assert_eq!(FallbackResolver::derive_index(&sites).len(), 1);
        assert!(FallbackResolver::derive_index(&json!({"oops": true})).is_empty());
    }

    #[test]
    fn list_filters_by_label_substring() {
        let payload = FallbackResolver::list(&fleet(), Some("STAG"), "Tags");
        assert_eq!(payload["degraded"], json!(true));
        assert_eq!(payload["source"], json!("sites_list"));
        assert_eq!(payload["total"], json!(1));
        assert_eq!(
            payload["data"],
            json!([{"id": "7", "name": "Staging", "site_count": 2}])
        );
        assert_eq!(
            payload["warning"],
            json!("Tags endpoint failed; tags derived from sites list.")
        );
    }

    #[test]
    fn sites_for_tag_matches_id_or_label() {
        let by_id = FallbackResolver::sites_for_tag(&fleet(), "7", "Tag sites");
        assert_eq!(by_id["total"], json!(2));
        assert_eq!(by_id["tag"], json!("7"));
        assert_eq!(
            by_id["data"][0],
            json!({"id": 1, "name": "Alpha", "url": "https://a.example"})
        );

        let by_label = FallbackResolver::sites_for_tag(&fleet(), "clients", "Tag sites");
        assert_eq!(by_label["total"], json!(1));

        let none = FallbackResolver::sites_for_tag(&fleet(), "missing", "Tag sites");
        assert_eq!(none["data"], json!([]));
        assert_eq!(none["degraded"], json!(true));
    }
}
