//! Cost tracking (Pro endpoints).

use crate::ops::clients::non_empty_body;
use crate::ops::sites::blank;
use crate::outcome::Outcome;
use crate::tools::FleetTools;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PRO_HINT: &str = "This feature requires MainWP Pro with Cost Tracker extension.";

fn pro_failure(what: &str) -> String {
    format!("Failed to {what}. {PRO_HINT}")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostsListParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Sent to the API as `category`.
    pub product_type: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CostParams {
    pub cost: String,
}

/// Optional fields shared by add and edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_renewal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_renewal: Option<String>,
    /// Comma-separated site ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCostParams {
    pub name: String,
    #[serde(flatten)]
    pub details: CostDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: CostDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditCostParams {
    pub cost: String,
    pub dry_run: Option<bool>,
    #[serde(flatten)]
    pub updates: CostUpdate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCostParams {
    pub cost: String,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

impl FleetTools {
    pub async fn costs_list(&self, params: CostsListParams) -> Outcome {
        let result = self
            .client
            .list_costs(
                params.search.as_deref(),
                params.kind.as_deref(),
                params.product_type.as_deref(),
                params.page,
                params.per_page,
            )
            .await;
        Outcome::from_read(pro_failure("list costs"), result)
    }

    pub async fn costs_get(&self, params: CostParams) -> Outcome {
        if blank(&params.cost) {
            return Outcome::invalid("Cost ID is required");
        }
        let result = self.client.get_cost(&params.cost).await;
        Outcome::from_read(pro_failure(&format!("get cost {}", params.cost)), result)
    }

    pub async fn costs_add(&self, params: AddCostParams) -> Outcome {
        if blank(&params.name) {
            return Outcome::invalid("Cost name is required");
        }
        let body = serde_json::to_value(&params).unwrap_or_else(|_| json!({ "name": params.name }));

        let mode = self.gate.resolve(None);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Add cost {}", params.name),
                vec![params.name.clone()],
                Some(body),
            );
        }
        match self.client.add_cost(body).await {
            Ok(result) => Outcome::applied(format!("Successfully added cost: {}", params.name), result),
            Err(e) => Outcome::from_client(pro_failure(&format!("add cost {}", params.name)), &e),
        }
    }

    pub async fn costs_edit(&self, params: EditCostParams) -> Outcome {
        let cost = params.cost.as_str();
        if blank(cost) {
            return Outcome::invalid("Cost ID is required");
        }
        let Some(updates) = non_empty_body(&params.updates) else {
            return Outcome::invalid("At least one field must be provided");
        };

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Edit cost {cost}"),
                vec![cost.to_string()],
                Some(json!({ "updates": updates })),
            );
        }
        match self.client.edit_cost(cost, updates).await {
            Ok(result) => Outcome::applied(format!("Successfully updated cost: {cost}"), result),
            Err(e) => Outcome::from_client(pro_failure(&format!("edit cost {cost}")), &e),
        }
    }

    pub async fn costs_delete(&self, params: DeleteCostParams) -> Outcome {
        let cost = params.cost.as_str();
        if blank(cost) {
            return Outcome::invalid("Cost ID is required");
        }
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Delete cost {cost}"),
                vec![cost.to_string()],
                Some(json!({ "action": "delete", "confirmed": params.confirmed })),
            );
        }
        if let Err(e) = self.guard.check_destructive(
            &format!("Deleting cost {cost}"),
            "This action cannot be undone.",
            params.confirmed,
        ) {
            return Outcome::from_guard(e);
        }
        match self.client.delete_cost(cost).await {
            Ok(result) => Outcome::applied(format!("Successfully deleted cost: {cost}"), result),
            Err(e) => Outcome::from_client(pro_failure(&format!("delete cost {cost}")), &e),
        }
    }
}
