//! Client records (Pro endpoints).

use crate::ops::sites::blank;
use crate::outcome::Outcome;
use crate::tools::FleetTools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const PRO_HINT: &str = "This feature requires MainWP Pro with Client Reports extension.";

fn pro_failure(what: &str) -> String {
    format!("Failed to {what}. {PRO_HINT}")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientsListParams {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientParams {
    pub client: String,
}

/// Optional contact fields shared by add and edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Comma-separated site ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_sites: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddClientParams {
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub details: ClientDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditClientParams {
    pub client: String,
    pub dry_run: Option<bool>,
    #[serde(flatten)]
    pub updates: ClientUpdate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub details: ClientDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteClientParams {
    pub client: String,
    #[serde(default)]
    pub confirmed: bool,
    pub dry_run: Option<bool>,
}

/// Serialize a field set, treating an empty object as "nothing to send".
pub(crate) fn non_empty_body<T: Serialize>(fields: &T) -> Option<Value> {
    serde_json::to_value(fields)
        .ok()
        .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))
}

impl FleetTools {
    pub async fn clients_list(&self, params: ClientsListParams) -> Outcome {
        let result = self
            .client
            .list_clients(params.search.as_deref(), params.page, params.per_page)
            .await;
        Outcome::from_read(pro_failure("list clients"), result)
    }

    pub async fn clients_get(&self, params: ClientParams) -> Outcome {
        if blank(&params.client) {
            return Outcome::invalid("Client ID or email is required");
        }
        let result = self.client.get_client(&params.client).await;
        Outcome::from_read(pro_failure(&format!("get client {}", params.client)), result)
    }

    pub async fn clients_add(&self, params: AddClientParams) -> Outcome {
        if blank(&params.name) || blank(&params.email) {
            return Outcome::invalid("Client name and email are required");
        }
        let body = serde_json::to_value(&params).unwrap_or_else(|_| {
            json!({ "name": params.name, "email": params.email })
        });

        let mode = self.gate.resolve(None);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Add client {}", params.name),
                vec![params.email.clone()],
                Some(body),
            );
        }
        match self.client.add_client(body).await {
            Ok(result) => {
                Outcome::applied(format!("Successfully added client: {}", params.name), result)
            }
            Err(e) => Outcome::from_client(pro_failure(&format!("add client {}", params.name)), &e),
        }
    }

    pub async fn clients_edit(&self, params: EditClientParams) -> Outcome {
        let client = params.client.as_str();
        if blank(client) {
            return Outcome::invalid("Client ID or email is required");
        }
        let Some(updates) = non_empty_body(&params.updates) else {
            return Outcome::invalid("At least one field must be provided");
        };

        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Edit client {client}"),
                vec![client.to_string()],
                Some(json!({ "updates": updates })),
            );
        }
        match self.client.edit_client(client, updates).await {
            Ok(result) => Outcome::applied(format!("Successfully updated client: {client}"), result),
            Err(e) => Outcome::from_client(pro_failure(&format!("edit client {client}")), &e),
        }
    }

    pub async fn clients_delete(&self, params: DeleteClientParams) -> Outcome {
        let client = params.client.as_str();
        if blank(client) {
            return Outcome::invalid("Client ID or email is required");
        }
        let mode = self.gate.resolve(params.dry_run);
        if mode.is_preview() {
            return Outcome::simulated(
                mode,
                format!("Delete client {client}"),
                vec![client.to_string()],
                Some(json!({ "action": "delete", "confirmed": params.confirmed })),
            );
        }
        if let Err(e) = self.guard.check_destructive(
            &format!("Deleting client {client}"),
            "This action cannot be undone.",
            params.confirmed,
        ) {
            return Outcome::from_guard(e);
        }
        match self.client.delete_client(client).await {
            Ok(result) => Outcome::applied(format!("Successfully deleted client: {client}"), result),
            Err(e) => Outcome::from_client(pro_failure(&format!("delete client {client}")), &e),
        }
    }
}
