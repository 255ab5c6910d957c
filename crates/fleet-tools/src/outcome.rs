//! The uniform result of every orchestrated operation.

use fleet_api_client::ClientError;
use safety_gate::{GuardError, OperatingMode, Preview};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// Why an operation failed, when the failure is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    RateLimited { retry_after_seconds: u64 },
    ConfirmationRequired { target_count: usize },
    Api { status: Option<u16> },
    Validation,
}

impl From<&ClientError> for FailureCause {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::RateLimited(e) => FailureCause::RateLimited {
                retry_after_seconds: e.retry_after_seconds,
            },
            ClientError::Api(e) => FailureCause::Api { status: e.status },
        }
    }
}

/// Exactly one of these is produced per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Simulated(Preview),
    Failure {
        message: String,
        cause: Option<FailureCause>,
    },
}

impl Outcome {
    pub fn success(payload: Value) -> Self {
        Outcome::Success(payload)
    }

    /// Success payload for a mutation that reached the remote API.
    pub fn applied(message: impl Into<String>, result: Value) -> Self {
        let message = message.into();
        info!(%message, "Fleet mutation applied");
        Outcome::Success(json!({ "message": message, "result": result }))
    }

    pub fn simulated(
        mode: OperatingMode,
        label: impl Into<String>,
        targets: Vec<String>,
        details: Option<Value>,
    ) -> Self {
        let preview = Preview::new(mode, label, targets);
        Outcome::Simulated(match details {
            Some(details) => preview.with_details(details),
            None => preview,
        })
    }

    /// `"<prefix>: <cause>"`, classified by the client error kind.
    pub fn from_client(prefix: impl AsRef<str>, error: &ClientError) -> Self {
        Outcome::Failure {
            message: format!("{}: {}", prefix.as_ref(), error),
            cause: Some(FailureCause::from(error)),
        }
    }

    pub fn from_guard(error: GuardError) -> Self {
        let target_count = match &error {
            GuardError::ConfirmationRequired { target_count } => *target_count,
            GuardError::DestructiveUnconfirmed { .. } => 1,
        };
        Outcome::Failure {
            message: error.to_string(),
            cause: Some(FailureCause::ConfirmationRequired { target_count }),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
            cause: Some(FailureCause::Validation),
        }
    }

    /// Fold a read result into an outcome.
    pub fn from_read(prefix: impl AsRef<str>, result: Result<Value, ClientError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::from_client(prefix, &e),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Outcome::Failure { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn render(&self) -> ToolResult {
        match self {
            Outcome::Success(Value::String(text)) => ToolResult::ok(text.clone()),
            Outcome::Success(value) => ToolResult::ok(
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            ),
            Outcome::Simulated(preview) => ToolResult::ok(preview.render()),
            Outcome::Failure { message, .. } => ToolResult::error(message.clone()),
        }
    }
}

/// The rendered form handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<Outcome> for ToolResult {
    fn from(outcome: Outcome) -> Self {
        outcome.render()
    }
}
