//! Line-delimited JSON server over stdio.
//!
//! Each input line is one request; each output line is one response. Calls run
//! concurrently and share one `ToolRegistry`, so responses may arrive out of
//! order and are matched by `id`.

use fleet_tools::{ToolRegistry, ToolResult};
use gateway_lifecycle::{LifecycleError, ShutdownGate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One tool call read from the input stream.
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub id: Value,
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// One result written to the output stream.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CallResponse {
    pub id: Value,
    pub text: String,
    pub is_error: bool,
}

impl CallResponse {
    fn from_result(id: Value, result: ToolResult) -> Self {
        Self {
            id,
            text: result.text,
            is_error: result.is_error,
        }
    }

    fn error(id: Value, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_error: true,
        }
    }
}

/// Serve requests from `reader` until EOF or shutdown.
///
/// On exit, no new calls are admitted and every admitted call is allowed to
/// finish and write its response before this returns.
pub async fn serve<R, W>(
    registry: ToolRegistry,
    gate: ShutdownGate,
    reader: R,
    writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<CallResponse>();
    let writer_task = tokio::spawn(write_responses(rx, writer));

    let mut shutdown_rx = gate.subscribe();
    let mut lines = reader.lines();

    info!("Gateway accepting calls");

    loop {
        if gate.is_shutting_down() {
            break;
        }

        let line = tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Gateway shutdown requested");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            info!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        admit(&registry, &gate, &line, &tx);
    }

    gate.begin_shutdown();
    info!(in_flight = gate.in_flight(), "Draining in-flight calls");
    gate.wait_idle().await;

    drop(tx);
    match writer_task.await {
        Ok(result) => result,
        Err(e) => Err(std::io::Error::other(e)),
    }
}

/// Parse one input line and either start the call or answer immediately.
fn admit(
    registry: &ToolRegistry,
    gate: &ShutdownGate,
    line: &str,
    tx: &mpsc::UnboundedSender<CallResponse>,
) {
    let request: CallRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed request line");
            let _ = tx.send(CallResponse::error(
                Value::Null,
                format!("Invalid request: {e}"),
            ));
            return;
        }
    };

    let Some(permit) = gate.try_enter() else {
        debug!(tool = %request.tool, "Rejected call during shutdown");
        let _ = tx.send(CallResponse::error(
            request.id,
            LifecycleError::ShuttingDown.to_string(),
        ));
        return;
    };

    let registry = registry.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _permit = permit;
        debug!(tool = %request.tool, id = %request.id, "Call started");
        let result = registry.dispatch(&request.tool, request.arguments).await;
        if tx
            .send(CallResponse::from_result(request.id, result))
            .is_err()
        {
            warn!(tool = %request.tool, "Response dropped; writer closed");
        }
    });
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<CallResponse>,
    mut writer: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_api_client::testing::ScriptedTransport;
    use fleet_api_client::{FleetApiClient, Method, RateLimiter};
    use fleet_tools::FleetTools;
    use gateway_config_and_utils::SafetyPolicy;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, BufReader};

    fn registry(transport: Arc<ScriptedTransport>) -> ToolRegistry {
        let client = FleetApiClient::new(transport, Arc::new(RateLimiter::new(100)));
        ToolRegistry::new(FleetTools::new(client, SafetyPolicy::default()))
    }

    async fn run(registry: ToolRegistry, gate: ShutdownGate, input: &str) -> Vec<CallResponse> {
        let (writer, mut out) = tokio::io::duplex(64 * 1024);
        serve(registry, gate, BufReader::new(input.as_bytes()), writer)
            .await
            .unwrap();

        let mut raw = String::new();
        out.read_to_string(&mut raw).await.unwrap();
        raw.lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn answers_each_request_line() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::Get, "/sites/count", Ok(json!({"count": 3})));

        let input = concat!(
            "{\"id\": 1, \"tool\": \"sites_count\"}\n",
            "\n",
            "{\"id\": \"b\", \"tool\": \"nope\", \"arguments\": {}}\n",
        );
        let mut responses = run(registry(transport), ShutdownGate::new(), input).await;
        responses.sort_by_key(|r| r.is_error);

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, json!(1));
        assert!(!responses[0].is_error);
        assert!(responses[0].text.contains("\"count\": 3"));
        assert_eq!(
            responses[1],
            CallResponse {
                id: json!("b"),
                text: "Unknown tool: nope".into(),
                is_error: true,
            }
        );
    }

    #[tokio::test]
    async fn malformed_line_gets_an_error_response() {
        let transport = Arc::new(ScriptedTransport::new());
        let responses = run(registry(transport), ShutdownGate::new(), "not json\n").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, Value::Null);
        assert!(responses[0].is_error);
        assert!(responses[0].text.starts_with("Invalid request:"));
    }

    #[tokio::test]
    async fn eof_begins_shutdown() {
        let transport = Arc::new(ScriptedTransport::new());
        let gate = ShutdownGate::new();
        let responses = run(registry(transport), gate.clone(), "").await;

        assert!(responses.is_empty());
        assert!(gate.is_shutting_down());
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn calls_after_shutdown_are_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        let registry = registry(transport.clone());
        let gate = ShutdownGate::new();
        gate.begin_shutdown();

        let (tx, mut rx) = mpsc::unbounded_channel();
        admit(
            &registry,
            &gate,
            r#"{"id": 9, "tool": "sites_count"}"#,
            &tx,
        );

        let response = rx.recv().await.unwrap();
        assert_eq!(
            response,
            CallResponse {
                id: json!(9),
                text: "Gateway is shutting down; no new calls are accepted".into(),
                is_error: true,
            }
        );
        assert!(transport.requests().is_empty());
    }
}
