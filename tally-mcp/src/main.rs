//! Tally MCP Server
//!
//! Line-delimited JSON-RPC over stdio. Logs go to stderr.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::env;
use std::io::{self, BufRead, Write};
use tally_core::AnalyticsConfig;
use tally_plugin::{EvalContext, PluginRegistry};
use tracing_subscriber::EnvFilter;

mod tools;

const SERVER_NAME: &str = "tally";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Path of an optional JSON config file
const CONFIG_ENV: &str = "TALLY_CONFIG";

// ============================================================================
// MCP Protocol Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<JsonValue>,
    method: String,
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

impl McpResponse {
    fn new(id: Option<JsonValue>, result: Result<JsonValue, McpError>) -> Self {
        let (result, error) = match result {
            Ok(r) => (Some(r), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl McpError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn parse(message: impl Into<String>) -> Self {
        Self::new(-32700, message)
    }

    fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(-32603, message)
    }
}

// ============================================================================
// Server
// ============================================================================

struct Server {
    registry: PluginRegistry,
    ctx: EvalContext,
}

impl Server {
    fn new(config: AnalyticsConfig) -> Self {
        Self {
            registry: tally_analytics::load_analytics_library(PluginRegistry::new()),
            ctx: EvalContext::default().with_config(config),
        }
    }

    fn handle_request(&self, request: &McpRequest) -> McpResponse {
        let result = match request.method.as_str() {
            "initialize" => handle_initialize(&request.params),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(tools::tool_definitions()),
            "tools/call" => self.handle_tool_call(&request.params),
            _ => Err(McpError::method_not_found(&request.method)),
        };
        McpResponse::new(request.id.clone(), result)
    }

    fn handle_tool_call(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let params = params
            .as_ref()
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;
        let name = params
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;
        let empty = json!({});
        let arguments = params.get("arguments").unwrap_or(&empty);

        tracing::debug!(tool = name, "tool call");
        tools::dispatch(&self.registry, &self.ctx, name, arguments)
    }
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params
        .as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");
    let client_protocol = params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    tracing::info!(client = client_info, protocol = client_protocol, "client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Descriptive statistics, trends, forecasts, anomalies and aggregation"
        },
        "capabilities": {
            "tools": { "listChanged": false }
        }
    }))
}

fn load_config() -> Result<AnalyticsConfig, tally_core::ConfigError> {
    match env::var(CONFIG_ENV) {
        Ok(path) => {
            tracing::info!(path = %path, "loading config");
            AnalyticsConfig::from_file(path)
        }
        Err(_) => Ok(AnalyticsConfig::default()),
    }
}

fn write_response(stdout: &mut impl Write, response: &McpResponse) -> io::Result<()> {
    let line = serde_json::to_string(response).map_err(io::Error::other)?;
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let server = Server::new(config);

    tracing::info!(
        version = SERVER_VERSION,
        protocol = PROTOCOL_VERSION,
        functions = server.registry.len(),
        "server ready"
    );

    let stdin = io::stdin();
    let reader = io::BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "error reading input");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) => {
                tracing::debug!(method = %request.method, "processing");
                let response = server.handle_request(&request);
                // Notifications get no response
                if request.id.is_none() {
                    continue;
                }
                response
            }
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                McpResponse::new(None, Err(McpError::parse(format!("Parse error: {}", e))))
            }
        };

        if let Err(e) = write_response(&mut io::stdout().lock(), &response) {
            tracing::error!(error = %e, "error writing response");
            break;
        }
    }

    tracing::info!("client disconnected, shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: Option<i64>, method: &str, params: JsonValue) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: id.map(|i| json!(i)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[test]
    fn test_initialize_echoes_protocol() {
        let server = Server::new(AnalyticsConfig::default());
        let resp = server.handle_request(&request(Some(1), "initialize", json!({"protocolVersion": "2025-03-26"})));
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], json!("2025-03-26"));
        assert_eq!(result["serverInfo"]["name"], json!("tally"));
    }

    #[test]
    fn test_unknown_method() {
        let server = Server::new(AnalyticsConfig::default());
        let resp = server.handle_request(&request(Some(2), "resources/list", json!({})));
        assert_eq!(resp.error.map(|e| e.code), Some(-32601));
    }

    #[test]
    fn test_tools_list() {
        let server = Server::new(AnalyticsConfig::default());
        let resp = server.handle_request(&request(Some(3), "tools/list", json!({})));
        let result = resp.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names, vec!["call", "describe", "aggregate", "help", "list_functions"]);
    }

    #[test]
    fn test_tool_call_uses_config() {
        let config = AnalyticsConfig {
            forecast_periods: 5,
            ..AnalyticsConfig::default()
        };
        let server = Server::new(config);
        let params = json!({
            "name": "call",
            "arguments": {"name": "linear_forecast", "args": [[1, 2, 3]]}
        });
        let resp = server.handle_request(&request(Some(4), "tools/call", params));
        let result = resp.result.unwrap();
        assert_eq!(result["data"]["predictions"].as_array().map(|p| p.len()), Some(5));
    }

    #[test]
    fn test_tool_call_missing_name() {
        let server = Server::new(AnalyticsConfig::default());
        let resp = server.handle_request(&request(Some(5), "tools/call", json!({"arguments": {}})));
        assert_eq!(resp.error.map(|e| e.code), Some(-32602));
    }

    #[test]
    fn test_write_response_is_one_line() {
        let mut out = Vec::new();
        let resp = McpResponse::new(Some(json!(7)), Ok(json!({"ok": true})));
        write_response(&mut out, &resp).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{\"ok\":true}}\n");
    }
}
