use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docshift_common::{Error, Result};
use docshift_engine::MigrationEngine;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tracing::{info, warn};

use crate::tools::{Tool, ToolContext, default_tools};

/// MCP server exposing the migration tools.
///
/// Tool failures are returned as JSON-RPC errors: unknown tools as invalid
/// params, anything raised while running a tool as an internal error
/// carrying the error text.
pub struct McpServer {
    context: ToolContext,
    tools: Vec<Box<dyn Tool>>,
    timeout: Duration,
}

impl McpServer {
    pub fn new(engine: Arc<MigrationEngine>, migrations_path: PathBuf, timeout: Duration) -> Self {
        Self {
            context: ToolContext {
                engine,
                migrations_path,
            },
            tools: default_tools(),
            timeout,
        }
    }

    /// Serve on stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!("MCP server listening on stdio");
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::Other(format!("MCP initialization failed: {e}")))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| Error::Other(format!("MCP server task failed: {e}")))?;
        info!("MCP server stopped: {reason:?}");
        Ok(())
    }

    pub fn tool_definitions(&self) -> Vec<rmcp::model::Tool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run one tool by name, bounded by the configured timeout.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ErrorData::invalid_params(format!("unknown tool: {name}"), None))?;

        let args = Value::Object(arguments.unwrap_or_default());
        info!("MCP tool call: {name}");

        let result = match tokio::time::timeout(self.timeout, tool.execute(&self.context, args))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{name} did not finish within {}s",
                self.timeout.as_secs()
            ))),
        };

        match result {
            Ok(output) => Ok(CallToolResult::success(vec![Content::text(output.content)])),
            Err(e) => {
                warn!("MCP tool {name} failed: {e}");
                Err(ErrorData::internal_error(e.to_string(), None))
            }
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::default();
        server_info.name = "docshift".to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(
            "Inspect, apply and roll back docshift migrations, or scaffold new ones.".to_string(),
        );
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_definitions()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        self.call(&request.name, request.arguments).await
    }
}
