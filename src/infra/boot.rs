use crate::api::mcp::McpServer;
use crate::core::mcp::ServerInfo;
use crate::infra::config::Config;
use crate::infra::runtime::channel;
use crate::tools::registry::build_registry;

pub fn build_server(cfg: &Config) -> anyhow::Result<McpServer> {
    let registry = build_registry()?;
    let info = ServerInfo { name: cfg.server_name.clone(), version: cfg.server_version.clone() };
    Ok(McpServer::new(registry, info, cfg.protocol_version.clone()))
}

/// Register tools, then serve MCP over stdin/stdout until stdin closes.
pub async fn run_server(cfg: &Config) -> anyhow::Result<()> {
    let server = build_server(cfg)?;
    tracing::info!(
        name = %cfg.server_name,
        version = %cfg.server_version,
        tools = server.registry().len(),
        "BOOT calculator-mcp-server running on stdio"
    );

    let mut ch = channel::stdio(cfg.max_frame_bytes);
    let served = server.serve(&mut ch).await;
    drop(ch);
    served?;
    Ok(())
}
