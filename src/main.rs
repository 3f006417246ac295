//! Things 3 MCP Server
//!
//! Model Context Protocol server exposing Things 3 task management
//! (viewing, creation, search, completion, moving, editing, backups)
//! to LLM agents over stdio.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use things3_mcp::script::MatchPolicy;
use things3_mcp::server::{ServerSettings, Things3McpServer};

#[derive(Debug, Parser)]
#[command(name = "things3-mcp", version, about = "MCP server for the Things 3 task manager")]
struct Cli {
    /// Disambiguation policy when a title substring matches several items.
    #[arg(long, value_enum, default_value_t = MatchPolicy::First)]
    match_policy: MatchPolicy,

    /// Seconds to wait for a single AppleScript call.
    #[arg(long, default_value_t = 10)]
    script_timeout: u64,

    /// Directory for backup files when no backup_path is given
    /// (defaults to the desktop).
    #[arg(long)]
    backup_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("things3_mcp=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("things3-mcp starting (stdio transport)");

    let server = Things3McpServer::new(ServerSettings {
        match_policy: cli.match_policy,
        script_timeout: Duration::from_secs(cli.script_timeout),
        backup_dir: cli.backup_dir,
    });
    let transport = rmcp::transport::io::stdio();

    let service = server.serve(transport).await?;
    service.waiting().await?;

    Ok(())
}
