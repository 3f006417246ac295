//! Things 3 MCP server library.
//!
//! Provides the [`server::Things3McpServer`] MCP handler, the AppleScript and
//! `things:///` URL builders behind it, and the snapshot backup format.
//! Used by the `things3-mcp` binary and by integration tests.

pub mod backup;
pub mod runner;
pub mod scheme;
pub mod script;
pub mod server;
pub mod tools;
