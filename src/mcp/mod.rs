//! MCP front end: exposes the knowledge base as tools over stdio.
pub mod server;
pub mod tools;
