//! # policykb: policy document knowledge base
//!
//! Indexes a department-organised tree of office documents (PDF, Word,
//! Excel, PowerPoint), tags each file with department, year and category,
//! and serves keyword search with synonym expansion to a CLI and to MCP
//! clients.
//!
//! ## Architecture
//!
//! - **[`config`]**: Configuration loading and validation
//! - **[`catalog`]**: Catalog entries, document types, versioned JSON cache
//! - **[`extractor`]**: Bounded text excerpts per document format
//! - **[`indexer`]**: Deterministic tree walk and path-derived tags
//! - **[`search`]**: Title/excerpt scoring with synonym expansion
//! - **[`session`]**: Accounts, roles and the acting user
//! - **[`usage`]**: CSV usage log and dashboard statistics
//! - **[`browse`]**: Folder tree rendering
//! - **[`kb`]**: The shared knowledge base tying the above together
//! - **[`mcp`]**: MCP server with 6 tool handlers (stdio transport via rmcp)

pub mod browse;
pub mod catalog;
pub mod config;
pub mod extractor;
pub mod indexer;
pub mod kb;
pub mod mcp;
pub mod search;
pub mod session;
pub mod usage;
