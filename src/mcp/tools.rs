/// MCP Tool handlers for policykb.
///
/// 1. search          – keyword search with synonym expansion
/// 2. browse          – folder tree of the document root
/// 3. list_documents  – catalog entries with their tags
/// 4. fetch_document  – copy a catalogued document to a destination
/// 5. refresh_index   – rebuild the catalog from disk (admin)
/// 6. usage_stats     – dashboard numbers from the usage log (admin)
use crate::browse::render_tree;
use crate::kb::KbError;
use crate::mcp::server::McpContext;
use crate::search::SearchMode;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct SearchParams {
    /// Keyword to look for
    query: String,
    /// title | full (default: full)
    mode: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct ListParams {
    /// Only documents from this department
    department: Option<String>,
    /// Only documents from this year (e.g. '2024')
    year: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct FetchParams {
    /// Catalog path of the document
    path: String,
    /// Destination file or directory
    destination: String,
}

#[derive(Deserialize, JsonSchema)]
struct UsageParams {
    /// Number of latest events to include (default: 10)
    recent: Option<usize>,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

/// Caller mistakes become tool errors; everything else is internal.
fn kb_error(e: KbError) -> Result<CallToolResult, McpError> {
    match e {
        KbError::Session(_)
        | KbError::UnknownDocument(_)
        | KbError::SameFile(_)
        | KbError::Browse(_) => error_result(&e.to_string()),
        other => Err(McpError::internal_error(other.to_string(), None)),
    }
}

/// Run knowledge-base work that touches the disk off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, McpError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| McpError::internal_error(format!("blocking task failed: {e}"), None))
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: search ──────────────────────────────────────────────

    #[tool(
        description = "Search policy documents by keyword. Title matches score 10, excerpt matches score 5 in full mode. Known terms are expanded with synonyms."
    )]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.is_empty() {
            return error_result("query is required");
        }
        let mode = match p.mode.as_deref().map(str::parse::<SearchMode>) {
            None => SearchMode::default(),
            Some(Ok(mode)) => mode,
            Some(Err(e)) => return error_result(&e.to_string()),
        };

        let kb = Arc::clone(&self.ctx.kb);
        let session = Arc::clone(&self.ctx.session);
        let report = blocking(move || kb.search(&session, &p.query, mode)).await?;
        let value = serde_json::to_value(&report)
            .map_err(|e| McpError::internal_error(format!("encode failed: {e}"), None))?;
        json_result(value)
    }

    // ── Tool 2: browse ──────────────────────────────────────────────

    #[tool(description = "Show the folder tree of the knowledge base")]
    async fn browse(&self) -> Result<CallToolResult, McpError> {
        let kb = Arc::clone(&self.ctx.kb);
        match blocking(move || kb.browse()).await? {
            Ok(tree) => Ok(CallToolResult::success(vec![Content::text(render_tree(
                &tree,
            ))])),
            Err(e) => kb_error(e),
        }
    }

    // ── Tool 3: list_documents ──────────────────────────────────────

    #[tool(description = "List catalogued documents with department, year and category tags")]
    async fn list_documents(
        &self,
        params: Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let catalog = self.ctx.kb.catalog();
        let documents: Vec<serde_json::Value> = catalog
            .entries
            .iter()
            .filter(|e| p.department.as_ref().is_none_or(|d| &e.department == d))
            .filter(|e| p.year.as_ref().is_none_or(|y| &e.year == y))
            .map(|e| {
                serde_json::json!({
                    "name": e.name,
                    "path": e.path,
                    "type": e.doc_type,
                    "department": e.department,
                    "year": e.year,
                    "category": e.category_path,
                })
            })
            .collect();

        json_result(serde_json::json!({
            "summary": self.ctx.kb.summary(),
            "documents": documents,
        }))
    }

    // ── Tool 4: fetch_document ──────────────────────────────────────

    #[tool(description = "Copy a catalogued document to a destination file or directory")]
    async fn fetch_document(
        &self,
        params: Parameters<FetchParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.path.is_empty() || p.destination.is_empty() {
            return error_result("path and destination are required");
        }

        let kb = Arc::clone(&self.ctx.kb);
        let session = Arc::clone(&self.ctx.session);
        let outcome = blocking(move || {
            kb.fetch(&session, Path::new(&p.path), Path::new(&p.destination))
        })
        .await?;

        match outcome {
            Ok(written) => json_result(serde_json::json!({
                "success": true,
                "written": written,
            })),
            Err(e) => kb_error(e),
        }
    }

    // ── Tool 5: refresh_index ───────────────────────────────────────

    #[tool(description = "Drop the catalog cache and rescan the document root (admin only)")]
    async fn refresh_index(&self) -> Result<CallToolResult, McpError> {
        let kb = Arc::clone(&self.ctx.kb);
        let session = Arc::clone(&self.ctx.session);
        let outcome = blocking(move || kb.refresh(&session)).await?;

        match outcome {
            Ok(summary) => json_result(serde_json::json!({
                "success": true,
                "summary": summary,
            })),
            Err(e) => {
                warn!("Refresh rejected: {e}");
                kb_error(e)
            }
        }
    }

    // ── Tool 6: usage_stats ─────────────────────────────────────────

    #[tool(description = "Usage dashboard: totals, searches, downloads and per-department activity (admin only)")]
    async fn usage_stats(
        &self,
        params: Parameters<UsageParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.0.recent.unwrap_or(10);
        let kb = Arc::clone(&self.ctx.kb);
        let session = Arc::clone(&self.ctx.session);
        let outcome = blocking(move || {
            let stats = kb.usage_stats(&session)?;
            let recent = kb.recent_activity(&session, limit)?;
            Ok::<_, KbError>((stats, recent))
        })
        .await?;

        match outcome {
            Ok((stats, recent)) => json_result(serde_json::json!({
                "stats": stats,
                "recent": recent,
            })),
            Err(e) => kb_error(e),
        }
    }
}
