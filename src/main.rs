use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use policykb::browse::render_tree;
use policykb::config::Config;
use policykb::kb::{KnowledgeBase, SearchReport};
use policykb::mcp::server::{McpContext, McpServer};
use policykb::search::{SearchMode, highlight};
use policykb::session::{Session, authenticate};

/// Events shown under "recent" in the dashboard.
const RECENT_ACTIVITY: usize = 10;

#[derive(Parser)]
#[command(name = "policykb", version, about = "Policy document knowledge base")]
struct Cli {
    /// Path to config.json (generated with defaults when absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as this account instead of the guest session
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[arg(short, long, global = true, default_value = "")]
    password: String,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load or build the catalog and print a summary
    Index {
        /// Drop the cache and rescan (admin only)
        #[arg(long)]
        rebuild: bool,
    },
    /// Keyword search over titles and excerpts
    Search {
        query: String,
        /// title | full
        #[arg(long, default_value = "full")]
        mode: SearchMode,
        #[arg(long)]
        json: bool,
    },
    /// Print the folder tree of the document root
    Browse,
    /// Copy a catalogued document to a file or directory
    Fetch { path: PathBuf, dest: PathBuf },
    /// Usage dashboard (admin only)
    Stats,
    /// Remove the catalog cache (admin only)
    ClearCache,
    /// Run the MCP server on stdio
    Serve,
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("POLICYKB_LOG") {
        EnvFilter::new(env)
    } else if let Ok(env) = std::env::var("RUST_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 1. Load config
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    config.validate().context("Invalid configuration")?;
    let config = Arc::new(config);

    // 2. Resolve the acting session
    let session = match &cli.user {
        Some(username) => authenticate(&config.users, username, &cli.password)
            .with_context(|| format!("Login failed for {username}"))?,
        None => Session::guest(),
    };

    // 3. Open the knowledge base (cache or scan)
    let kb = Arc::new(KnowledgeBase::open(config.clone()));
    if cli.user.is_some() {
        kb.record_login(&session);
    }

    match cli.command {
        Command::Index { rebuild } => {
            let summary = if rebuild {
                kb.refresh(&session)?
            } else {
                kb.summary()
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Search { query, mode, json } => {
            let report = kb.search(&session, &query, mode);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Browse => {
            print!("{}", render_tree(&kb.browse()?));
        }
        Command::Fetch { path, dest } => {
            let written = kb.fetch(&session, &path, &dest)?;
            println!("{}", written.display());
        }
        Command::Stats => {
            let stats = kb.usage_stats(&session)?;
            let recent = kb.recent_activity(&session, RECENT_ACTIVITY)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "stats": stats,
                    "recent": recent,
                }))?
            );
        }
        Command::ClearCache => {
            kb.clear_cache(&session)?;
            println!("Removed {}", config.cache_path.display());
        }
        Command::Serve => {
            info!("Starting policykb MCP server...");
            let server = McpServer::new(McpContext {
                kb,
                session: Arc::new(session),
            });
            server.start().await?;
        }
    }

    Ok(())
}

fn print_report(report: &SearchReport) {
    if !report.expansions.is_empty() {
        println!("Also searching: {}", report.expansions.join(", "));
    }
    if report.matches.is_empty() {
        println!("No documents match \"{}\" ({})", report.query, report.mode);
        return;
    }
    println!("{} documents ({})", report.matches.len(), report.mode);
    for m in &report.matches {
        let e = &m.entry;
        println!(
            "{:>3}  [{}] {}",
            m.score,
            e.doc_type,
            highlight(&e.name, &report.query, "[", "]")
        );
        println!("     {} | {} | {}", e.department, e.year, e.category_path);
        println!("     {}", e.path.display());
    }
}
