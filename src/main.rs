use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lorekeep::cli::{self, list, migrate, project, search, show, stats, ProjectScope};
use lorekeep::config::Config;
use lorekeep::model::ArtifactKind;
use lorekeep::query::{PatternQuery, PlanQuery, SessionQuery};
use lorekeep::store::{SqliteStore, StorageAdapter};

#[derive(Parser)]
#[command(name = "lorekeep")]
#[command(about = "Migrate markdown project knowledge into SQLite and query it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Project root containing the knowledge directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Query every project instead of the one at --root
    #[arg(long, global = true)]
    all_projects: bool,

    /// Print structured JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the knowledge directory under --root into the store
    Migrate,

    /// List sessions
    Sessions {
        #[arg(long)]
        status: Option<String>,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },

    /// List plans
    Plans {
        #[arg(long)]
        status: Option<String>,
        /// Earliest created date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest created date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },

    /// List learned patterns
    Patterns {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },

    /// Full-text search
    Search {
        query: String,
        /// sessions, plans, patterns or all
        #[arg(short, long, default_value = "all")]
        scope: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one artifact with its full content
    Show {
        /// session, plan or pattern
        kind: String,
        id: String,
    },

    /// Rebuild the search index from stored records
    Reindex,

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Show statistics
    Stats,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List all projects
    List,
    /// Point a project at a new root directory
    Move {
        /// Project ID (prefix) or name
        project: String,
        /// New root directory
        root: String,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "lorekeep=warn",
        1 => "lorekeep=info",
        _ => "lorekeep=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load config
    let config = Config::load(cli.config.as_deref())?;

    // Initialize store
    let db_path = config.database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open store at {}", db_path.display()))?;

    let scope = ProjectScope::new(&cli.root, cli.all_projects);
    let json = cli.json;

    match cli.command {
        Commands::Migrate => {
            migrate::run(&store, &config, &cli.root, json)?;
        }
        Commands::Sessions {
            status,
            from,
            to,
            topic,
            author,
            limit,
            offset,
        } => {
            let engine = cli::engine(&store, &config, &scope)?;
            let query = SessionQuery {
                status,
                date_from: from,
                date_to: to,
                topic,
                author,
                limit,
                offset,
            };
            list::sessions(&engine, &query, json)?;
        }
        Commands::Plans {
            status,
            from,
            to,
            topic,
            author,
            limit,
            offset,
        } => {
            let engine = cli::engine(&store, &config, &scope)?;
            let query = PlanQuery {
                status,
                date_from: from,
                date_to: to,
                topic,
                author,
                limit,
                offset,
            };
            list::plans(&engine, &query, json)?;
        }
        Commands::Patterns {
            category,
            keyword,
            limit,
            offset,
        } => {
            let engine = cli::engine(&store, &config, &scope)?;
            let query = PatternQuery {
                category,
                keyword,
                limit,
                offset,
            };
            list::patterns(&engine, &query, json)?;
        }
        Commands::Search {
            query,
            scope: search_scope,
            limit,
        } => {
            let engine = cli::engine(&store, &config, &scope)?;
            search::run(&engine, &query, &search_scope, limit, json)?;
        }
        Commands::Show { kind, id } => {
            let kind: ArtifactKind = kind.parse()?;
            let engine = cli::engine(&store, &config, &ProjectScope::new(&cli.root, false))?;
            show::run(&engine, kind, &id, json)?;
        }
        Commands::Reindex => {
            stats::reindex(&store, json)?;
        }
        Commands::Project { command } => match command {
            ProjectCommands::List => {
                project::list(&store, json)?;
            }
            ProjectCommands::Move { project, root } => {
                project::move_root(&store, &project, &root)?;
            }
        },
        Commands::Stats => {
            stats::run(&store, &config, &scope, json)?;
        }
    }

    let mut store = store;
    store.close()?;
    Ok(())
}
