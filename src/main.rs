use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio::config::Config;
use portfolio::models::CategoryDeletePolicy;
use portfolio::{api, db};

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(about = "Project catalog with categories")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,

        /// What to do with projects whose category is deleted: restrict, detach or cascade
        #[arg(long)]
        category_delete: Option<CategoryDeletePolicy>,
    },
    /// Create the schema and insert the default categories into an empty database
    Seed {
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "portfolio=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<db::Database> {
    let path = match path {
        Some(path) => path,
        None => db::Database::default_path()?,
    };
    tracing::info!("Using database at {}", path.display());

    let db = db::Database::open(path.clone())
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    db.migrate()?;
    Ok(db)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let db = open_database(config.database.clone())?;
    let app = api::create_router_with_policy(db, config.category_delete);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        "Portfolio server listening on http://{} (category delete policy: {})",
        config.bind_addr(),
        config.category_delete
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn seed(path: Option<PathBuf>) -> anyhow::Result<()> {
    let db = open_database(path)?;
    println!("Database schema updated.");

    let created = db.seed_categories()?;
    if created.is_empty() {
        println!("\nCategories already exist, skipping seed.");
    } else {
        println!("\nCategories created:");
        for category in &created {
            println!("   [{}] {}", category.id, category.name);
        }
    }

    println!("\nDone!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            db,
            category_delete,
        }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if db.is_some() {
                config.database = db;
            }
            if let Some(policy) = category_delete {
                config.category_delete = policy;
            }
            serve(config).await?;
        }
        Some(Commands::Seed { db }) => {
            seed(db.or(config.database))?;
        }
        None => {
            serve(config).await?;
        }
    }

    Ok(())
}
