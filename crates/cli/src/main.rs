use std::path::PathBuf;

use anyhow::Context;
use atlas_db::{Book, SqliteCatalog};
use atlas_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "atlas-cli", version, about = "Operate an ATLAS shelves deployment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server.
    Serve,
    /// Apply pending migrations to the shelf store.
    Migrate,
    /// Create an empty book catalog for local development.
    InitCatalog {
        /// Catalog file; defaults to `database.catalog_path`.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Insert a book into a development catalog and print its id.
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long)]
        series: Option<String>,
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the effective database locations.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load ATLAS settings")?;
    atlas_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(atlas_shelves::run(settings))?;
        }
        Command::Migrate => {
            let applied = atlas_shelves::migrate(&settings)?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
        Command::InitCatalog { path } => {
            let path = path.unwrap_or(settings.database.catalog_path);
            SqliteCatalog::create(&path)
                .with_context(|| format!("failed to create catalog at {}", path.display()))?;
            println!("catalog ready at {}", path.display());
        }
        Command::AddBook {
            title,
            author,
            series,
            path,
        } => {
            let path = path.unwrap_or(settings.database.catalog_path);
            let catalog = SqliteCatalog::create(&path)
                .with_context(|| format!("failed to open catalog at {}", path.display()))?;
            let id = catalog.insert_book(&Book {
                id: 0,
                title,
                author_sort: author,
                series,
                series_index: 1.0,
                pubdate: None,
                timestamp: None,
                custom_1: None,
                custom_2: None,
            })?;
            println!("{id}");
        }
        Command::Config => {
            let summary = serde_json::json!({
                "environment": format!("{:?}", settings.environment).to_lowercase(),
                "app_path": settings.database.app_path,
                "catalog_path": settings.database.catalog_path,
                "listen": format!("{}:{}", settings.server.host, settings.server.port),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
