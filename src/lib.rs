//! ATLAS shelves application.
//!
//! Wires the SQLite stores into the shelf module and serves it through the
//! ATLAS HTTP facade.

use std::sync::Arc;

use anyhow::Context;
use atlas_db::{SqliteCatalog, SqliteShelfStore};
use atlas_http::JsonPageRenderer;
use atlas_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;

pub use modules::shelves;

/// Open both databases, register modules, and bring the shelf store schema
/// up to date.
pub fn bootstrap(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let shelves = Arc::new(
        SqliteShelfStore::open(&settings.database.app_path).with_context(|| {
            format!(
                "failed to open shelf store at {}",
                settings.database.app_path.display()
            )
        })?,
    );
    let catalog = SqliteCatalog::open_read_only(&settings.database.catalog_path).with_context(
        || {
            format!(
                "failed to open catalog at {}",
                settings.database.catalog_path.display()
            )
        },
    )?;

    let state = shelves::ShelfState {
        shelves: shelves.clone(),
        catalog: Arc::new(catalog),
        renderer: Arc::new(JsonPageRenderer),
    };

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state);

    let applied = shelves
        .migrate(&registry.collect_migrations())
        .context("failed to apply migrations")?;
    tracing::info!(applied, "shelf store schema up to date");

    Ok(registry)
}

/// Apply pending migrations to the shelf store without starting the server.
pub fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let store = SqliteShelfStore::open(&settings.database.app_path).with_context(|| {
        format!(
            "failed to open shelf store at {}",
            settings.database.app_path.display()
        )
    })?;
    store
        .migrate(&modules::migrations())
        .context("failed to apply migrations")
}

/// Run the server until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = bootstrap(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    atlas_http::start_server(&registry, &settings).await?;
    registry.stop_modules().await?;

    Ok(())
}
