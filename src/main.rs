use anyhow::Context;
use atlas_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load ATLAS settings")?;
    atlas_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        app_db = %settings.database.app_path.display(),
        catalog = %settings.database.catalog_path.display(),
        "atlas-shelves bootstrap starting"
    );

    atlas_shelves::run(settings).await
}
