use async_trait::async_trait;
use axum::Router;

/// Context handed to modules while the application boots.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema change contributed by a module, applied once to the shelf store.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Unit of functionality mounted into the ATLAS HTTP server.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Path prefix the module's router is nested under.
    ///
    /// Defaults to `/api/{name}`; modules serving browser pages override it.
    fn mount_path(&self) -> String {
        format!("/api/{}", self.name())
    }

    /// Called during startup, after migrations have been applied.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Router for this module, nested under [`Module::mount_path`].
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) merged into the
    /// server document. Paths are relative to the mount path.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Migrations contributed by this module, in application order.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
