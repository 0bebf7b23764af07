use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "ATLAS_ENV";
const CONFIG_DIR_ENV: &str = "ATLAS_CONFIG_DIR";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("ATLAS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // ATLAS_ENV wins over whatever the files declared.
        settings.environment = environment.parse()?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8083
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Locations of the two SQLite databases.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Read-write store holding shelves and their memberships.
    #[serde(default = "DatabaseSettings::default_app_path")]
    pub app_path: PathBuf,
    /// Read-only book catalog.
    #[serde(default = "DatabaseSettings::default_catalog_path")]
    pub catalog_path: PathBuf,
}

impl DatabaseSettings {
    fn default_app_path() -> PathBuf {
        PathBuf::from("data/app.db")
    }

    fn default_catalog_path() -> PathBuf {
        PathBuf::from("data/metadata.db")
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            app_path: Self::default_app_path(),
            catalog_path: Self::default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Headers set by the authenticating reverse proxy in front of ATLAS.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "AuthSettings::default_user_header")]
    pub user_header: String,
    #[serde(default = "AuthSettings::default_roles_header")]
    pub roles_header: String,
}

impl AuthSettings {
    fn default_user_header() -> String {
        "x-atlas-user".to_string()
    }

    fn default_roles_header() -> String {
        "x-atlas-roles".to_string()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            user_header: Self::default_user_header(),
            roles_header: Self::default_roles_header(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_database_paths() {
        let settings = Settings::default();
        assert_eq!(settings.database.app_path, PathBuf::from("data/app.db"));
        assert_eq!(
            settings.database.catalog_path,
            PathBuf::from("data/metadata.db")
        );
    }

    #[test]
    fn default_auth_headers() {
        let auth = AuthSettings::default();
        assert_eq!(auth.user_header, "x-atlas-user");
        assert_eq!(auth.roles_header, "x-atlas-roles");
    }

    #[test]
    fn environment_parsing_rejects_unknown() {
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert!("qa".parse::<Environment>().is_err());
    }
}
