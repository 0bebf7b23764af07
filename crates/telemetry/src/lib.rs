//! Tracing subscriber bootstrap driven by [`TelemetrySettings`].

use atlas_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `settings.filter`. Calling this twice is
/// harmless; the second subscriber is discarded.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", settings.filter, e))?;

    // stdout belongs to command output.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            target: "atlas-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let settings = TelemetrySettings::default();
        init(&settings).unwrap();
        init(&settings).unwrap();
    }

    #[test]
    fn invalid_filter_is_reported() {
        std::env::remove_var("RUST_LOG");
        let settings = TelemetrySettings {
            filter: "atlas=notalevel".to_string(),
            ..TelemetrySettings::default()
        };
        assert!(init(&settings).is_err());
    }
}
