use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::error::PipelineError;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the level chosen by
/// `verbose`.
pub fn init_logging(verbose: bool, format: LogFormat) -> Result<(), PipelineError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(formatter)
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(formatter.json())
            .with(filter)
            .try_init(),
    };
    installed.map_err(|err| PipelineError::new("logging", err.to_string()))
}
