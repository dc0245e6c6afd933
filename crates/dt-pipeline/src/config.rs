use serde::{Deserialize, Serialize};

use dt_core::{Error, Result};
use dt_emit::EmitOptions;

/// Options for compiling one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Naming of emitted bindings and modules
    pub emit: EmitOptions,
    /// Debug options
    pub debug: DebugOptions,
    /// Format of log output installed by [`crate::init_logging`]
    pub log_format: LogFormat,
}

impl PipelineOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|err| Error::generic(format!("invalid pipeline options: {}", err)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Show informational diagnostics after each stage
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() -> Result<()> {
        let options =
            PipelineOptions::from_json_str(r#"{"emit": {"binding_prefix": "v"}, "log_format": "json"}"#)?;
        assert_eq!(options.emit.binding_prefix, "v");
        assert_eq!(options.emit.items_alias, "__items");
        assert_eq!(options.log_format, LogFormat::Json);
        assert!(!options.debug.verbose);
        Ok(())
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(PipelineOptions::from_json_str("{\"debug\": 3}").is_err());
    }
}
