use std::fmt;

use dt_core::diagnostics::{Diagnostic, DiagnosticDisplayOptions, DiagnosticManager};

use crate::config::PipelineOptions;

#[derive(Debug, Default, Clone)]
pub struct PipelineDiagnostics {
    pub items: Vec<Diagnostic>,
}

impl PipelineDiagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn emit_stage(&mut self, stage: &'static str, options: &PipelineOptions) {
        if self.items.is_empty() {
            return;
        }
        let opts = DiagnosticDisplayOptions::pretty(options.debug.verbose);
        DiagnosticManager::emit(&self.items, Some(stage), &opts);
        self.items.clear();
    }
}

/// Failure of one stage. Output of a failed compilation is never produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineError {
    pub stage: &'static str,
    /// Category label of the underlying compiler error
    pub category: &'static str,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            category: "internal",
            message: message.into(),
        }
    }

    pub fn from_core(stage: &'static str, err: &dt_core::Error) -> Self {
        let message = match err {
            dt_core::Error::Compiler { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            stage,
            category: err.category(),
            message,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.category, self.message)
    }
}

impl std::error::Error for PipelineError {}
