use std::fmt::{Display, Formatter};

use crate::error::Error;

/// Built-in templates supported by the diagnostic manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticTemplate {
    Pretty,
    Plain,
}

/// Runtime configuration for emitting diagnostics.
#[derive(Debug, Clone)]
pub struct DiagnosticDisplayOptions {
    pub template: DiagnosticTemplate,
    pub verbose_info: bool,
}

impl DiagnosticDisplayOptions {
    pub fn pretty(verbose_info: bool) -> Self {
        Self {
            template: DiagnosticTemplate::Pretty,
            verbose_info,
        }
    }

    pub fn plain(verbose_info: bool) -> Self {
        Self {
            template: DiagnosticTemplate::Plain,
            verbose_info,
        }
    }
}

impl Default for DiagnosticDisplayOptions {
    fn default() -> Self {
        DiagnosticDisplayOptions::pretty(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// Category label of the error behind this diagnostic, if any.
    pub code: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Render with the given template; informational diagnostics are hidden unless verbose.
    pub fn render(&self, context: &str, options: &DiagnosticDisplayOptions) -> Option<String> {
        if self.level == DiagnosticLevel::Info && !options.verbose_info {
            return None;
        }
        let level = match (options.template, self.level) {
            (DiagnosticTemplate::Plain, DiagnosticLevel::Error) => "ERROR",
            (DiagnosticTemplate::Plain, DiagnosticLevel::Info) => "INFO",
            (DiagnosticTemplate::Pretty, DiagnosticLevel::Error) => "error",
            (DiagnosticTemplate::Pretty, DiagnosticLevel::Info) => "note",
        };
        Some(match self.code.as_ref() {
            Some(code) => format!("[{}] {}: {} ({})", context, level, self.message, code),
            None => format!("[{}] {}: {}", context, level, self.message),
        })
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let message = match err {
            Error::Compiler { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Diagnostic::error(message).with_code(err.category())
    }
}

/// Prints diagnostics for a pipeline stage.
pub struct DiagnosticManager;

impl DiagnosticManager {
    /// Print diagnostics to stderr, each prefixed with `context`.
    pub fn emit(diagnostics: &[Diagnostic], context: Option<&str>, options: &DiagnosticDisplayOptions) {
        for diagnostic in diagnostics {
            if let Some(line) = diagnostic.render(context.unwrap_or("pipeline"), options) {
                eprintln!("{}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::category;

    #[test]
    fn compiler_errors_carry_their_category() {
        let err = Error::compiler(category::UNKNOWN_MEMBER, "object has no member `x`");
        let diagnostic = Diagnostic::from(&err);
        let line = diagnostic
            .render("resolve", &DiagnosticDisplayOptions::plain(false))
            .unwrap();
        assert_eq!(line, "[resolve] ERROR: object has no member `x` (unknown-member)");
    }

    #[test]
    fn info_is_hidden_unless_verbose() {
        let note = Diagnostic::info("1 cycle patch");
        assert!(note.render("emit", &DiagnosticDisplayOptions::pretty(false)).is_none());
        assert!(note.render("emit", &DiagnosticDisplayOptions::pretty(true)).is_some());
    }
}
