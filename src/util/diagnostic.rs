//! User-facing diagnostic messages.
//!
//! Every selection failure renders as a primary message, the context that
//! explains it (candidates, requested attributes, discarded variants), and a
//! numbered list of things the user can change.

use std::fmt;

/// Common suggestion messages for selection failures.
pub mod suggestions {
    pub const ADD_DISAMBIGUATING_ATTRIBUTE: &str =
        "Request an additional attribute that only one candidate provides";

    pub const ADD_DISAMBIGUATION_RULE: &str =
        "Declare a disambiguation rule (`prefer`) for one of the differing attributes";

    pub const REMOVE_TRANSFORM: &str =
        "Remove or narrow one of the competing transform registrations";

    pub const REGISTER_TRANSFORM: &str =
        "Register a transform whose `from` matches an existing variant and whose `to` matches the request";

    pub const CHECK_REQUEST: &str = "Check the requested attribute values for typos";

    pub const REPORT_BUG: &str =
        "Run with `--verbose` to see which collaborator failed during selection";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Warning, false) => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(false))
    }
}

/// A diagnostic message with context lines and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add several context lines under a heading line.
    pub fn with_context_list<I, S>(mut self, heading: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.context.push(heading.into());
        self.context
            .extend(items.into_iter().map(|item| format!("  - {}", item)));
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = format!("{}: {}\n", self.severity.label(color), self.message);

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
            output.push_str(&format!("\n{}: consider:\n", help));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("multiple variants of `lib` match")
            .with_context_list("candidates:", ["debug {flavor=debug}", "release {flavor=release}"])
            .with_suggestion(suggestions::ADD_DISAMBIGUATING_ATTRIBUTE);

        let output = diag.format(false);
        assert!(output.starts_with("error: multiple variants"));
        assert!(output.contains("  →   - debug {flavor=debug}"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Request an additional attribute"));
    }

    #[test]
    fn test_warning_without_suggestions_has_no_help_block() {
        let output = Diagnostic::warning("no variants").format(false);

        assert_eq!(output, "warning: no variants\n");
    }
}
