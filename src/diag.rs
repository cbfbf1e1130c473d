use std::fmt;

use crate::parsing::tokenization::CodeLocation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One compiler diagnostic. Printed to the error stream as
/// `<code>: <message>`, one per line, in the order reported.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub loc: Option<CodeLocation>,
    /// Warning promoted to an error by `CompileOptions::warnings_as_errors`.
    pub escalated: bool,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, loc: Option<CodeLocation>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            loc,
            escalated: false,
        }
    }

    pub fn warning(
        code: &'static str,
        message: impl Into<String>,
        loc: Option<CodeLocation>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            loc,
            escalated: false,
        }
    }

    /// Whether this diagnostic fails a compilation and gets printed:
    /// errors always, warnings only when escalated.
    pub fn is_reportable(&self) -> bool {
        matches!(self.severity, Severity::Error) || self.escalated
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub mod codes {
    // Syntax
    pub const UNEXPECTED_TOKEN: &str = "P0001";
    pub const UNTERMINATED_STRING: &str = "P0002";
    pub const INVALID_CHARACTER: &str = "P0003";
    pub const TOP_LEVEL_DECL_EXPECTED: &str = "P0004";
    pub const INVALID_ESCAPE: &str = "P0005";
    pub const INVALID_NUMBER: &str = "P0006";

    // Semantic
    pub const UNDEFINED_NAME: &str = "E0001";
    pub const UNKNOWN_METHOD: &str = "E0002";
    pub const ARGUMENT_COUNT_MISMATCH: &str = "E0003";
    pub const DUPLICATE_METHOD: &str = "E0004";
    pub const DUPLICATE_LOCAL: &str = "E0005";
    pub const INVALID_ASSIGN_TARGET: &str = "E0006";
    pub const EXTERN_CALL_IN_LIBRARY: &str = "E0007";
    pub const TOO_MANY_LOCALS: &str = "E0008";
    pub const METHOD_TOO_LARGE: &str = "E0009";

    // Warnings
    pub const UNUSED_LOCAL: &str = "W0001";
    pub const UNREADABLE_REFERENCE: &str = "W0002";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_code_and_message() {
        let d = Diagnostic::error(codes::UNDEFINED_NAME, "the name `x` does not exist", None);
        assert_eq!(d.to_string(), "E0001: the name `x` does not exist");
    }

    #[test]
    fn warnings_report_only_when_escalated() {
        let mut d = Diagnostic::warning(codes::UNUSED_LOCAL, "unused local `x`", None);
        assert!(!d.is_reportable());
        d.escalated = true;
        assert!(d.is_reportable());
    }
}
