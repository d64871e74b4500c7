use std::fmt;

use thiserror::Error;

/// How the checker reacts to an invalid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerifyMode {
    /// Stop at the first invalid line.
    #[default]
    FailFast,
    /// Keep going and report every invalid line.
    CollectAll,
}

impl VerifyMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::CollectAll => "collect-all",
        }
    }
}

impl TryFrom<&str> for VerifyMode {
    type Error = ParseVerifyModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("fail-fast") {
            Ok(Self::FailFast)
        } else if value.eq_ignore_ascii_case("collect-all") {
            Ok(Self::CollectAll)
        } else {
            Err(ParseVerifyModeError {
                raw: value.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode: {raw} (expected fail-fast or collect-all)")]
pub struct ParseVerifyModeError {
    raw: String,
}

/// Default bound on formula nesting, see [`crate::formula::parse_formula_with_limit`].
pub const DEFAULT_MAX_FORMULA_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    pub mode: VerifyMode,
    pub max_formula_depth: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            mode: VerifyMode::default(),
            max_formula_depth: DEFAULT_MAX_FORMULA_DEPTH,
        }
    }
}

impl CheckOptions {
    pub fn with_mode(self, mode: VerifyMode) -> Self {
        Self { mode, ..self }
    }
}

/// Position in the script text: 1-based source line and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckErrorKind {
    Syntax,
    Scope,
    Reference,
    RuleViolation,
}

impl CheckErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax error",
            Self::Scope => "scope error",
            Self::Reference => "reference error",
            Self::RuleViolation => "rule violation",
        }
    }
}

impl fmt::Display for CheckErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}{}{}", proof_line_suffix(.proof_line), span_suffix(.span))]
pub struct CheckError {
    kind: CheckErrorKind,
    message: String,
    span: Option<SourceSpan>,
    proof_line: Option<u32>,
}

impl CheckError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::Syntax, message)
    }

    pub fn scope(message: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::Scope, message)
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::Reference, message)
    }

    pub fn rule_violation(message: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::RuleViolation, message)
    }

    fn new(kind: CheckErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
            proof_line: None,
        }
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_proof_line(mut self, number: u32) -> Self {
        self.proof_line = Some(number);
        self
    }

    pub fn kind(&self) -> CheckErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }

    pub fn proof_line(&self) -> Option<u32> {
        self.proof_line
    }
}

fn proof_line_suffix(proof_line: &Option<u32>) -> String {
    proof_line
        .map(|number| format!(" (proof line {number})"))
        .unwrap_or_default()
}

fn span_suffix(span: &Option<SourceSpan>) -> String {
    span.as_ref()
        .map(|span| format!(" at {span}"))
        .unwrap_or_default()
}
