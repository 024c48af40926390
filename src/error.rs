use crate::syntax::Location;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of problem found while parsing. Numbers are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    UnexpectedEndOfInput,
    ExpectedBrace,
    ExpectedBracket,
    ExpectedEquals,
    ExpectedQuote,
    ExpectedTagName,
    ExpectedAttributeName,
    UnterminatedAttribute,
    UnterminatedComment,
    UnterminatedCData,
    UnterminatedDoctype,
    UnterminatedRawText,
    MissingEndTag,
    UnexpectedEndTag,
    MismatchedEndTag,
    InvalidTransition,
    DuplicateAttribute,
    UnknownDeclaration,
    VoidElementEndTag,
    NestingTooDeep,
}

impl DiagnosticCode {
    pub fn number(&self) -> u16 {
        match self {
            DiagnosticCode::UnexpectedEndOfInput => 1,
            DiagnosticCode::ExpectedBrace => 2,
            DiagnosticCode::ExpectedBracket => 3,
            DiagnosticCode::ExpectedEquals => 4,
            DiagnosticCode::ExpectedQuote => 5,
            DiagnosticCode::ExpectedTagName => 6,
            DiagnosticCode::ExpectedAttributeName => 7,
            DiagnosticCode::UnterminatedAttribute => 8,
            DiagnosticCode::UnterminatedComment => 9,
            DiagnosticCode::UnterminatedCData => 10,
            DiagnosticCode::UnterminatedDoctype => 11,
            DiagnosticCode::UnterminatedRawText => 12,
            DiagnosticCode::MissingEndTag => 13,
            DiagnosticCode::UnexpectedEndTag => 14,
            DiagnosticCode::MismatchedEndTag => 15,
            DiagnosticCode::InvalidTransition => 16,
            DiagnosticCode::DuplicateAttribute => 17,
            DiagnosticCode::UnknownDeclaration => 18,
            DiagnosticCode::VoidElementEndTag => 19,
            DiagnosticCode::NestingTooDeep => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnexpectedEndOfInput => "Unexpected end of input",
            DiagnosticCode::ExpectedBrace => "Expected brace",
            DiagnosticCode::ExpectedBracket => "Expected bracket",
            DiagnosticCode::ExpectedEquals => "Expected equals",
            DiagnosticCode::ExpectedQuote => "Expected quote",
            DiagnosticCode::ExpectedTagName => "Expected tag name",
            DiagnosticCode::ExpectedAttributeName => "Expected attribute name",
            DiagnosticCode::UnterminatedAttribute => "Unterminated attribute",
            DiagnosticCode::UnterminatedComment => "Unterminated comment",
            DiagnosticCode::UnterminatedCData => "Unterminated CDATA section",
            DiagnosticCode::UnterminatedDoctype => "Unterminated doctype",
            DiagnosticCode::UnterminatedRawText => "Unterminated raw text",
            DiagnosticCode::MissingEndTag => "Missing end tag",
            DiagnosticCode::UnexpectedEndTag => "Unexpected end tag",
            DiagnosticCode::MismatchedEndTag => "Mismatched end tag",
            DiagnosticCode::InvalidTransition => "Invalid transition",
            DiagnosticCode::DuplicateAttribute => "Duplicate attribute",
            DiagnosticCode::UnknownDeclaration => "Unknown declaration",
            DiagnosticCode::VoidElementEndTag => "End tag on void element",
            DiagnosticCode::NestingTooDeep => "Nesting too deep",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KLN{:04}", self.number())
    }
}

/// A message produced while parsing. Pure data: it never changes control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Option<Location>,
    ) -> Self {
        Self { severity, code, message: message.into(), location }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>, location: Option<Location>) -> Self {
        Self::new(Severity::Info, code, message, location)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, location: Option<Location>) -> Self {
        Self::new(Severity::Warning, code, message, location)
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Option<Location>) -> Self {
        Self::new(Severity::Error, code, message, location)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render with the offending source line and a caret underline.
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Same as `render`, with ANSI colors.
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let accent = match (color, self.severity) {
            (false, _) => "",
            (true, Severity::Error) => "\x1b[1;31m",
            (true, Severity::Warning) => "\x1b[1;33m",
            (true, Severity::Info) => "\x1b[1;36m",
        };
        let dim = if color { "\x1b[2m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        match &self.location {
            Some(location) => {
                let start = location.start();
                output.push_str(&format!(
                    " {}file:{} {}:{}:{}\n",
                    dim,
                    reset,
                    filename,
                    start.line + 1,
                    start.col + 1
                ));
            }
            None => output.push_str(&format!(" {}file:{} {}\n", dim, reset, filename)),
        }

        output.push_str(&format!(
            "{}{}[{}]:{} {}\n",
            accent, self.severity, self.code, reset, self.message
        ));

        if let Some(location) = &self.location {
            let start = location.start();
            if let Some(source_line) = source.lines().nth(start.line) {
                let line_number = start.line + 1;
                let width = line_number.to_string().len().max(2);
                output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
                output.push_str(&format!(
                    "{}{:>width$} |{} {}\n",
                    dim,
                    line_number,
                    reset,
                    source_line,
                    width = width
                ));

                let line_len = source_line.chars().count();
                let underline_len = if location.end().line == start.line {
                    location.end().col.saturating_sub(start.col).max(1)
                } else {
                    line_len.saturating_sub(start.col).max(1)
                };
                output.push_str(&format!(
                    "{}{:>width$} |{} {}{}{}{}\n",
                    dim,
                    "",
                    reset,
                    " ".repeat(start.col),
                    accent,
                    "^".repeat(underline_len),
                    reset,
                    width = width
                ));
            }
        }

        output.push('\n');
        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " [{}]", location)?;
        }
        Ok(())
    }
}

/// Fatal parse setup error. Malformed content never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no grammar registered for language '{language}'")]
    NoGrammar { language: String },
}

/// Error surfaced by the command-line front end.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("{}: {message}", path.display())]
    Input { path: PathBuf, message: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
