//! Error types shared by the weaver media crates.

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};

/// Main error type for configuration and file handling.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum WeaverError {
    /// IO error
    #[error(transparent)]
    #[diagnostic(code(weaver::io))]
    Io(#[from] std::io::Error),

    /// Parse error with source location
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Serde(#[from] SerDeError),

    /// The file extension does not map to a known format.
    #[error("unsupported file format: {0}")]
    #[diagnostic(
        code(weaver::format),
        help("configuration files must end in .toml or .json")
    )]
    UnsupportedFormat(String),
}

/// Parse error with source code location information
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("parse error: {message}")]
#[diagnostic(code(weaver::parse))]
pub struct ParseError {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    err_location: Option<SourceSpan>,
    #[help]
    advice: Option<String>,
}

impl ParseError {
    /// Build from a TOML deserialization failure over `source`.
    pub fn toml(name: impl AsRef<str>, source: String, err: toml::de::Error) -> Self {
        let err_location = err
            .span()
            .map(|span| SourceSpan::new(span.start.into(), span.end - span.start));
        Self {
            message: err.message().to_owned(),
            src: NamedSource::new(name, source),
            err_location,
            advice: None,
        }
    }

    /// Build from a JSON deserialization failure over `source`.
    pub fn json(name: impl AsRef<str>, source: String, err: serde_json::Error) -> Self {
        let location = SourceOffset::from_location(&source, err.line(), err.column());
        Self {
            message: err.to_string(),
            err_location: Some(SourceSpan::new(location, 0)),
            src: NamedSource::new(name, source),
            advice: None,
        }
    }

    /// Attach a help message shown under the diagnostic.
    pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice = Some(advice.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<SourceSpan> {
        self.err_location
    }
}

/// Serialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error(transparent)]
    #[diagnostic(code(weaver::serde::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(weaver::serde::toml))]
    Toml(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_error_points_at_offending_value() {
        let source = "[links]\ndefault_protocol = \n".to_string();
        let err = toml::from_str::<toml::Table>(&source).unwrap_err();
        let parsed = ParseError::toml("config.toml", source, err);
        assert!(parsed.location().is_some());
        assert!(!parsed.message().is_empty());
    }

    #[test]
    fn json_error_has_location() {
        let source = "{\n  \"links\": ,\n}".to_string();
        let err = serde_json::from_str::<serde_json::Value>(&source).unwrap_err();
        let parsed = ParseError::json("config.json", source, err);
        let span = parsed.location().unwrap();
        // Second line, after the key.
        assert!(span.offset() > 2);
    }
}
