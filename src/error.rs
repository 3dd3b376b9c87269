use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfError {
    #[error("Invalid syntax in '{text}': {reason}")]
    InvalidSyntax { text: String, reason: String },

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Property conflict at path '{path}'")]
    PropertyConflict { path: String },

    #[error("Property '{key}' does not exist")]
    NotExist { key: String },

    #[error("Property '{key}' is not a simple value")]
    NotSimpleValue { key: String },

    #[error("Property '{key}' is a value, not a map or list")]
    NotContainer { key: String },

    #[error("Cannot convert '{value}' to {target} at {path}: {message}")]
    Conversion {
        path: String,
        target: String,
        value: String,
        message: String,
    },

    #[error("No converter registered for {target}")]
    NoConverter { target: String },

    #[error("Map at {path} does not accept a default value")]
    MapDefaultNotAllowed { path: String },

    #[error("Struct at {path} does not accept a default value")]
    StructDefaultNotAllowed { path: String },

    #[error("Unknown splitter '{name}'")]
    UnknownSplitter { name: String },

    #[error("Splitter '{name}' failed on '{value}': {message}")]
    Splitter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Validation '{expr}' failed for value '{value}'")]
    ValidationFailed { expr: String, value: String },

    #[error("Cannot evaluate validation '{expr}': {message}")]
    InvalidExpression { expr: String, message: String },

    #[error("No validator registered to evaluate '{expr}'")]
    NoValidator { expr: String },

    #[error("Filter rejected {path}: {message}")]
    Filter { path: String, message: String },

    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("bind {path} ({type_name}): {source}")]
    Bind {
        path: String,
        type_name: String,
        source: Box<ConfError>,
    },

    #[error("refresh of '{key}' at {path} failed: {source}")]
    RefreshFailed {
        key: String,
        path: String,
        source: Box<ConfError>,
    },

    #[error("Watcher panicked: {message}")]
    Panicked { message: String },

    #[error("Refresh failed for {} watcher(s): {}", .0.len(), join_errors(.0))]
    Refresh(Vec<ConfError>),

    #[error("Failed to parse {origin}: {message}")]
    ParseError { origin: String, message: String },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("flatten error: {0}")]
    Flatten(String),
}

impl ConfError {
    /// The innermost error beneath any `Bind` / `RefreshFailed` context.
    pub fn root_cause(&self) -> &ConfError {
        match self {
            ConfError::Bind { source, .. } | ConfError::RefreshFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    pub fn is_not_exist(&self) -> bool {
        matches!(self.root_cause(), ConfError::NotExist { .. })
    }

    pub(crate) fn syntax(text: &str, reason: impl Into<String>) -> Self {
        ConfError::InvalidSyntax {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        ConfError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[ConfError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_formats_path() {
        let err = ConfError::PropertyConflict {
            path: "a.b.c".into(),
        };
        assert_eq!(err.to_string(), "Property conflict at path 'a.b.c'");
    }

    #[test]
    fn bind_wrapping_is_additive() {
        let inner = ConfError::NotExist { key: "db.url".into() };
        let err = ConfError::Bind {
            path: "App.db".into(),
            type_name: "Db".into(),
            source: Box::new(ConfError::Bind {
                path: "App.db.url".into(),
                type_name: "String".into(),
                source: Box::new(inner),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("App.db"));
        assert!(msg.contains("App.db.url"));
        assert!(msg.contains("db.url"));
        assert!(err.is_not_exist());
    }

    #[test]
    fn refresh_concatenates_every_failure() {
        let err = ConfError::Refresh(vec![
            ConfError::Panicked {
                message: "boom".into(),
            },
            ConfError::NotExist { key: "port".into() },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("2 watcher(s)"));
        assert!(msg.contains("boom"));
        assert!(msg.contains("port"));
    }

    #[test]
    fn root_cause_of_plain_error_is_itself() {
        let err = ConfError::UnknownSplitter { name: "x".into() };
        assert!(matches!(err.root_cause(), ConfError::UnknownSplitter { .. }));
        assert!(!err.is_not_exist());
    }
}
