//! # Error Types
//!
//! Error handling for the rules compiler.
//! Fragment parsing and evaluation errors stop the pipeline; the others are
//! reported per language or per artifact.

use crate::language::Language;
use std::fmt;
use std::path::PathBuf;

/// Error types that can occur while compiling a rule set.
#[derive(Debug)]
pub enum CompileError {
    /// A rule fragment could not be read or is not a YAML mapping
    FragmentParse { source: PathBuf, message: String },
    /// The aggregated rule set failed the evaluation gate
    Evaluation(String),
    /// A translation overlay is malformed for one language
    OverlayStructure {
        language: Language,
        error: OverlayError,
    },
    /// A translation file could not be read or parsed
    TranslationLoad { path: PathBuf, message: String },
    /// Persisting an artifact failed
    SinkWrite { destination: String, message: String },
    /// Invalid configuration value
    Config(String),
    /// I/O error reading/writing files
    Io(std::io::Error),
    /// Error parsing YAML documents
    SerdeYaml(serde_yaml::Error),
    /// Error serializing JSON data
    SerdeJson(serde_json::Error),
    /// Glob pattern compilation error
    Glob(globset::Error),
    /// Error walking directory trees during fragment discovery
    WalkDir(walkdir::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::FragmentParse { source, message } => {
                write!(f, "Failed to read rules from {}: {message}", source.display())
            }
            CompileError::Evaluation(msg) => write!(f, "Rule evaluation failed:\n{msg}"),
            CompileError::OverlayStructure { language, error } => {
                write!(f, "Invalid translation for '{language}': {error}")
            }
            CompileError::TranslationLoad { path, message } => {
                write!(f, "Failed to load translations from {}: {message}", path.display())
            }
            CompileError::SinkWrite {
                destination,
                message,
            } => write!(f, "Failed to write rules to {destination}: {message}"),
            CompileError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CompileError::Io(err) => write!(f, "IO error: {err}"),
            CompileError::SerdeYaml(err) => write!(f, "YAML parsing error: {err}"),
            CompileError::SerdeJson(err) => write!(f, "JSON serialization error: {err}"),
            CompileError::Glob(err) => write!(f, "Glob error: {err}"),
            CompileError::WalkDir(err) => write!(f, "Directory traversal error: {err}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::Io(err)
    }
}

impl From<serde_yaml::Error> for CompileError {
    fn from(err: serde_yaml::Error) -> Self {
        CompileError::SerdeYaml(err)
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::SerdeJson(err)
    }
}

impl From<globset::Error> for CompileError {
    fn from(err: globset::Error) -> Self {
        CompileError::Glob(err)
    }
}

impl From<walkdir::Error> for CompileError {
    fn from(err: walkdir::Error) -> Self {
        CompileError::WalkDir(err)
    }
}

/// Structural problems found while applying a translation overlay.
///
/// `path` fields are dotted attribute paths inside the rule, e.g.
/// `mosaique.suggestions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The translation document is not a mapping of rule names
    InvalidRoot,
    /// A rule's translation entry is not an attribute mapping
    InvalidEntry { rule: String },
    /// The translation names a rule that the base rule set does not define
    UnknownRule { rule: String },
    /// The base rule is a scalar and cannot receive attributes
    NotAttributeMapping { rule: String },
    /// The base rule has no suggestions mapping to rebind
    MissingSuggestions { rule: String, path: String },
    /// Translated suggestions must be a list of keys
    ExpectedKeyList { rule: String, path: String },
    /// A translated suggestion key is not a scalar
    InvalidKey {
        rule: String,
        path: String,
        index: usize,
    },
    /// The same translated key appears twice in one list
    DuplicateKey {
        rule: String,
        path: String,
        key: String,
    },
    /// Translated keys and base suggestions differ in number
    CountMismatch {
        rule: String,
        path: String,
        expected: usize,
        found: usize,
    },
    /// A translated mosaique must be a mapping carrying `suggestions`
    MalformedMosaique { rule: String },
}

impl OverlayError {
    /// Rule the error refers to, if any.
    pub fn rule(&self) -> Option<&str> {
        match self {
            OverlayError::InvalidRoot => None,
            OverlayError::InvalidEntry { rule }
            | OverlayError::UnknownRule { rule }
            | OverlayError::NotAttributeMapping { rule }
            | OverlayError::MissingSuggestions { rule, .. }
            | OverlayError::ExpectedKeyList { rule, .. }
            | OverlayError::InvalidKey { rule, .. }
            | OverlayError::DuplicateKey { rule, .. }
            | OverlayError::CountMismatch { rule, .. }
            | OverlayError::MalformedMosaique { rule } => Some(rule),
        }
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::InvalidRoot => {
                write!(f, "translation document must be a mapping of rule names")
            }
            OverlayError::InvalidEntry { rule } => {
                write!(f, "translation of rule '{rule}' must be an attribute mapping")
            }
            OverlayError::UnknownRule { rule } => {
                write!(f, "rule '{rule}' is translated but not defined in the base rules")
            }
            OverlayError::NotAttributeMapping { rule } => {
                write!(f, "base rule '{rule}' is a scalar and cannot hold translated attributes")
            }
            OverlayError::MissingSuggestions { rule, path } => {
                write!(f, "rule '{rule}' has no '{path}' mapping to translate")
            }
            OverlayError::ExpectedKeyList { rule, path } => {
                write!(f, "translated '{path}' of rule '{rule}' must be a list of keys")
            }
            OverlayError::InvalidKey { rule, path, index } => {
                write!(f, "translated '{path}' of rule '{rule}' has a non-scalar key at position {index}")
            }
            OverlayError::DuplicateKey { rule, path, key } => {
                write!(f, "translated '{path}' of rule '{rule}' repeats the key '{key}'")
            }
            OverlayError::CountMismatch {
                rule,
                path,
                expected,
                found,
            } => write!(
                f,
                "translated '{path}' of rule '{rule}' has {found} keys, expected {expected}"
            ),
            OverlayError::MalformedMosaique { rule } => {
                write!(f, "translated 'mosaique' of rule '{rule}' must be a mapping with a 'suggestions' list")
            }
        }
    }
}

impl std::error::Error for OverlayError {}
