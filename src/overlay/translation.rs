use crate::errors::{CompileError, OverlayError};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Sparse translated attributes for a subset of rules, in file order.
///
/// Entries are kept raw; they are validated when applied so that a malformed
/// entry is reported against the language being compiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    entries: Mapping,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `null` document (empty file) is an empty translation.
    pub fn from_value(value: Value) -> Result<Self, OverlayError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(entries) => Ok(Self { entries }),
            _ => Err(OverlayError::InvalidRoot),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        Self::from_value(value).map_err(|e| e.to_string())
    }

    /// Read a translation file. Any failure is reported against that file only.
    pub async fn load(path: &Path) -> Result<Self, CompileError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CompileError::TranslationLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let translation = Self::from_yaml_str(&content).map_err(|message| CompileError::TranslationLoad {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!("Loaded translations for {} rules from {}", translation.len(), path.display());
        Ok(translation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw `(rule name, attributes)` entries.
    pub fn entries(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_is_empty_translation() {
        assert!(Translation::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_root_must_be_mapping() {
        assert_eq!(
            Translation::from_value(Value::from("oops")),
            Err(OverlayError::InvalidRoot)
        );
    }

    #[tokio::test]
    async fn test_load_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("translated-rules-it.yaml");
        let err = Translation::load(&missing).await.unwrap_err();
        match err {
            CompileError::TranslationLoad { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }

        let file = temp_dir.path().join("translated-rules-es.yaml");
        std::fs::write(&file, "transport:\n  titre: Transporte\n  titre.ref: Transport\n").unwrap();
        let translation = Translation::load(&file).await.unwrap();
        assert_eq!(translation.len(), 1);
    }
}
