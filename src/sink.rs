use crate::errors::CompileError;
use crate::language::Language;
use crate::rules::RuleSet;
use async_trait::async_trait;
use std::path::PathBuf;

/// Destination for compiled artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persist `artifact` for `language`, returning where it was written.
    async fn write(&self, artifact: &RuleSet, language: Language) -> Result<PathBuf, CompileError>;
}

/// Writes one compact JSON file per language into a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
    file_template: String,
}

impl JsonFileSink {
    /// `file_template` must contain `{lang}`, e.g. `rules-{lang}.json`.
    pub fn new(output_dir: impl Into<PathBuf>, file_template: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_template: file_template.into(),
        }
    }

    pub fn destination(&self, language: Language) -> PathBuf {
        self.output_dir.join(language.render(&self.file_template))
    }
}

#[async_trait]
impl ArtifactSink for JsonFileSink {
    async fn write(&self, artifact: &RuleSet, language: Language) -> Result<PathBuf, CompileError> {
        let destination = self.destination(language);
        let sink_error = |message: String| CompileError::SinkWrite {
            destination: destination.display().to_string(),
            message,
        };

        let json = artifact.to_json().map_err(|e| sink_error(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| sink_error(e.to_string()))?;
        tokio::fs::write(&destination, json)
            .await
            .map_err(|e| sink_error(e.to_string()))?;

        tracing::info!("Wrote {} rules for '{}' to {}", artifact.len(), language, destination.display());
        Ok(destination)
    }
}
