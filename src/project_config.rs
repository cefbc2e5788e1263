//! # Project Configuration (rules-compiler.yml)
//!
//! Optional per-project settings, discovered by walking up from the working
//! directory. Command line arguments take precedence over the file.

use crate::config::CompilerConfig;
use crate::errors::CompileError;
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names searched for, in order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["rules-compiler.yml", "rules-compiler.yaml"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Glob patterns selecting rule fragments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Glob patterns excluded from the fragments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Translation file template containing `{lang}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<String>,

    /// Directory for compiled artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Artifact file name template containing `{lang}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<Language>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_languages: Vec<Language>,

    /// Rule that must be defined, e.g. `bilan`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_rule: Option<String>,

    /// External evaluator command line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluator: Vec<String>,
}

impl ProjectConfig {
    pub fn from_file(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, CompileError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(CompileError::from)
    }

    /// Find a configuration file by traversing up the directory tree
    pub fn discover(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, CompileError> {
        let mut current = start_dir;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.is_file() {
                    let config = Self::from_file(&config_path)?;
                    return Ok(Some((config_path, config)));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Resolve relative paths against the directory holding the file
    pub fn resolve_paths(&mut self, config_dir: &Path) {
        if let Some(output_dir) = &self.output_dir {
            if output_dir.is_relative() {
                self.output_dir = Some(config_dir.join(output_dir));
            }
        }
    }

    /// Layer the settings present in this file over `config`.
    pub fn apply_to(self, mut config: CompilerConfig) -> CompilerConfig {
        if !self.sources.is_empty() {
            config.fragment_patterns = self.sources;
        }
        if !self.exclude.is_empty() {
            config.exclude_patterns = self.exclude;
        }
        if let Some(translations) = self.translations {
            config.translation_template = translations;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(artifact_name) = self.artifact_name {
            config.artifact_template = artifact_name;
        }
        if let Some(source) = self.source_language {
            config.source_language = source;
            config.target_languages = Language::targets_for(source);
        }
        if !self.target_languages.is_empty() {
            config.target_languages = self.target_languages;
        }
        if self.root_rule.is_some() {
            config.root_rule = self.root_rule;
        }
        if !self.evaluator.is_empty() {
            config.evaluator_command = Some(self.evaluator);
        }
        config
    }
}
