use crate::errors::CompileError;
use crate::language::{LANG_PLACEHOLDER, Language};
use crate::overlay::OverlayOptions;
use crate::rules::discovery::{DEFAULT_EXCLUDE_PATTERN, DEFAULT_FRAGMENT_PATTERN};
use std::path::{Path, PathBuf};

/// File name of each compiled artifact.
pub const DEFAULT_ARTIFACT_TEMPLATE: &str = "co2-{lang}.json";
/// Rule the whole footprint is computed from.
pub const DEFAULT_ROOT_RULE: &str = "bilan";

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Project root; patterns and relative paths are resolved against it
    pub root: PathBuf,
    /// Glob patterns selecting rule fragments
    pub fragment_patterns: Vec<String>,
    /// Glob patterns removed from the fragment selection
    pub exclude_patterns: Vec<String>,
    /// Path template of the translation file for each language
    pub translation_template: String,
    /// Directory receiving the compiled artifacts
    pub output_dir: PathBuf,
    /// File name template of each artifact
    pub artifact_template: String,
    /// Language the rules are written in; its artifact gets no overlay
    pub source_language: Language,
    /// Languages to translate to
    pub target_languages: Vec<Language>,
    /// Rule that must exist for the rule set to be valid; empty disables the check
    pub root_rule: Option<String>,
    /// External evaluator command line, replacing the structural checks
    pub evaluator_command: Option<Vec<String>>,
    /// Strictness of translation overlays
    pub overlay: OverlayOptions,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            fragment_patterns: vec![DEFAULT_FRAGMENT_PATTERN.to_string()],
            exclude_patterns: vec![DEFAULT_EXCLUDE_PATTERN.to_string()],
            translation_template: "data/translated-rules-{lang}.yaml".to_string(),
            output_dir: PathBuf::from("public"),
            artifact_template: DEFAULT_ARTIFACT_TEMPLATE.to_string(),
            source_language: Language::DEFAULT_SOURCE,
            target_languages: Language::targets_for(Language::DEFAULT_SOURCE),
            root_rule: Some(DEFAULT_ROOT_RULE.to_string()),
            evaluator_command: None,
            overlay: OverlayOptions::default(),
        }
    }
}

impl CompilerConfig {
    /// Default configuration rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn translation_path(&self, language: Language) -> PathBuf {
        resolve(&self.root, Path::new(&language.render(&self.translation_template)))
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        resolve(&self.root, &self.output_dir)
    }

    /// Target languages without the source language or repeats, in request order.
    pub fn effective_targets(&self) -> Vec<Language> {
        let mut targets = Vec::with_capacity(self.target_languages.len());
        for &language in &self.target_languages {
            if language == self.source_language {
                tracing::warn!("SKIP: '{language}' is the source language");
            } else if !targets.contains(&language) {
                targets.push(language);
            }
        }
        targets
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.fragment_patterns.is_empty() {
            return Err(CompileError::Config(
                "At least one rule fragment pattern is required".to_string(),
            ));
        }
        for (name, template) in [
            ("translation", &self.translation_template),
            ("artifact", &self.artifact_template),
        ] {
            if !template.contains(LANG_PLACEHOLDER) {
                return Err(CompileError::Config(format!(
                    "The {name} path template '{template}' must contain {LANG_PLACEHOLDER}"
                )));
            }
        }
        if let Some(command) = &self.evaluator_command {
            if command.is_empty() {
                return Err(CompileError::Config("Evaluator command is empty".to_string()));
            }
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
