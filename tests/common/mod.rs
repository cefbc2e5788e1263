// Common test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use rules_compiler::{ArtifactSink, CompileError, Language, RuleSet};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small project: two rule files plus English and Spanish translations.
pub fn setup_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(
        root,
        "data/bilan.yaml",
        r#"
bilan:
  titre: Mon empreinte
  formule: transport + alimentation
"#,
    );
    write_file(
        root,
        "data/transport/voiture.yaml",
        r#"
transport:
  titre: Transport
  question: Combien de kilomètres parcourez-vous ?
  suggestions:
    peu: 1000
    moyen: 10000
    beaucoup: 30000
alimentation:
  titre: Alimentation
  mosaique:
    type: nombre
    clé: nombre
    suggestions:
      végétarien:
        viande: 0
      omnivore:
        viande: 7
"#,
    );
    write_file(
        root,
        "data/translated-rules-en-us.yaml",
        r#"
transport:
  titre: Transport
  titre.ref: Transport
  question: How many kilometers do you travel?
  suggestions: [few, average, lots]
alimentation:
  titre: Food
  mosaique:
    suggestions: [vegetarian, omnivore]
"#,
    );
    write_file(
        root,
        "data/translated-rules-es.yaml",
        r#"
transporte:
  titre: Transporte
"#,
    );

    temp_dir
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// In-memory sink recording every artifact, failing for chosen languages.
#[derive(Default)]
pub struct RecordingSink {
    pub written: Mutex<Vec<(Language, RuleSet)>>,
    pub failing: HashSet<Language>,
}

impl RecordingSink {
    pub fn failing_for(languages: &[Language]) -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            failing: languages.iter().copied().collect(),
        }
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<_> = self.written.lock().unwrap().iter().map(|(l, _)| *l).collect();
        languages.sort();
        languages
    }

    pub fn artifact(&self, language: Language) -> Option<RuleSet> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .find(|(l, _)| *l == language)
            .map(|(_, rules)| rules.clone())
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn write(&self, artifact: &RuleSet, language: Language) -> Result<PathBuf, CompileError> {
        let destination = format!("memory://{language}");
        if self.failing.contains(&language) {
            return Err(CompileError::SinkWrite {
                destination,
                message: "disk full".to_string(),
            });
        }
        self.written.lock().unwrap().push((language, artifact.clone()));
        Ok(PathBuf::from(destination))
    }
}
