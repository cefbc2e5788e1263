use super::types::{Fragment, RuleSet};
use crate::errors::CompileError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Read and parse one rule fragment.
pub fn load_fragment(path: &Path) -> Result<Fragment, CompileError> {
    let content = fs::read_to_string(path).map_err(|e| CompileError::FragmentParse {
        source: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let rules = RuleSet::from_yaml_str(&content).map_err(|message| CompileError::FragmentParse {
        source: path.to_path_buf(),
        message,
    })?;

    tracing::trace!("Loaded {} rules from {}", rules.len(), path.display());
    Ok(Fragment::new(path, rules))
}

/// Shallow-merge fragments in order.
///
/// When two fragments define the same rule, the later fragment's whole entry
/// replaces the earlier one; attributes are never merged across fragments.
pub fn aggregate<I>(fragments: I) -> RuleSet
where
    I: IntoIterator<Item = Fragment>,
{
    let mut merged = RuleSet::new();
    let mut origins: HashMap<String, PathBuf> = HashMap::new();

    for fragment in fragments {
        for (name, rule) in fragment.rules {
            if let Some(previous) = origins.insert(name.clone(), fragment.source.clone()) {
                tracing::debug!(
                    "Rule '{}' from {} overrides the definition in {}",
                    name,
                    fragment.source.display(),
                    previous.display()
                );
            }
            merged.insert(name, rule);
        }
    }

    merged
}

/// Load every source then merge them. The first unreadable source aborts.
#[tracing::instrument(skip(paths), fields(sources = paths.len()))]
pub fn aggregate_sources(paths: &[PathBuf]) -> Result<RuleSet, CompileError> {
    let fragments = paths
        .iter()
        .map(|path| load_fragment(path))
        .collect::<Result<Vec<_>, _>>()?;

    let rules = aggregate(fragments);
    tracing::info!("Aggregated {} rules from {} files", rules.len(), paths.len());
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;
    use tempfile::TempDir;

    fn fragment(source: &str, yaml: &str) -> Fragment {
        Fragment::new(source, RuleSet::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn test_later_fragment_replaces_whole_entry() {
        let merged = aggregate(vec![
            fragment("a.yaml", "voiture:\n  titre: Voiture\n  unité: km\nbus:\n  titre: Bus\n"),
            fragment("b.yaml", "voiture:\n  titre: Auto\n"),
        ]);

        assert_eq!(merged.len(), 2);
        let voiture = merged.get("voiture").unwrap();
        assert_eq!(voiture.get("titre"), Some(&Value::from("Auto")));
        assert_eq!(voiture.get("unité"), None);
    }

    #[test]
    fn test_disjoint_fragments_merge_like_union() {
        let f1 = vec![fragment("a.yaml", "a: 1\nb: 2\n"), fragment("b.yaml", "c: 3\n")];
        let f2 = vec![fragment("c.yaml", "d: 4\n"), fragment("d.yaml", "e:\n  titre: E\n")];

        let union = aggregate(f1.iter().cloned().chain(f2.iter().cloned()));
        let merged = aggregate(vec![
            Fragment::new("f1", aggregate(f1)),
            Fragment::new("f2", aggregate(f2)),
        ]);
        assert_eq!(union, merged);
    }

    #[test]
    fn test_aggregate_sources_names_failing_file() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.yaml");
        let bad = temp_dir.path().join("bad.yaml");
        fs::write(&good, "a:\n  titre: A\n").unwrap();
        fs::write(&bad, "a:\n  titre: [unclosed\n").unwrap();

        let err = aggregate_sources(&[good.clone(), bad.clone()]).unwrap_err();
        match err {
            CompileError::FragmentParse { source, message } => {
                assert_eq!(source, bad);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }

        let rules = aggregate_sources(&[good]).unwrap();
        assert!(rules.contains("a"));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = load_fragment(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, CompileError::FragmentParse { .. }));
    }
}
