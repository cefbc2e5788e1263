use crate::errors::CompileError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default pattern for rule fragments, relative to the project root.
pub const DEFAULT_FRAGMENT_PATTERN: &str = "data/**/*.yaml";
/// Translation files live next to the fragments and must not be aggregated.
pub const DEFAULT_EXCLUDE_PATTERN: &str = "data/translated-*.yaml";

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, CompileError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| CompileError::Config(format!("Invalid glob pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Leading path components of a pattern that contain no glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    pattern
        .split('/')
        .take_while(|component| !component.contains(['*', '?', '[', '{']))
        .filter(|component| !component.is_empty() && *component != ".")
        .collect()
}

/// Directories worth entering: those leading to, or below, a literal prefix.
struct SearchScope {
    prefixes: Vec<PathBuf>,
}

impl SearchScope {
    fn new(include: &[String]) -> Self {
        Self {
            prefixes: include.iter().map(|pattern| literal_prefix(pattern)).collect(),
        }
    }

    fn admits(&self, relative: &Path) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| prefix.starts_with(relative) || relative.starts_with(prefix))
    }
}

/// Find rule fragment files below `root`.
///
/// Patterns match paths relative to `root` using `/` separators. Results are
/// sorted so that the merge order, and therefore last-wins overrides, does
/// not depend on directory iteration order.
///
/// Only directories that can hold a match are walked. Symlink loops are
/// skipped with a warning; other traversal errors inside the searched
/// directories are returned.
pub fn discover_fragments(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, CompileError> {
    let include_set = build_glob_set(include)?;
    let exclude_set = build_glob_set(exclude)?;
    let scope = SearchScope::new(include);

    let relative_to_root = |path: &Path| path.strip_prefix(root).map(Path::to_path_buf).ok();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || relative_to_root(entry.path()).is_some_and(|relative| scope.admits(&relative))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.loop_ancestor().is_some() => {
                tracing::warn!("Skipping symlink loop: {err}");
                continue;
            }
            Err(err) => {
                let in_scope = err
                    .path()
                    .and_then(relative_to_root)
                    .is_none_or(|relative| scope.admits(&relative));
                if in_scope {
                    return Err(err.into());
                }
                tracing::warn!("Skipping unreadable path: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(relative) = relative_to_root(path) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");

        if include_set.is_match(&relative) && !exclude_set.is_match(&relative) {
            files.push(path.to_path_buf());
        } else {
            tracing::trace!("Skipping {relative}");
        }
    }

    files.sort();
    tracing::debug!("Discovered {} rule fragments under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "a: 1\n").unwrap();
    }

    #[test]
    fn test_discover_skips_translations() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "data/transport.yaml");
        write(root, "data/alimentation/plats.yaml");
        write(root, "data/translated-rules-en-us.yaml");
        write(root, "data/notes.md");
        write(root, "other/ignored.yaml");

        let files = discover_fragments(
            root,
            &[DEFAULT_FRAGMENT_PATTERN.to_string()],
            &[DEFAULT_EXCLUDE_PATTERN.to_string()],
        )
        .unwrap();

        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            relative,
            vec!["data/alimentation/plats.yaml", "data/transport.yaml"]
        );
    }

    #[test]
    fn test_single_file_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "data/transport.yaml");
        write(root, "data/logement.yaml");

        let files = discover_fragments(root, &["data/logement.yaml".to_string()], &[]).unwrap();
        assert_eq!(files, vec![root.join("data/logement.yaml")]);
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(literal_prefix("data/**/*.yaml"), PathBuf::from("data"));
        assert_eq!(literal_prefix("./data/transport/*.yaml"), PathBuf::from("data/transport"));
        assert_eq!(literal_prefix("data/logement.yaml"), PathBuf::from("data/logement.yaml"));
        assert_eq!(literal_prefix("**/*.yaml"), PathBuf::new());
    }

    #[cfg(unix)]
    #[test]
    fn test_directories_outside_patterns_are_not_walked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "data/a.yaml");
        write(root, "node_modules/pkg/index.yaml");
        std::os::unix::fs::symlink(root.join("node_modules"), root.join("node_modules/pkg/loop"))
            .unwrap();

        let files = discover_fragments(root, &[DEFAULT_FRAGMENT_PATTERN.to_string()], &[]).unwrap();
        assert_eq!(files, vec![root.join("data/a.yaml")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_inside_data_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "data/transport/voiture.yaml");
        std::os::unix::fs::symlink(root.join("data"), root.join("data/transport/loop")).unwrap();

        let files = discover_fragments(root, &["**/*.yaml".to_string()], &[]).unwrap();
        assert_eq!(files, vec![root.join("data/transport/voiture.yaml")]);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_fragments(temp_dir.path(), &["data/[".to_string()], &[]).unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }
}
