//! Workspace discovery from the root package.json `workspaces` field.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::Manifest;
use crate::runtime::{Runtime, is_path_under, resolve_path};

pub const PACKAGE_JSON: &str = "package.json";

/// A workspace member declared by the root project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
    pub path: PathBuf,
}

/// `workspaces` is either a list of patterns or `{ "packages": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Patterns(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RootPackageJson {
    #[serde(default)]
    workspaces: Option<WorkspacesField>,
}

impl WorkspacesField {
    fn into_patterns(self) -> Vec<String> {
        match self {
            WorkspacesField::Patterns(p) => p,
            WorkspacesField::Object { packages } => packages,
        }
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Nearest ancestor of `start` (inclusive) containing a package.json, or `start` itself.
#[tracing::instrument(skip(runtime))]
pub fn find_project_root<R: Runtime>(runtime: &R, start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| runtime.exists(&dir.join(PACKAGE_JSON)))
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start.to_path_buf())
}

/// All workspace members of the project at `root`, in declaration order.
///
/// Matches of a single glob pattern are sorted by path. A member appearing
/// under several patterns is listed once, at its first position. Patterns
/// starting with `!` remove previously matched members.
#[tracing::instrument(skip(runtime))]
pub fn discover_workspaces<R: Runtime>(runtime: &R, root: &Path) -> Result<Vec<Workspace>> {
    let manifest_path = root.join(PACKAGE_JSON);
    let content = runtime
        .read_to_string(&manifest_path)
        .with_context(|| format!("No package.json found in {}", root.display()))?;
    let root_json: RootPackageJson = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

    let patterns = root_json
        .workspaces
        .map(WorkspacesField::into_patterns)
        .unwrap_or_default();

    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in &patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            let excluded = expand_pattern(runtime, root, negated)?;
            paths.retain(|p| !excluded.contains(p));
            continue;
        }
        for path in expand_pattern(runtime, root, pattern)? {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    let mut members = Vec::with_capacity(paths.len());
    for path in paths {
        let name = member_name(runtime, &path)?;
        debug!("Found workspace {} at {}", name, path.display());
        members.push(Workspace { name, path });
    }
    Ok(members)
}

/// Keep members matching any filter by name, by exact path, or by being under a
/// filter path. Declaration order is preserved regardless of filter order.
pub fn filter_workspaces(members: Vec<Workspace>, filters: &[String], cwd: &Path) -> Vec<Workspace> {
    let filter_paths: Vec<PathBuf> = filters
        .iter()
        .map(|f| resolve_path(cwd, Path::new(f)))
        .collect();

    members
        .into_iter()
        .filter(|ws| {
            filters.iter().any(|f| f == &ws.name)
                || filter_paths.iter().any(|p| is_path_under(&ws.path, p))
        })
        .collect()
}

fn member_name<R: Runtime>(runtime: &R, dir: &Path) -> Result<String> {
    let manifest_path = dir.join(PACKAGE_JSON);
    let content = runtime.read_to_string(&manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

    if !manifest.name.is_empty() {
        return Ok(manifest.name);
    }
    Ok(dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}

fn expand_pattern<R: Runtime>(runtime: &R, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
    let components: Vec<&str> = trimmed
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();

    let mut found = Vec::new();
    walk(runtime, root, &components, &mut found)
        .with_context(|| format!("Failed to expand workspace pattern {:?}", pattern))?;

    let mut seen = HashSet::new();
    found.retain(|p| seen.insert(p.clone()));
    Ok(found)
}

fn is_glob(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

fn sorted_subdirs<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = runtime
        .read_dir(dir)?
        .into_iter()
        .filter(|p| runtime.is_dir(p))
        .filter(|p| p.file_name().is_some_and(|n| n != "node_modules"))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn walk<R: Runtime>(
    runtime: &R,
    dir: &Path,
    components: &[&str],
    found: &mut Vec<PathBuf>,
) -> Result<()> {
    let Some((first, rest)) = components.split_first() else {
        if runtime.is_dir(dir) && runtime.exists(&dir.join(PACKAGE_JSON)) {
            found.push(dir.to_path_buf());
        }
        return Ok(());
    };

    if *first == "**" {
        walk(runtime, dir, rest, found)?;
        for child in sorted_subdirs(runtime, dir)? {
            walk(runtime, &child, components, found)?;
        }
    } else if is_glob(first) {
        let matcher = Pattern::new(first)?;
        for child in sorted_subdirs(runtime, dir)? {
            let matches = child
                .file_name()
                .is_some_and(|n| matcher.matches_with(&n.to_string_lossy(), MATCH_OPTIONS));
            if matches {
                walk(runtime, &child, rest, found)?;
            }
        }
    } else {
        let child = if *first == ".." {
            dir.parent().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf())
        } else {
            dir.join(first)
        };
        if runtime.is_dir(&child) {
            walk(runtime, &child, rest, found)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    fn write_package(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PACKAGE_JSON), json).unwrap();
    }

    fn names(members: &[Workspace]) -> Vec<&str> {
        members.iter().map(|w| w.name.as_str()).collect()
    }

    #[test]
    fn test_discover_literal_workspaces_in_declaration_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_package(
            root,
            r#"{"name": "root", "version": "1.0.0", "workspaces": ["workspace-b", "workspace-a"]}"#,
        );
        write_package(&root.join("workspace-a"), r#"{"name": "workspace-a", "version": "1.0.0"}"#);
        write_package(&root.join("workspace-b"), r#"{"name": "workspace-b", "version": "1.0.0"}"#);

        let members = discover_workspaces(&RealRuntime, root).unwrap();

        assert_eq!(names(&members), vec!["workspace-b", "workspace-a"]);
        assert_eq!(members[0].path, root.join("workspace-b"));
    }

    #[test]
    fn test_discover_glob_workspaces_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_package(root, r#"{"name": "root", "workspaces": ["packages/*"]}"#);
        write_package(&root.join("packages/zed"), r#"{"name": "zed", "version": "1.0.0"}"#);
        write_package(&root.join("packages/alpha"), r#"{"name": "alpha", "version": "1.0.0"}"#);
        // No package.json: not a workspace
        fs::create_dir_all(root.join("packages/docs")).unwrap();

        let members = discover_workspaces(&RealRuntime, root).unwrap();

        assert_eq!(names(&members), vec!["alpha", "zed"]);
    }

    #[test]
    fn test_discover_object_form_and_negation() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_package(
            root,
            r#"{"name": "root", "workspaces": {"packages": ["packages/*", "!packages/internal"]}}"#,
        );
        write_package(&root.join("packages/internal"), r#"{"name": "internal"}"#);
        write_package(&root.join("packages/public"), r#"{"name": "public"}"#);

        let members = discover_workspaces(&RealRuntime, root).unwrap();

        assert_eq!(names(&members), vec!["public"]);
    }

    #[test]
    fn test_discover_globstar_skips_node_modules() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_package(root, r#"{"name": "root", "workspaces": ["libs/**"]}"#);
        write_package(&root.join("libs/a"), r#"{"name": "a"}"#);
        write_package(&root.join("libs/group/b"), r#"{"name": "b"}"#);
        write_package(&root.join("libs/node_modules/dep"), r#"{"name": "dep"}"#);

        let members = discover_workspaces(&RealRuntime, root).unwrap();

        assert_eq!(names(&members), vec!["a", "b"]);
    }

    #[test]
    fn test_member_without_name_uses_directory_name() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_package(root, r#"{"workspaces": ["tools"]}"#);
        write_package(&root.join("tools"), r#"{"version": "1.0.0"}"#);

        let members = discover_workspaces(&RealRuntime, root).unwrap();

        assert_eq!(names(&members), vec!["tools"]);
    }

    #[test]
    fn test_discover_without_workspaces_field() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/work");

        // Read /work/package.json -> no workspaces
        runtime
            .expect_read_to_string()
            .with(eq(root.join(PACKAGE_JSON)))
            .returning(|_| Ok(r#"{"name": "solo", "version": "1.0.0"}"#.to_string()));

        let members = discover_workspaces(&runtime, &root).unwrap();
        assert!(members.is_empty());
    }

    #[test]
    fn test_discover_missing_root_manifest() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/work");

        runtime
            .expect_read_to_string()
            .with(eq(root.join(PACKAGE_JSON)))
            .returning(|_| Err(anyhow::anyhow!("Failed to read")));

        let err = discover_workspaces(&runtime, &root).unwrap_err();
        assert!(err.to_string().contains("No package.json found in /work"));
    }

    fn members() -> Vec<Workspace> {
        vec![
            Workspace {
                name: "workspace-a".into(),
                path: PathBuf::from("/work/workspace-a"),
            },
            Workspace {
                name: "workspace-b".into(),
                path: PathBuf::from("/work/workspace-b"),
            },
            Workspace {
                name: "@scope/c".into(),
                path: PathBuf::from("/work/packages/c"),
            },
        ]
    }

    #[test]
    fn test_filter_by_name() {
        let selected = filter_workspaces(members(), &["workspace-a".into()], Path::new("/work"));
        assert_eq!(names(&selected), vec!["workspace-a"]);
    }

    #[test]
    fn test_filter_keeps_declaration_order() {
        let selected = filter_workspaces(
            members(),
            &["@scope/c".into(), "workspace-b".into(), "workspace-a".into()],
            Path::new("/work"),
        );
        assert_eq!(names(&selected), vec!["workspace-a", "workspace-b", "@scope/c"]);
    }

    #[test]
    fn test_filter_by_relative_path_and_parent_dir() {
        let selected = filter_workspaces(members(), &["./workspace-b".into()], Path::new("/work"));
        assert_eq!(names(&selected), vec!["workspace-b"]);

        let selected = filter_workspaces(members(), &["packages".into()], Path::new("/work"));
        assert_eq!(names(&selected), vec!["@scope/c"]);
    }

    #[test]
    fn test_filter_matches_nothing() {
        let selected = filter_workspaces(members(), &["nope".into()], Path::new("/work"));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_find_project_root_walks_up() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_package(root, r#"{"name": "root"}"#);
        let nested = root.join("src/lib");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&RealRuntime, &nested), root.to_path_buf());
    }

    #[test]
    fn test_find_project_root_falls_back_to_start() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let start = PathBuf::from("/work/src");
        assert_eq!(find_project_root(&runtime, &start), start);
    }
}
