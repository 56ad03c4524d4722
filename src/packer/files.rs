//! Selection of the files that go into a directory's tarball.

use anyhow::Result;
use glob::{MatchOptions, Pattern};
use log::{debug, trace};
use std::path::{Path, PathBuf};

use crate::archive::{SourceFile, normalize_mode};
use crate::package::Manifest;
use crate::runtime::{Runtime, to_slash_path};

/// Names never packed, at any depth.
const ALWAYS_IGNORED: &[&str] = &[
    ".git",
    ".gitignore",
    ".npmignore",
    ".svn",
    ".hg",
    "CVS",
    "node_modules",
    ".npmrc",
    "package-lock.json",
    "yarn.lock",
    ".DS_Store",
    "npm-debug.log",
];

/// Top-level files packed even when `files` or an ignore file would drop them.
const ALWAYS_INCLUDED_PREFIXES: &[&str] = &["readme", "license", "licence"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One line of `files`, `.npmignore` or `.gitignore`.
#[derive(Debug)]
struct Rule {
    pattern: Pattern,
    negated: bool,
    /// Matched against paths from the package root only
    anchored: bool,
}

impl Rule {
    fn parse(line: &str, root_relative: bool) -> Option<Rule> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let body = body.trim_start_matches("./").trim_end_matches('/');
        let anchored = root_relative || body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }
        match Pattern::new(body) {
            Ok(pattern) => Some(Rule {
                pattern,
                negated,
                anchored,
            }),
            Err(e) => {
                debug!("Ignoring invalid pattern {:?}: {}", line, e);
                None
            }
        }
    }

    /// Matches the path itself or any of its parent directories.
    fn matches(&self, rel: &str) -> bool {
        let parts: Vec<&str> = rel.split('/').collect();
        (1..=parts.len()).any(|n| {
            let prefix = parts[..n].join("/");
            if self.pattern.matches_with(&prefix, MATCH_OPTIONS) {
                return true;
            }
            !self.anchored && self.pattern.matches_with(parts[n - 1], MATCH_OPTIONS)
        })
    }
}

/// Ordered rules where the last matching rule decides.
#[derive(Debug, Default)]
struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// `files` entries are always relative to the package root.
    fn allow_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            rules: lines.into_iter().filter_map(|l| Rule::parse(l, true)).collect(),
        }
    }

    fn ignore_file(content: &str) -> Self {
        Self {
            rules: content.lines().filter_map(|l| Rule::parse(l, false)).collect(),
        }
    }

    /// `Some(true)` if the last matching rule is positive, `Some(false)` if negated.
    fn decide(&self, rel: &str) -> Option<bool> {
        self.rules
            .iter()
            .rev()
            .find(|r| r.matches(rel))
            .map(|r| !r.negated)
    }
}

/// How a directory's files are chosen.
#[derive(Debug)]
enum Selection {
    /// `files` allow-list from package.json
    AllowList(RuleSet),
    /// Everything except what the ignore file lists
    DenyList(RuleSet),
}

impl Selection {
    fn includes(&self, rel: &str) -> bool {
        if is_always_included(rel) {
            return true;
        }
        match self {
            Selection::AllowList(rules) => rules.decide(rel).unwrap_or(false),
            Selection::DenyList(rules) => !rules.decide(rel).unwrap_or(false),
        }
    }
}

fn is_always_ignored(name: &str) -> bool {
    ALWAYS_IGNORED.contains(&name)
        || name.ends_with(".orig")
        || (name.starts_with('.') && name.ends_with(".swp"))
}

fn is_always_included(rel: &str) -> bool {
    if rel == "package.json" {
        return true;
    }
    if rel.contains('/') {
        return false;
    }
    let lower = rel.to_ascii_lowercase();
    ALWAYS_INCLUDED_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn load_selection<R: Runtime>(runtime: &R, root: &Path, manifest: &Manifest) -> Result<Selection> {
    if let Some(files) = &manifest.files {
        return Ok(Selection::AllowList(RuleSet::allow_list(
            files.iter().map(String::as_str),
        )));
    }

    for ignore_file in [".npmignore", ".gitignore"] {
        let path = root.join(ignore_file);
        if runtime.exists(&path) {
            debug!("Using ignore rules from {}", path.display());
            let content = runtime.read_to_string(&path)?;
            return Ok(Selection::DenyList(RuleSet::ignore_file(&content)));
        }
    }
    Ok(Selection::DenyList(RuleSet::default()))
}

/// Collect the files of the package at `root`, sorted by path.
#[tracing::instrument(skip(runtime, manifest))]
pub fn collect_files<R: Runtime>(
    runtime: &R,
    root: &Path,
    manifest: &Manifest,
) -> Result<Vec<SourceFile>> {
    let selection = load_selection(runtime, root, manifest)?;

    let mut paths = Vec::new();
    walk(runtime, root, root, &selection, &mut paths)?;

    let mut files = Vec::with_capacity(paths.len());
    for (rel, path) in paths {
        files.push(SourceFile {
            contents: runtime.read(&path)?,
            mode: normalize_mode(runtime.file_mode(&path)?),
            path: rel,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn walk<R: Runtime>(
    runtime: &R,
    root: &Path,
    dir: &Path,
    selection: &Selection,
    out: &mut Vec<(String, PathBuf)>,
) -> Result<()> {
    for path in runtime.read_dir(dir)? {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if is_always_ignored(&name) || runtime.is_symlink(&path) {
            trace!("Skipping {}", path.display());
            continue;
        }

        let rel = to_slash_path(path.strip_prefix(root).unwrap_or(&path));
        if runtime.is_dir(&path) {
            walk(runtime, root, &path, selection, out)?;
        } else if selection.includes(&rel) {
            out.push((rel, path));
        }
    }
    Ok(())
}
