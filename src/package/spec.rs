//! Package spec parsing for the pack command.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::PackError;
use crate::runtime::resolve_path;

/// A registry package reference.
/// Format: "name", "name@selector", "@scope/name" or "@scope/name@selector".
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RegistrySpec {
    pub name: String,
    /// Exact version or dist-tag. `None` means the `latest` tag.
    pub selector: Option<String>,
}

impl RegistrySpec {
    pub fn is_scoped(&self) -> bool {
        self.name.starts_with('@')
    }
}

impl fmt::Display for RegistrySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(s) => write!(f, "{}@{}", self.name, s),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One thing to pack.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PackSpec {
    /// A directory containing a package.json
    Directory(PathBuf),
    /// A package published to the registry
    Registry(RegistrySpec),
}

impl PackSpec {
    /// Make directory specs absolute. `~/` expands to `home` when one is known.
    pub fn absolutize(self, cwd: &Path, home: Option<&Path>) -> Self {
        match self {
            PackSpec::Directory(path) => {
                let expanded = match (path.strip_prefix("~"), home) {
                    (Ok(rest), Some(home)) => home.join(rest),
                    _ => path,
                };
                PackSpec::Directory(resolve_path(cwd, &expanded))
            }
            registry => registry,
        }
    }
}

impl fmt::Display for PackSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackSpec::Directory(path) => write!(f, "{}", path.display()),
            PackSpec::Registry(spec) => write!(f, "{}", spec),
        }
    }
}

fn looks_like_path(s: &str) -> bool {
    if s.starts_with('.') || s.starts_with('/') || s.starts_with('~') || s.starts_with('\\') {
        return true;
    }
    // Windows drive prefix, e.g. C:\pkg or C:/pkg
    let bytes = s.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn invalid(spec: &str, reason: &str) -> PackError {
    PackError::InvalidSpec(spec.to_string(), reason.to_string())
}

fn validate_name(spec: &str, name: &str) -> Result<(), PackError> {
    if name.is_empty() {
        return Err(invalid(spec, "name cannot be empty"));
    }
    if name.len() > 214 {
        return Err(invalid(spec, "name cannot be longer than 214 characters"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid(spec, "name cannot contain spaces"));
    }

    let bare = match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, bare)) if !scope.is_empty() && !bare.is_empty() => bare,
            _ => return Err(invalid(spec, "scoped names must look like @scope/name")),
        },
        None => name,
    };

    if bare.contains('/') {
        return Err(invalid(spec, "only directories and registry packages can be packed"));
    }
    if bare.starts_with('.') || bare.starts_with('_') {
        return Err(invalid(spec, "name cannot start with a period or underscore"));
    }
    Ok(())
}

impl FromStr for PackSpec {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(invalid(s, "spec cannot be empty"));
        }
        if let Some(path) = s.strip_prefix("file:") {
            return Ok(PackSpec::Directory(PathBuf::from(path)));
        }
        if looks_like_path(s) {
            return Ok(PackSpec::Directory(PathBuf::from(s)));
        }
        if s.contains("://") || s.starts_with("git+") {
            return Err(invalid(s, "only directories and registry packages can be packed"));
        }

        // The version separator is the last `@` that is not the scope marker
        let (name, selector) = match s.rfind('@').filter(|&i| i > 0) {
            Some(at_pos) => {
                let (name, selector) = s.split_at(at_pos);
                let selector = &selector[1..];
                if selector.is_empty() {
                    return Err(invalid(s, "version after @ cannot be empty"));
                }
                (name, Some(selector.to_string()))
            }
            None => (s, None),
        };

        validate_name(s, name)?;
        Ok(PackSpec::Registry(RegistrySpec {
            name: name.to_string(),
            selector,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(name: &str, selector: Option<&str>) -> PackSpec {
        PackSpec::Registry(RegistrySpec {
            name: name.to_string(),
            selector: selector.map(str::to_string),
        })
    }

    #[test]
    fn test_parse_bare_name() {
        assert_eq!("abbrev".parse::<PackSpec>().unwrap(), registry("abbrev", None));
    }

    #[test]
    fn test_parse_name_with_version() {
        assert_eq!(
            "abbrev@1.1.1".parse::<PackSpec>().unwrap(),
            registry("abbrev", Some("1.1.1"))
        );
    }

    #[test]
    fn test_parse_scoped_name() {
        let spec = "@cool/my-pkg".parse::<PackSpec>().unwrap();
        assert_eq!(spec, registry("@cool/my-pkg", None));
        match spec {
            PackSpec::Registry(r) => assert!(r.is_scoped()),
            _ => panic!("Expected registry spec"),
        }
    }

    #[test]
    fn test_parse_scoped_name_with_tag() {
        assert_eq!(
            "@cool/my-pkg@next".parse::<PackSpec>().unwrap(),
            registry("@cool/my-pkg", Some("next"))
        );
    }

    #[test]
    fn test_parse_paths() {
        for s in [".", "./pkg", "../pkg", "/abs/pkg", "~/pkg", "C:\\pkg"] {
            assert_eq!(
                s.parse::<PackSpec>().unwrap(),
                PackSpec::Directory(PathBuf::from(s)),
                "{} should parse as a directory",
                s
            );
        }
    }

    #[test]
    fn test_parse_file_prefix() {
        assert_eq!(
            "file:../pkg".parse::<PackSpec>().unwrap(),
            PackSpec::Directory(PathBuf::from("../pkg"))
        );
    }

    #[test]
    fn test_parse_empty_version_fails() {
        let err = "abbrev@".parse::<PackSpec>().unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_parse_rejects_urls_and_shorthands() {
        assert!("https://example.com/pkg.tgz".parse::<PackSpec>().is_err());
        assert!("git+ssh://git@github.com/a/b.git".parse::<PackSpec>().is_err());
        assert!("owner/repo".parse::<PackSpec>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        assert!("@scope".parse::<PackSpec>().is_err());
        assert!("@/name".parse::<PackSpec>().is_err());
        assert!("_private".parse::<PackSpec>().is_err());
        assert!("has space".parse::<PackSpec>().is_err());
    }

    #[test]
    fn test_absolutize_relative_directory() {
        let spec = PackSpec::Directory(PathBuf::from("./pkg"));
        assert_eq!(
            spec.absolutize(Path::new("/work"), None),
            PackSpec::Directory(PathBuf::from("/work/pkg"))
        );
    }

    #[test]
    fn test_absolutize_home_directory() {
        let spec = PackSpec::Directory(PathBuf::from("~/pkg"));
        assert_eq!(
            spec.absolutize(Path::new("/work"), Some(Path::new("/home/user"))),
            PackSpec::Directory(PathBuf::from("/home/user/pkg"))
        );
    }

    #[test]
    fn test_absolutize_leaves_registry_specs() {
        let spec = registry("abbrev", None);
        assert_eq!(spec.clone().absolutize(Path::new("/work"), None), spec);
    }

    #[test]
    fn test_display() {
        assert_eq!(registry("abbrev", Some("1.0.0")).to_string(), "abbrev@1.0.0");
        assert_eq!(registry("@cool/my-pkg", None).to_string(), "@cool/my-pkg");
    }
}
