//! Canonical tarball filename derivation.

use super::Manifest;

/// `<name>-<version>.tgz`, with a scoped `@scope/name` flattened to `scope-name`.
///
/// Callers must validate the manifest first; the result depends only on
/// `name` and `version`.
pub fn derive_filename(manifest: &Manifest) -> String {
    let raw = format!("{}-{}.tgz", manifest.name, manifest.version);
    let unscoped = raw.strip_prefix('@').unwrap_or(&raw);
    unscoped.replacen('/', "-", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscoped_name() {
        assert_eq!(
            derive_filename(&Manifest::new("my-cool-pkg", "1.0.0")),
            "my-cool-pkg-1.0.0.tgz"
        );
    }

    #[test]
    fn test_scoped_name() {
        assert_eq!(
            derive_filename(&Manifest::new("@cool/my-pkg", "1.0.0")),
            "cool-my-pkg-1.0.0.tgz"
        );
    }

    #[test]
    fn test_prerelease_version() {
        assert_eq!(
            derive_filename(&Manifest::new("abbrev", "1.0.0-test")),
            "abbrev-1.0.0-test.tgz"
        );
    }

    #[test]
    fn test_unscoped_names_are_unchanged() {
        for (name, version) in [("a", "0.0.1"), ("workspace-b", "2.3.4"), ("x.y", "1.0.0-rc.1")] {
            assert_eq!(
                derive_filename(&Manifest::new(name, version)),
                format!("{}-{}.tgz", name, version)
            );
        }
    }

    #[test]
    fn test_stable_across_calls() {
        let manifest = Manifest::new("@cool/my-pkg", "1.0.0");
        assert_eq!(derive_filename(&manifest), derive_filename(&manifest.clone()));
    }
}
