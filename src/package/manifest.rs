//! Package manifest as read from package.json or a registry packument.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PackError;

/// Distribution info for a published version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dist {
    pub tarball: String,
}

/// The subset of package metadata needed to pack a package.
/// Missing or `null` `name`/`version` deserialize as empty strings so that
/// such manifests are representable and rejected by [`Manifest::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub version: String,
    /// Allow-list of files to include in the tarball
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<Dist>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// `<name>@<version>`
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.version.is_empty()
    }

    pub fn validate(&self) -> Result<(), PackError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(PackError::InvalidPackument)
        }
    }
}
