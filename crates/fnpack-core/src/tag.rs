use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the output image tag is derived from version-control state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagFormat {
    /// Use the image name as configured (`:latest` when untagged).
    #[default]
    Latest,
    /// Suffix the tag with the short commit SHA.
    Sha,
    /// Suffix the tag with the current branch and the short commit SHA.
    #[serde(rename = "branch")]
    BranchAndSha,
    /// Suffix the tag with `git describe` output.
    Describe,
}

impl TagFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Sha => "sha",
            Self::BranchAndSha => "branch",
            Self::Describe => "describe",
        }
    }
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "" => Ok(Self::Latest),
            "sha" => Ok(Self::Sha),
            "branch" => Ok(Self::BranchAndSha),
            "describe" => Ok(Self::Describe),
            _ => Err(crate::Error::UnknownTagFormat(s.to_owned())),
        }
    }
}

/// Builds the final image reference from the configured image and the
/// resolved version-control values.
///
/// An image without an explicit tag in its last path segment gets
/// `:latest` first, so `registry:5000/acme/fn` is treated as untagged.
pub fn image_name(format: TagFormat, image: &str, version: &str, branch: &str) -> String {
    let last_segment = match image.rsplit_once('/') {
        Some((_, last)) => last,
        None => image,
    };
    let mut name = image.to_owned();
    if !last_segment.contains(':') {
        name.push_str(":latest");
    }

    match format {
        TagFormat::Latest => name,
        TagFormat::Sha | TagFormat::Describe => format!("{name}-{version}"),
        TagFormat::BranchAndSha => format!("{name}-{branch}-{version}"),
    }
}
