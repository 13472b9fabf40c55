use fnpack_core::TagFormat;

use crate::vcs::VersionControl;

/// Version-control values that feed [`fnpack_core::image_name`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagValues {
    pub branch: String,
    pub version: String,
}

/// Queries version control for the values `format` needs.
///
/// Only the queries the format uses are run. For [`TagFormat::BranchAndSha`]
/// the branch is checked before the SHA is queried.
pub fn resolve_tag_values<V: VersionControl>(
    format: TagFormat,
    vcs: &V,
) -> Result<TagValues, TagError> {
    let mut values = TagValues::default();

    match format {
        TagFormat::Latest => {}
        TagFormat::Sha => {
            values.version = required(vcs.sha(), TagError::NoSha)?;
        }
        TagFormat::BranchAndSha => {
            values.branch = required(vcs.branch(), TagError::NoBranch)?;
            values.version = required(vcs.sha(), TagError::NoSha)?;
        }
        TagFormat::Describe => {
            values.version = required(vcs.describe(), TagError::NoDescribe)?;
        }
    }

    tracing::debug!(%format, branch = %values.branch, version = %values.version, "resolved tag values");
    Ok(values)
}

fn required(value: String, err: TagError) -> Result<String, TagError> {
    if value.is_empty() { Err(err) } else { Ok(value) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("cannot tag image with Git SHA as this is not a Git repository")]
    NoSha,
    #[error("cannot tag image with Git branch and SHA as this is not a Git repository")]
    NoBranch,
    #[error("cannot tag image with Git tag and SHA as this is not a Git repository")]
    NoDescribe,
}
