use std::collections::HashSet;

use fnpack_core::BuildOption;

/// Removes repeated entries, keeping the first occurrence of each.
pub fn dedupe<S: AsRef<str>>(packages: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    packages
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .map(str::to_owned)
        .collect()
}

/// Expands each requested build option into the packages the template
/// declares for it.
///
/// Returns `(packages, true)` with a deduplicated list when every name was
/// found. Stops at the first unknown name and returns `false` together with
/// whatever was accumulated so far; callers must not use that list.
pub fn resolve_packages(requested: &[String], available: &[BuildOption]) -> (Vec<String>, bool) {
    let mut packages = Vec::new();

    for name in requested {
        match available.iter().find(|option| option.name == *name) {
            Some(option) => packages.extend(option.packages.iter().cloned()),
            None => return (packages, false),
        }
    }

    (dedupe(&packages), true)
}

/// Resolves requested build options for `language`, failing with a message
/// that points at the template descriptor when one is not declared.
pub fn build_option_packages(
    requested: &[String],
    language: &str,
    available: &[BuildOption],
) -> Result<Vec<String>, BuildOptionError> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let (packages, all_found) = resolve_packages(requested, available);
    if !all_found {
        return Err(BuildOptionError::Unavailable {
            language: language.to_owned(),
            requested: requested.to_vec(),
        });
    }

    tracing::debug!(language, packages = ?packages, "resolved build options");
    Ok(packages)
}

#[derive(Debug, thiserror::Error)]
pub enum BuildOptionError {
    #[error(
        "build option unavailable for {language} (requested: {}); \
         check template/{language}/template.yml for supported build options",
        requested.join(", ")
    )]
    Unavailable {
        language: String,
        requested: Vec<String>,
    },
}
