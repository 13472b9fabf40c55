use std::path::{Component, Path, PathBuf};

/// A path that has been checked to lie strictly inside a scope directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedPath {
    /// Normalized absolute path.
    pub absolute: PathBuf,
    /// The same path relative to the scope root; never empty.
    pub relative: PathBuf,
}

/// Resolves `candidate` to an absolute path and checks that it lies strictly
/// inside `scope`.
///
/// Relative candidates are resolved against `scope`. `.` and `..` are removed
/// lexically, so the candidate does not need to exist. Containment is
/// compared per path component: `/work-evil` is not inside `/work`. When the
/// candidate exists, the check is repeated on canonical paths so a symlink
/// cannot point out of the scope.
pub fn path_in_scope(candidate: &Path, scope: &Path) -> Result<ScopedPath, ScopeError> {
    let scope_abs = std::path::absolute(scope)
        .map(|p| normalize(&p))
        .map_err(|e| ScopeError::Resolve {
            path: scope.to_path_buf(),
            source: e,
        })?;
    let resolved = normalize(&scope_abs.join(candidate));

    check_contained(candidate, &resolved, &scope_abs)?;

    if resolved.exists() {
        let canonical_scope = canonicalize(&scope_abs)?;
        let canonical = canonicalize(&resolved)?;
        check_contained(candidate, &canonical, &canonical_scope)?;
    }

    let relative = resolved
        .strip_prefix(&scope_abs)
        .map(Path::to_path_buf)
        .map_err(|_| ScopeError::OutsideScope {
            path: candidate.to_path_buf(),
            resolved: resolved.clone(),
            scope: scope_abs.clone(),
        })?;

    Ok(ScopedPath {
        absolute: resolved,
        relative,
    })
}

fn check_contained(candidate: &Path, resolved: &Path, scope: &Path) -> Result<(), ScopeError> {
    if resolved == scope {
        return Err(ScopeError::EqualsScope {
            path: candidate.to_path_buf(),
            resolved: resolved.to_path_buf(),
        });
    }
    if !resolved.starts_with(scope) {
        return Err(ScopeError::OutsideScope {
            path: candidate.to_path_buf(),
            resolved: resolved.to_path_buf(),
            scope: scope.to_path_buf(),
        });
    }
    Ok(())
}

fn canonicalize(path: &Path) -> Result<PathBuf, ScopeError> {
    path.canonicalize().map_err(|e| ScopeError::Resolve {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Lexically removes `.` and `..` components. `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("forbidden path {path:?} appears to equal the entire project ({resolved})")]
    EqualsScope { path: PathBuf, resolved: PathBuf },
    #[error("forbidden path {path:?} appears to be outside of {scope} ({resolved})")]
    OutsideScope {
        path: PathBuf,
        resolved: PathBuf,
        scope: PathBuf,
    },
    #[error("failed to resolve path {path}")]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}
