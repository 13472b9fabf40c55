use std::path::{Path, PathBuf};

use fnpack_core::template::{self, is_single_segment};

use crate::copy::{CopyError, copy_files};
use crate::scope::{ScopeError, path_in_scope};

/// Directory, relative to the project, holding one build context per function.
pub const BUILD_DIR: &str = "build";

/// Handler entries that are never overlaid into the build context.
const RESERVED_ENTRIES: &[&str] = &[BUILD_DIR, template::TEMPLATE_DIR];

/// Mode used when creating the build context directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirPermissions(u32);

impl DirPermissions {
    pub const PRIVATE: Self = Self(0o700);
    /// CI runners often build as a different user than the one that checked out.
    pub const SHARED: Self = Self(0o777);

    pub fn mode(self) -> u32 {
        self.0
    }

    /// [`Self::SHARED`] when the `CI` value is `true` or `1`.
    pub fn from_ci_value(value: Option<&str>) -> Self {
        match value {
            Some("true" | "1") => Self::SHARED,
            _ => Self::PRIVATE,
        }
    }

    /// Reads `CI` from the process environment at call time.
    pub fn from_env() -> Self {
        let ci = std::env::var("CI")
            // arch-lint: allow(no-silent-result-drop) reason="an unset CI variable means a local build"
            .ok();
        Self::from_ci_value(ci.as_deref())
    }
}

impl Default for DirPermissions {
    fn default() -> Self {
        Self::PRIVATE
    }
}

/// Inputs for [`create_build_context`].
#[derive(Debug, Clone)]
pub struct ContextRequest<'a> {
    /// Root of the project; holds `template/` and `build/` and bounds extra paths.
    pub project_dir: &'a Path,
    pub function_name: &'a str,
    /// Handler directory, relative to `project_dir` unless absolute.
    pub handler: &'a Path,
    pub language: &'a str,
    /// False in custom-Dockerfile mode: no template overlay, handler at the root.
    pub use_template: bool,
    /// Folder inside the context that receives the handler in template mode.
    /// Must be a single folder name.
    pub handler_folder: &'a str,
    pub extra_paths: &'a [String],
    pub permissions: DirPermissions,
}

/// `<project>/build/<function>`
pub fn build_context_path(project_dir: &Path, function_name: &str) -> PathBuf {
    project_dir.join(BUILD_DIR).join(function_name)
}

/// Recreates the build context for one function and returns its path.
///
/// The function name and, in template mode, the handler folder must each be
/// a single folder name; this is checked before anything is removed. The
/// previous context for the same function is removed first. In template
/// mode the language template is copied to the context root and the handler
/// is overlaid into the handler folder on top of it; otherwise the handler
/// is copied to the context root. Handler entries named `build` or
/// `template` are skipped. Each extra path must resolve inside the project
/// and is copied to the same relative location under the handler folder.
///
/// Errors abort immediately and leave the partial context on disk.
pub fn create_build_context(request: &ContextRequest<'_>) -> Result<PathBuf, ContextError> {
    if !is_single_segment(request.function_name) {
        return Err(ContextError::FunctionName {
            name: request.function_name.to_owned(),
        });
    }
    let context_path = build_context_path(request.project_dir, request.function_name);

    let function_path = if request.use_template {
        if !is_single_segment(request.handler_folder) {
            return Err(ContextError::HandlerFolder {
                folder: request.handler_folder.to_owned(),
            });
        }
        context_path.join(request.handler_folder)
    } else {
        context_path.clone()
    };

    if context_path.exists() {
        tracing::info!(path = %context_path.display(), "clearing temporary build folder");
        std::fs::remove_dir_all(&context_path).map_err(|e| ContextError::Cleanup {
            path: context_path.clone(),
            source: e,
        })?;
    }

    let handler = request.project_dir.join(request.handler);
    tracing::info!(
        function = request.function_name,
        handler = %handler.display(),
        target = %function_path.display(),
        "preparing build context"
    );

    create_dir(&function_path, request.permissions)?;

    if request.use_template {
        let template_path = template::template_path(request.project_dir, request.language);
        copy_files(&template_path, &context_path).map_err(|e| ContextError::Template {
            language: request.language.to_owned(),
            source: e,
        })?;
    }

    overlay_handler(&handler, &function_path)?;

    for extra in request.extra_paths {
        let scoped = path_in_scope(Path::new(extra), request.project_dir)?;
        tracing::debug!(path = %scoped.absolute.display(), "copying extra path");
        copy_files(&scoped.absolute, &function_path.join(&scoped.relative)).map_err(|e| {
            ContextError::ExtraPath {
                path: extra.clone(),
                source: e,
            }
        })?;
    }

    Ok(context_path)
}

fn overlay_handler(handler: &Path, function_path: &Path) -> Result<(), ContextError> {
    let entries = std::fs::read_dir(handler).map_err(|e| ContextError::ReadHandler {
        path: handler.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ContextError::ReadHandler {
            path: handler.to_path_buf(),
            source: e,
        })?;
        names.push(entry.file_name());
    }
    names.sort();

    for name in names {
        if RESERVED_ENTRIES.iter().any(|reserved| name == *reserved) {
            tracing::info!(name = %name.to_string_lossy(), "skipping reserved folder");
            continue;
        }
        copy_files(&handler.join(&name), &function_path.join(&name)).map_err(|e| {
            ContextError::Handler {
                path: handler.to_path_buf(),
                source: e,
            }
        })?;
    }

    Ok(())
}

fn create_dir(path: &Path, permissions: DirPermissions) -> Result<(), ContextError> {
    tracing::debug!(
        path = %path.display(),
        mode = %format!("{:o}", permissions.mode()),
        "creating build directory"
    );

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(permissions.mode());
    }

    builder.create(path).map_err(|e| ContextError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to clear temporary build folder {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy template for language {language}")]
    Template {
        language: String,
        source: CopyError,
    },
    #[error("failed to read handler {path}")]
    ReadHandler {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy handler {path}")]
    Handler { path: PathBuf, source: CopyError },
    #[error("function name {name:?} must be a single folder name inside the build directory")]
    FunctionName { name: String },
    #[error("handler folder {folder:?} must be a single folder name inside the build context")]
    HandlerFolder { folder: String },
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("failed to copy extra path {path}")]
    ExtraPath { path: String, source: CopyError },
}
