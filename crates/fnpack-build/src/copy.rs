use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Copies `src` to `dst`.
///
/// A regular file is copied to `dst`, creating parent directories. A
/// directory is reproduced recursively under `dst`, merging into whatever
/// is already there and overwriting files with the same relative path.
/// Symlinks are followed.
pub fn copy_files(src: &Path, dst: &Path) -> Result<(), CopyError> {
    let metadata = fs::metadata(src).map_err(|e| CopyError::Read {
        path: src.to_path_buf(),
        source: e,
    })?;

    if metadata.is_file() {
        return copy_file(src, dst);
    }

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| CopyError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;
        let relative =
            entry
                .path()
                .strip_prefix(src)
                .map_err(|_| CopyError::UnexpectedEntry {
                    path: entry.path().to_path_buf(),
                })?;
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            create_dir(&target)?;
        } else if file_type.is_file() {
            copy_file(entry.path(), &target)?;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping special file");
        }
    }

    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), CopyError> {
    if let Some(parent) = dst.parent() {
        create_dir(parent)?;
    }
    fs::copy(src, dst).map_err(|e| CopyError::CopyFile {
        path: src.to_path_buf(),
        dest: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), CopyError> {
    fs::create_dir_all(path).map_err(|e| CopyError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to walk directory {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("walked entry {path} is not below the copy source")]
    UnexpectedEntry { path: PathBuf },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path} to {dest}")]
    CopyFile {
        path: PathBuf,
        dest: PathBuf,
        source: std::io::Error,
    },
}
