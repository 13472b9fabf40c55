use std::path::PathBuf;
use std::process::Command;

/// Version-control queries used to tag images.
///
/// Each query returns an empty string when the answer is unavailable, for
/// example outside a repository. Production code uses [`GitCli`], tests
/// use mockall-generated mocks.
pub trait VersionControl {
    /// Short SHA of `HEAD`.
    fn sha(&self) -> String;

    /// Name of the checked-out branch.
    fn branch(&self) -> String;

    /// `git describe` output (nearest tag, or SHA when untagged).
    fn describe(&self) -> String;
}

/// Runs the `git` CLI in a fixed directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn query(&self, args: &[&str]) -> String {
        let output = match Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
        {
            Ok(output) => output,
            // arch-lint: allow(no-error-swallowing) reason="a missing git binary leaves the tag value empty, which tag resolution reports"
            Err(e) => {
                tracing::debug!(error = %e, ?args, "failed to execute git");
                return String::new();
            }
        };

        if !output.status.success() {
            tracing::debug!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                ?args,
                "git query failed"
            );
            return String::new();
        }

        String::from_utf8_lossy(&output.stdout).trim().to_owned()
    }
}

impl VersionControl for GitCli {
    fn sha(&self) -> String {
        self.query(&["rev-parse", "--short", "HEAD"])
    }

    fn branch(&self) -> String {
        self.query(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn describe(&self) -> String {
        self.query(&["describe", "--tags", "--always"])
    }
}
