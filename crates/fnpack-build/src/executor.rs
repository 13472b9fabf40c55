use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecTask {
    pub command: String,
    pub args: Vec<String>,
    /// Working directory for the process.
    pub cwd: PathBuf,
    /// Mirror stdout/stderr to the terminal while capturing them.
    pub stream_output: bool,
}

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Abstraction over process execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// A non-zero exit is not an error at this level; callers inspect
/// [`ExecOutput::exit_code`].
#[allow(async_fn_in_trait)]
pub trait BuildExecutor: Send + Sync {
    /// Run the task to completion and capture its output.
    async fn exec(&self, task: &ExecTask) -> Result<ExecOutput, ExecError>;
}

/// Spawns real processes with `tokio::process`.
pub struct RealExecutor;

impl BuildExecutor for RealExecutor {
    async fn exec(&self, task: &ExecTask) -> Result<ExecOutput, ExecError> {
        tracing::debug!(command = %task.command, args = ?task.args, cwd = %task.cwd.display(), "spawning");

        let mut child = tokio::process::Command::new(&task.command)
            .args(&task.args)
            .current_dir(&task.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::Spawn {
                command: task.command.clone(),
                source: e,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, stdout, stderr) = tokio::try_join!(
            child.wait(),
            tee(stdout, task.stream_output.then(tokio::io::stdout)),
            tee(stderr, task.stream_output.then(tokio::io::stderr)),
        )
        .map_err(|e| ExecError::Io {
            command: task.command.clone(),
            source: e,
        })?;

        let exit_code = status
            .code()
            // arch-lint: allow(no-silent-result-drop) reason="a process killed by a signal has no exit code"
            .unwrap_or(-1);

        Ok(ExecOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Reads `reader` to the end, copying each chunk to `sink` when present.
async fn tee<R, W>(reader: Option<R>, mut sink: Option<W>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut captured = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(captured);
    };

    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if let Some(sink) = sink.as_mut() {
            sink.write_all(&buf[..n]).await?;
            sink.flush().await?;
        }
        captured.extend_from_slice(&buf[..n]);
    }

    Ok(captured)
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to start {command} — is it installed and on PATH?")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("I/O error while running {command}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}
