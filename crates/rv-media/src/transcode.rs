//! ffmpeg discovery and invocation.
//!
//! [`ToolCommand`] runs an external program with a deadline. The child is
//! spawned with `kill_on_drop`, so it dies both when the deadline passes and
//! when the future awaiting it is dropped (for example because the upload
//! request that started it was cancelled).

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use rv_core::config::ToolsConfig;
use rv_core::{Error, Result};
use serde::Serialize;
use tokio::process::Command;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A builder for external tool invocations.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] when the process cannot be spawned, exits non-zero
    /// (message carries stderr), or outlives the timeout.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let tool = self.tool_name();

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool(&tool, format!("failed to spawn: {e}")))?;

        tracing::debug!(tool = %tool, args = ?self.args, "Spawned external tool");

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::tool(
                    &tool,
                    format!("I/O error waiting for process: {e}"),
                ))
            }
            // the dropped future takes the child with it
            Err(_) => {
                return Err(Error::tool(
                    &tool,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        };

        let out = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !out.status.success() {
            return Err(Error::tool(
                &tool,
                format!("exited with status {}: {}", out.status, last_lines(&out.stderr, 5)),
            ));
        }

        Ok(out)
    }
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

/// Availability report for `check-tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// A located ffmpeg executable.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    path: PathBuf,
    timeout: Duration,
}

impl Ffmpeg {
    /// Locate ffmpeg: the configured path if it exists, otherwise `PATH`.
    pub fn discover(tools: &ToolsConfig) -> Option<Self> {
        let path = match tools.ffmpeg_path.as_deref() {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => {
                tracing::warn!(
                    "Configured ffmpeg path {} does not exist; searching PATH",
                    p.display()
                );
                which::which("ffmpeg").ok()
            }
            None => which::which("ffmpeg").ok(),
        }?;

        Some(Self {
            path,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Use an explicit executable path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound each transcode by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First line of `ffmpeg -version`.
    pub async fn version(&self) -> Option<String> {
        let out = ToolCommand::new(&self.path)
            .arg("-version")
            .timeout(Duration::from_secs(10))
            .execute()
            .await
            .ok()?;
        out.stdout.lines().next().map(str::to_string)
    }

    /// Availability report, probing the version when found.
    pub async fn check(tools: &ToolsConfig) -> ToolInfo {
        match Self::discover(tools) {
            Some(ffmpeg) => ToolInfo {
                name: "ffmpeg".into(),
                available: true,
                version: ffmpeg.version().await,
                path: Some(ffmpeg.path.clone()),
            },
            None => ToolInfo {
                name: "ffmpeg".into(),
                available: false,
                version: None,
                path: None,
            },
        }
    }

    /// Transcode `input` into a web-playable H.264/AAC MP4 at `output`,
    /// overwriting it. The moov atom is moved to the front so browsers can
    /// start playback before the whole file has arrived.
    pub async fn transcode_to_mp4(&self, input: &Path, output: &Path) -> Result<()> {
        tracing::info!(
            "Transcoding {} -> {}",
            input.display(),
            output.display()
        );

        ToolCommand::new(&self.path)
            .args(["-hide_banner", "-nostdin", "-y", "-i"])
            .arg(input.to_string_lossy())
            .args([
                "-c:v", "libx264", "-preset", "veryfast", "-crf", "23",
                "-pix_fmt", "yuv420p",
                "-c:a", "aac", "-b:a", "128k",
                "-movflags", "+faststart",
                "-f", "mp4",
            ])
            .arg(output.to_string_lossy())
            .timeout(self.timeout)
            .execute()
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        let output = ToolCommand::new("echo").arg("hello").execute().await;
        if let Ok(out) = output {
            assert!(out.status.success());
            assert!(out.stdout.contains("hello"));
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let err = ToolCommand::new("nonexistent_tool_xyz_12345")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
    }

    #[tokio::test]
    async fn timeout_fires() {
        let result = ToolCommand::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("timed out") || err.contains("failed to spawn"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn transcode_with_missing_binary_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = Ffmpeg::at(dir.path().join("no-ffmpeg-here"));
        let err = ffmpeg
            .transcode_to_mp4(&dir.path().join("in.mov"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
    }

    #[test]
    fn discover_does_not_panic() {
        let _ = Ffmpeg::discover(&ToolsConfig::default());
    }

    #[test]
    fn stderr_tail() {
        assert_eq!(last_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(last_lines("only", 5), "only");
    }
}
