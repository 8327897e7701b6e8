use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stderr lines kept on a failed ffmpeg run.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum ConverterError {
    /// ffmpeg or ffprobe could not be spawned.
    #[error("{tool} not found at {path}")]
    ToolNotFound { tool: &'static str, path: PathBuf },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// ffmpeg ran and failed; `stderr` holds the tail of its error lines.
    #[error("Conversion failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    #[error("Conversion timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Cannot read media info: {0}")]
    Probe(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr: stderr.map(|s| tail(&s)),
        }
    }

    /// Map a spawn error, telling a missing binary apart from other I/O.
    pub(crate) fn spawn(tool: &'static str, path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound {
                tool,
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

fn tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_keeps_stderr_tail() {
        let stderr: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        match ConverterError::failed("ffmpeg exited with code 1", Some(stderr)) {
            ConverterError::Failed { reason, stderr } => {
                assert_eq!(reason, "ffmpeg exited with code 1");
                let stderr = stderr.unwrap();
                assert_eq!(stderr.lines().count(), STDERR_TAIL_LINES);
                assert!(stderr.starts_with("line 30"));
                assert!(stderr.ends_with("line 49"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_spawn_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err = ConverterError::spawn("ffprobe", Path::new("/opt/ffprobe"), err);
        assert_eq!(err.to_string(), "ffprobe not found at /opt/ffprobe");

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConverterError::spawn("ffmpeg", Path::new("ffmpeg"), err);
        assert!(matches!(err, ConverterError::Io(_)));
    }
}
