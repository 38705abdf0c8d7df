//! Labeled log records for job output and job completion.
//!
//! Chunks are logged exactly as they came off the pipe. They are not re-split into lines, so one
//! record may hold several lines or half of one.

use crate::events::{JobStatus, Output};
use crate::types::{JobId, Label};

pub use crate::actors::logger::LogHandle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogRecord {
    Chunk {
        job: JobId,
        label: Label,
        output: Output,
    },
    Exit {
        job: JobId,
        label: Label,
        status: JobStatus,
        /// extra context for abnormal endings, e.g. the spawn error
        detail: Option<String>,
        stream_errors: usize,
    },
}

impl LogRecord {
    pub fn job(&self) -> JobId {
        match self {
            LogRecord::Chunk { job, .. } | LogRecord::Exit { job, .. } => *job,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LogRecord::Chunk { label, .. } | LogRecord::Exit { label, .. } => label,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, LogRecord::Exit { .. })
    }

    /// Bytes written to the log sink for this record, always newline terminated.
    pub fn render(&self) -> Vec<u8> {
        match self {
            LogRecord::Chunk { label, output, .. } => {
                let blob = output.blob();
                let mut line = format!("{} [{}]: \n", label, output.stream()).into_bytes();
                line.extend_from_slice(blob);
                if !blob.ends_with(b"\n") {
                    line.push(b'\n');
                }
                line
            }
            LogRecord::Exit {
                label,
                status,
                detail,
                stream_errors,
                ..
            } => {
                let mut line = match status.code() {
                    Some(code) => format!("{} exited with code {}", label, code),
                    None => format!("{} is still running", label),
                };
                match status {
                    JobStatus::Killed { signal } => {
                        line.push_str(&format!(" (killed by signal {})", signal))
                    }
                    JobStatus::SpawnFailed => match detail {
                        Some(detail) => line.push_str(&format!(" (failed to spawn: {})", detail)),
                        None => line.push_str(" (failed to spawn)"),
                    },
                    JobStatus::Lost => line.push_str(" (lost)"),
                    JobStatus::Running | JobStatus::Exited { .. } => {}
                }
                match stream_errors {
                    0 => {}
                    1 => line.push_str(" (1 stream error)"),
                    n => line.push_str(&format!(" ({} stream errors)", n)),
                }
                line.push('\n');
                line.into_bytes()
            }
        }
    }
}
