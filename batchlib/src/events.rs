use crate::errors::StreamError;
use crate::types::OutputBlob;
use std::fmt;

/// Exit code reported for a job whose process could not be created.
pub const SPAWN_FAILURE_CODE: i32 = 127;
/// Exit code reported for a job whose process could not be waited on.
pub const LOST_CODE: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// One chunk of child output, exactly as it came off the pipe.
///
/// Chunk boundaries are whatever the OS delivered; they do not line up with lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Stdout(OutputBlob),
    Stderr(OutputBlob),
}

impl Output {
    pub fn new(stream: StreamKind, blob: OutputBlob) -> Self {
        match stream {
            StreamKind::Stdout => Output::Stdout(blob),
            StreamKind::Stderr => Output::Stderr(blob),
        }
    }

    pub fn stream(&self) -> StreamKind {
        match self {
            Output::Stdout(_) => StreamKind::Stdout,
            Output::Stderr(_) => StreamKind::Stderr,
        }
    }

    pub fn blob(&self) -> &OutputBlob {
        match self {
            Output::Stdout(blob) | Output::Stderr(blob) => blob,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Exited { code: i32 },
    Killed { signal: i32 },
    SpawnFailed,
    Lost,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Exited { code: 0 })
    }

    /// Project the status onto a single integer code.
    ///
    /// Signals map to their negated number so they never collide with a normal exit.
    pub fn code(&self) -> Option<i32> {
        match *self {
            JobStatus::Running => None,
            JobStatus::Exited { code } => Some(code),
            JobStatus::Killed { signal } => Some(-signal),
            JobStatus::SpawnFailed => Some(SPAWN_FAILURE_CODE),
            JobStatus::Lost => Some(LOST_CODE),
        }
    }
}

/// The single terminal event of a job.
#[derive(Debug)]
pub struct JobExit {
    pub status: JobStatus,
    /// read failures on the job's pipes; non-empty means some output may be missing
    pub stream_errors: Vec<StreamError>,
}

impl JobExit {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            stream_errors: Vec::new(),
        }
    }

    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(LOST_CODE)
    }

    pub fn is_degraded(&self) -> bool {
        !self.stream_errors.is_empty()
    }
}
