use crate::events::StreamKind;
use crate::types::Program;
use std::{io, result};
use thiserror::Error;

/// The process for a job could not be created (missing executable, permission denied, ...).
#[derive(Error, Debug)]
#[error("failed to spawn `{program}`: {source}")]
pub struct SpawnError {
    pub program: Program,
    #[source]
    pub source: io::Error,
}

/// Reading one of a job's output pipes failed.
#[derive(Error, Debug)]
#[error("failed to read {stream}: {source}")]
pub struct StreamError {
    pub stream: StreamKind,
    #[source]
    pub source: io::Error,
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("the exit event of this job was already observed")]
    AlreadyObserved,
    #[error("the job worker exited without reporting")]
    WorkerGone,
}

pub type Result<T> = result::Result<T, JobError>;
