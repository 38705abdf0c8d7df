use crate::actors::worker::JobHandle;
use crate::events::{JobExit, JobStatus, LOST_CODE};
use crate::log::{LogHandle, LogRecord};
use crate::types::{JobId, JobSpec, Label};

use futures::future::join_all;
use std::collections::BTreeMap;
use tokio::task::JoinError;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

/// What became of one job in a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobReport {
    pub id: JobId,
    pub label: Label,
    pub status: JobStatus,
    /// number of output chunks logged
    pub chunks: usize,
    /// total bytes across all chunks
    pub bytes: usize,
    pub stream_errors: usize,
}

impl JobReport {
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(LOST_CODE)
    }
}

/// Terminal state of every job in a batch, in the order the specs were given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchResult {
    reports: Vec<JobReport>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn reports(&self) -> &[JobReport] {
        &self.reports
    }

    /// First report with this label.
    pub fn get(&self, label: &str) -> Option<&JobReport> {
        self.reports.iter().find(|report| report.label == label)
    }

    /// Label to exit code. With duplicate labels the last job wins.
    pub fn exit_codes(&self) -> BTreeMap<Label, i32> {
        self.reports
            .iter()
            .map(|report| (report.label.clone(), report.code()))
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(|report| report.status.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.reports
            .iter()
            .filter(|report| !report.status.is_success())
    }
}

/// Runs a batch of independent jobs to completion.
///
/// Every job is launched up front and watched by its own task. A job that fails to spawn, exits
/// non-zero or dies on a signal is reported like any other; it never stops its siblings.
#[derive(Clone, Debug)]
pub struct Supervisor {
    log: LogHandle,
}

impl Supervisor {
    pub fn new(log: LogHandle) -> Self {
        Self { log }
    }

    /// A supervisor logging to stdout. Must be called from within a tokio runtime.
    pub fn stdout() -> Self {
        Self::new(LogHandle::stdout())
    }

    pub fn log(&self) -> &LogHandle {
        &self.log
    }

    /// Launch every job and wait until all of them are terminal and drained.
    pub async fn run<I>(&self, specs: I) -> BatchResult
    where
        I: IntoIterator<Item = JobSpec>,
    {
        let handles: Vec<JobHandle> = specs.into_iter().map(JobHandle::spawn).collect();
        info!(jobs = handles.len(), "batch started");

        let (jobs, tasks): (Vec<_>, Vec<_>) = handles
            .into_iter()
            .map(|handle| {
                let job = (handle.id(), handle.label().to_owned());
                (job, tokio::spawn(observe(handle, self.log.clone())))
            })
            .unzip();

        // join barrier
        let reports: Vec<JobReport> = join_all(tasks)
            .await
            .into_iter()
            .zip(jobs)
            .map(|(joined, (id, label))| joined.unwrap_or_else(|e| self.lost(id, label, e)))
            .collect();
        self.log.flush().await;

        let result = BatchResult { reports };
        info!(
            jobs = result.len(),
            failed = result.failures().count(),
            "batch finished"
        );
        result
    }

    /// Report for a job whose observing task panicked or was cancelled.
    fn lost(&self, id: JobId, label: Label, e: JoinError) -> JobReport {
        error!(job = %id, label = %label, error = %e, "job task died");
        self.log.record(LogRecord::Exit {
            job: id,
            label: label.clone(),
            status: JobStatus::Lost,
            detail: None,
            stream_errors: 0,
        });
        JobReport {
            id,
            label,
            status: JobStatus::Lost,
            chunks: 0,
            bytes: 0,
            stream_errors: 0,
        }
    }
}

/// Drain one job's output into the log, then log its exit.
async fn observe(mut handle: JobHandle, log: LogHandle) -> JobReport {
    let id = handle.id();
    let label = handle.label().to_owned();
    let mut chunks = 0;
    let mut bytes = 0;

    if let Some(mut events) = handle.output_events() {
        while let Some(output) = events.next().await {
            chunks += 1;
            bytes += output.blob().len();
            log.record(LogRecord::Chunk {
                job: id,
                label: label.clone(),
                output,
            });
        }
    }

    let exit = handle.exit_event().await.unwrap_or_else(|e| {
        warn!(job = %id, label = %label, error = %e, "no exit event for job");
        JobExit::new(JobStatus::Lost)
    });
    info!(job = %id, label = %label, code = exit.code(), "job finished");

    log.record(LogRecord::Exit {
        job: id,
        label: label.clone(),
        status: exit.status,
        detail: handle.spawn_error().map(|e| e.source.to_string()),
        stream_errors: exit.stream_errors.len(),
    });

    JobReport {
        id,
        label,
        status: exit.status,
        chunks,
        bytes,
        stream_errors: exit.stream_errors.len(),
    }
}
