mod actor;
mod messages;

use crate::errors::{self, JobError, SpawnError};
use crate::events::{JobExit, JobStatus, Output};
use crate::types::{JobId, JobSpec};
use actor::Actor;
use messages::WorkerMessage;
use std::process::Stdio;
use tokio::{
    process,
    sync::{mpsc, oneshot},
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

/// Lazy, single-pass stream of a job's output chunks. Ends once both pipes are closed.
pub type OutputEvents = UnboundedReceiverStream<Output>;

/// One running (or already finished) job.
///
/// Like the other handles in this crate, the real work happens in a worker actor; this struct
/// only holds the channels to it. Output and the exit event can each be observed exactly once.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    spec: JobSpec,
    pid: Option<u32>,
    sender: Option<mpsc::UnboundedSender<WorkerMessage>>,
    output_rx: Option<mpsc::UnboundedReceiver<Output>>,
    exit_rx: Option<oneshot::Receiver<JobExit>>,
    spawn_error: Option<SpawnError>,
}

impl JobHandle {
    /// Spawn the job, failing if the process cannot be created.
    ///
    /// Must be called from within a tokio runtime.
    pub fn try_spawn(spec: JobSpec) -> Result<Self, SpawnError> {
        let mut command = process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.dir {
            command.current_dir(dir);
        }
        let child = command.spawn().map_err(|source| SpawnError {
            program: spec.program.clone(),
            source,
        })?;

        let id = JobId::new_v4();
        let pid = child.id();
        debug!(job = %id, label = %spec.label, ?pid, "spawned job");

        let (sender, inbox) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        Actor::spawn(id, inbox, output_tx, exit_tx, child);

        Ok(Self {
            id,
            spec,
            pid,
            sender: Some(sender),
            output_rx: Some(output_rx),
            exit_rx: Some(exit_rx),
            spawn_error: None,
        })
    }

    /// Spawn the job. A spawn failure does not escape: the returned handle is already terminal
    /// with no output and a `SpawnFailed` exit event.
    pub fn spawn(spec: JobSpec) -> Self {
        match Self::try_spawn(spec.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(label = %spec.label, error = %e, "job failed to spawn");
                Self::failed(spec, e)
            }
        }
    }

    fn failed(spec: JobSpec, spawn_error: SpawnError) -> Self {
        // both senders are dropped right away: the output stream is empty and closed
        let (_, output_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        let _ = exit_tx.send(JobExit::new(JobStatus::SpawnFailed));
        Self {
            id: JobId::new_v4(),
            spec,
            pid: None,
            sender: None,
            output_rx: Some(output_rx),
            exit_rx: Some(exit_rx),
            spawn_error: Some(spawn_error),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn label(&self) -> &str {
        &self.spec.label
    }

    /// OS process id, absent if the job never spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn spawn_error(&self) -> Option<&SpawnError> {
        self.spawn_error.as_ref()
    }

    /// Take the output stream. Returns `None` if it was already taken.
    pub fn output_events(&mut self) -> Option<OutputEvents> {
        self.output_rx.take().map(UnboundedReceiverStream::new)
    }

    /// Wait for the job's terminal event.
    ///
    /// Resolves only after both output pipes have been drained, so every chunk of this job is
    /// already in the output stream by the time this returns.
    pub async fn exit_event(&mut self) -> errors::Result<JobExit> {
        let exit_rx = self.exit_rx.take().ok_or(JobError::AlreadyObserved)?;
        exit_rx.await.map_err(|_| JobError::WorkerGone)
    }

    /// Current status, without consuming anything.
    pub async fn status(&self) -> JobStatus {
        let sender = match &self.sender {
            Some(sender) => sender,
            None => return JobStatus::SpawnFailed,
        };
        let (tx, rx) = oneshot::channel();
        if sender.send(WorkerMessage::GetStatus { response: tx }).is_err() {
            return JobStatus::Lost;
        }
        rx.await.unwrap_or(JobStatus::Lost)
    }
}
