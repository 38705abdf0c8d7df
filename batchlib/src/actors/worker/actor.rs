use super::messages::WorkerMessage;
use crate::errors::StreamError;
use crate::events::{JobExit, JobStatus, Output, StreamKind};
use crate::types::JobId;

use bytes::BytesMut;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
    select,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

const READ_CAPACITY: usize = 4096;

pub struct Actor {
    job_id: JobId,
    inbox: mpsc::UnboundedReceiver<WorkerMessage>,
    job_status: JobStatus,
}

impl Actor {
    pub fn spawn(
        job_id: JobId,
        inbox: mpsc::UnboundedReceiver<WorkerMessage>,
        output_tx: mpsc::UnboundedSender<Output>,
        exit_tx: oneshot::Sender<JobExit>,
        child: Child,
    ) {
        tokio::spawn(async move {
            let actor = Self {
                job_id,
                inbox,
                job_status: JobStatus::Running,
            };
            actor.run(output_tx, exit_tx, child).await;
        });
    }

    async fn run(
        mut self,
        output_tx: mpsc::UnboundedSender<Output>,
        exit_tx: oneshot::Sender<JobExit>,
        mut child: Child,
    ) {
        let (child_exit_tx, child_exit_rx) = oneshot::channel();
        // grab stdout and stderr, if they've been piped
        let maybe_stdout = child.stdout.take();
        let maybe_stderr = child.stderr.take();

        // each reader owns a sender, so the output stream closes once both pipes hit EOF
        let stdout_reader = maybe_stdout
            .map(|stdout| tokio::spawn(pipe_output(stdout, StreamKind::Stdout, output_tx.clone())));
        let stderr_reader = maybe_stderr
            .map(|stderr| tokio::spawn(pipe_output(stderr, StreamKind::Stderr, output_tx.clone())));
        drop(output_tx);

        let job_id = self.job_id;
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(exit_status) => status_from(exit_status),
                Err(e) => {
                    warn!(job = %job_id, error = %e, "failed to wait on child");
                    JobStatus::Lost
                }
            };
            // the exit event is only reported after all output has been drained
            let readers = [
                (StreamKind::Stdout, stdout_reader),
                (StreamKind::Stderr, stderr_reader),
            ];
            let stream_errors = drain_readers(job_id, readers).await;
            debug!(job = %job_id, ?status, "child reaped and drained");
            let _ = child_exit_tx.send(JobExit {
                status,
                stream_errors,
            });
        });

        self.handle_messages(child_exit_rx, exit_tx).await;
    }

    async fn handle_messages(
        &mut self,
        mut child_exit_rx: oneshot::Receiver<JobExit>,
        exit_tx: oneshot::Sender<JobExit>,
    ) {
        use WorkerMessage::*;
        let mut exit_tx = Some(exit_tx);
        let mut inbox_open = true;
        loop {
            select! {
                maybe_msg = self.inbox.recv(), if inbox_open => {
                    match maybe_msg {
                        Some(GetStatus { response }) => {
                            let _ = response.send(self.job_status);
                        }
                        None => {
                            // handle dropped; the child is left to run out, but still reaped
                            if self.job_status.is_terminal() {
                                return;
                            }
                            inbox_open = false;
                        }
                    }
                }
                exit = &mut child_exit_rx, if !self.job_status.is_terminal() => {
                    let exit = exit.unwrap_or_else(|_| JobExit::new(JobStatus::Lost));
                    self.job_status = exit.status;
                    if let Some(exit_tx) = exit_tx.take() {
                        let _ = exit_tx.send(exit);
                    }
                    if !inbox_open {
                        return;
                    }
                }
            }
        }
    }
}

/// Forward every read from `reader` as one output chunk until EOF.
async fn pipe_output<R>(
    mut reader: R,
    stream: StreamKind,
    output_tx: mpsc::UnboundedSender<Output>,
) -> Result<(), StreamError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CAPACITY);
    loop {
        buf.reserve(READ_CAPACITY);
        match reader.read_buf(&mut buf).await {
            Ok(0) => return Ok(()),
            Ok(_) => {
                // move the bytes out of buf and into a message.
                // keep draining even if nobody listens, a full pipe would stall the child
                let _ = output_tx.send(Output::new(stream, buf.split().freeze()));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(StreamError { stream, source }),
        }
    }
}

/// Wait for every pipe reader to finish, collecting the ones that failed.
async fn drain_readers<I>(job_id: JobId, readers: I) -> Vec<StreamError>
where
    I: IntoIterator<Item = (StreamKind, Option<JoinHandle<Result<(), StreamError>>>)>,
{
    let mut stream_errors = Vec::new();
    for (stream, reader) in readers {
        let Some(reader) = reader else { continue };
        if let Err(e) = join_reader(stream, reader).await {
            warn!(job = %job_id, error = %e, "output stream failed");
            stream_errors.push(e);
        }
    }
    stream_errors
}

async fn join_reader(
    stream: StreamKind,
    reader: JoinHandle<Result<(), StreamError>>,
) -> Result<(), StreamError> {
    reader.await.unwrap_or_else(|e| {
        Err(StreamError {
            stream,
            source: io::Error::new(io::ErrorKind::Other, e),
        })
    })
}

fn status_from(exit_status: ExitStatus) -> JobStatus {
    if let Some(code) = exit_status.code() {
        JobStatus::Exited { code }
    } else if let Some(signal) = exit_status.signal() {
        JobStatus::Killed { signal }
    } else {
        JobStatus::Lost
    }
}
