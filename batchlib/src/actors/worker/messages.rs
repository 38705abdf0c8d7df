use crate::events::JobStatus;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum WorkerMessage {
    GetStatus {
        response: oneshot::Sender<JobStatus>,
    },
}
