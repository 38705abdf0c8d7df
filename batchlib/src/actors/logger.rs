mod actor;
mod messages;

use crate::log::LogRecord;
use actor::Actor;
use messages::Message;

use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};

/// A `Logger` which serialises labeled job output into a single sink and fans it out to
/// subscribers.
///
/// This struct is actually an actor handle. The real work is done in the actor spawned by
/// `LogHandle::spawn`, so it can be cloned into every job task.
#[derive(Clone, Debug)]
pub struct LogHandle {
    sender: mpsc::UnboundedSender<Message>,
}

impl LogHandle {
    /// Must be called from within a tokio runtime.
    pub fn spawn<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (sender, inbox) = mpsc::unbounded_channel();
        Actor::spawn(inbox, writer);
        Self { sender }
    }

    pub fn stdout() -> Self {
        Self::spawn(tokio::io::stdout())
    }

    /// Discard the rendered log; subscribers still see every record.
    pub fn sink() -> Self {
        Self::spawn(tokio::io::sink())
    }

    pub fn record(&self, record: LogRecord) {
        let _ = self.sender.send(Message::Record { record });
    }

    /// Receive every record logged after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LogRecord> {
        let (subscriber, rx) = mpsc::unbounded_channel();
        let _ = self.sender.send(Message::Subscribe { subscriber });
        rx
    }

    /// Resolves once everything recorded before this call has been written out.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Message::Flush { response: tx }).is_ok() {
            let _ = rx.await;
        }
    }
}
