use super::messages::Message;
use crate::log::LogRecord;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::warn;

/// Sole owner of the log sink. Records are written one at a time, so lines from different jobs
/// never interleave mid-record.
pub struct Actor<W> {
    inbox: mpsc::UnboundedReceiver<Message>,
    writer: W,
    subscribers: Vec<mpsc::UnboundedSender<LogRecord>>,
}

impl<W> Actor<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub fn spawn(inbox: mpsc::UnboundedReceiver<Message>, writer: W) {
        let actor = Actor {
            inbox,
            writer,
            subscribers: Vec::new(),
        };
        tokio::spawn(async move { actor.run().await });
    }

    async fn run(mut self) {
        use self::Message::*;
        while let Some(msg) = self.inbox.recv().await {
            match msg {
                Record { record } => self.record(record).await,
                Subscribe { subscriber } => self.subscribers.push(subscriber),
                Flush { response } => {
                    if let Err(e) = self.writer.flush().await {
                        warn!(error = %e, "failed to flush job log");
                    }
                    let _ = response.send(());
                }
            }
        }
        let _ = self.writer.flush().await;
    }

    async fn record(&mut self, record: LogRecord) {
        if let Err(e) = self.writer.write_all(&record.render()).await {
            warn!(error = %e, label = record.label(), "failed to write job log");
        }
        // only retain subscribers who have not dropped
        self.subscribers.retain(|sub| sub.send(record.clone()).is_ok());
    }
}
