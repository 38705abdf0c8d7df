use crate::log::LogRecord;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum Message {
    Record {
        record: LogRecord,
    },
    Subscribe {
        subscriber: mpsc::UnboundedSender<LogRecord>,
    },
    Flush {
        response: oneshot::Sender<()>,
    },
}
