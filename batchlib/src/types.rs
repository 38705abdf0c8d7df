use serde::Deserialize;
use std::path::PathBuf;
use uuid::Uuid;

pub type Program = String;
pub type Args = Vec<String>;
pub type Label = String;
pub type Dir = PathBuf;
pub type JobId = Uuid;
pub type OutputBlob = bytes::Bytes;

/// Static description of one job in a batch.
///
/// The label is only used to attribute log output. Duplicate labels within a batch are
/// tolerated, they just make the log ambiguous.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct JobSpec {
    pub label: Label,
    pub program: Program,
    #[serde(default)]
    pub args: Args,
    /// working directory for the child, inherited from the supervisor when absent
    #[serde(default)]
    pub dir: Option<Dir>,
}

impl JobSpec {
    pub fn new<L, P, I, A>(label: L, program: P, args: I) -> Self
    where
        L: Into<Label>,
        P: Into<Program>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            label: label.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<Dir>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}
