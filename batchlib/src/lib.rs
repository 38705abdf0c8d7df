mod actors;
pub mod errors;
mod events;
pub mod log;
mod supervisor;
pub mod types;

pub use actors::worker::{JobHandle, OutputEvents};
pub use errors::{JobError, SpawnError, StreamError};
pub use events::{JobExit, JobStatus, Output, StreamKind, LOST_CODE, SPAWN_FAILURE_CODE};
pub use log::{LogHandle, LogRecord};
pub use supervisor::{BatchResult, JobReport, Supervisor};
pub use types::JobSpec;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;

    fn sh(label: &str, script: &str) -> JobSpec {
        JobSpec::new(label, "sh", ["-c", script])
    }

    /// Run a batch against a silent log and capture every record it produced.
    async fn run_captured(specs: Vec<JobSpec>) -> (BatchResult, Vec<LogRecord>) {
        let log = LogHandle::sink();
        let mut records = log.subscribe();
        let supervisor = Supervisor::new(log);
        let result = supervisor.run(specs).await;
        drop(supervisor);
        (result, drain(&mut records).await)
    }

    async fn drain(records: &mut mpsc::UnboundedReceiver<LogRecord>) -> Vec<LogRecord> {
        let mut out = vec![];
        while let Some(record) = records.recv().await {
            out.push(record);
        }
        out
    }

    fn for_label<'a>(records: &'a [LogRecord], label: &str) -> Vec<&'a LogRecord> {
        records.iter().filter(|r| r.label() == label).collect()
    }

    fn text_of(records: &[&LogRecord]) -> String {
        let mut bytes = vec![];
        for record in records {
            if let LogRecord::Chunk { output, .. } = record {
                bytes.extend_from_slice(output.blob());
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// every job logs exactly one exit record, after all of its chunks
    fn assert_exit_last(records: &[LogRecord], label: &str) {
        let own = for_label(records, label);
        let exits = own.iter().filter(|r| r.is_exit()).count();
        assert_eq!(exits, 1, "{} should log exactly one exit", label);
        assert!(own.last().unwrap().is_exit(), "{} logged output after exit", label);
    }

    #[tokio::test]
    async fn basic() {
        let (result, records) = run_captured(vec![
            JobSpec::new("L1", "echo", ["hello"]),
            JobSpec::new("L2", "false", Vec::<String>::new()),
        ])
        .await;

        let expected: BTreeMap<_, _> = [("L1".to_string(), 0), ("L2".to_string(), 1)].into();
        assert_eq!(result.exit_codes(), expected);

        let l1 = for_label(&records, "L1");
        assert!(text_of(&l1).contains("hello"));
        assert_exit_last(&records, "L1");

        let l2 = for_label(&records, "L2");
        assert_eq!(l2.len(), 1);
        assert!(matches!(
            l2[0],
            LogRecord::Exit {
                status: JobStatus::Exited { code: 1 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn spawn_failure_does_not_stop_siblings() {
        let (result, records) = run_captured(vec![
            sh("first", "echo one"),
            JobSpec::new("broken", "/no/such/executable", Vec::<String>::new()),
            sh("last", "echo three"),
        ])
        .await;

        assert_eq!(result.len(), 3);
        assert!(result.get("first").unwrap().status.is_success());
        assert!(result.get("last").unwrap().status.is_success());
        let broken = result.get("broken").unwrap();
        assert_eq!(broken.status, JobStatus::SpawnFailed);
        assert_eq!(broken.code(), SPAWN_FAILURE_CODE);
        assert_eq!(broken.chunks, 0);
        assert_eq!(result.failures().count(), 1);

        let broken_records = for_label(&records, "broken");
        assert_eq!(broken_records.len(), 1);
        assert!(matches!(
            broken_records[0],
            LogRecord::Exit {
                status: JobStatus::SpawnFailed,
                detail: Some(_),
                ..
            }
        ));
        assert_eq!(records.iter().filter(|r| r.is_exit()).count(), 3);
    }

    #[tokio::test]
    async fn chunks_precede_exit() {
        let (result, records) = run_captured(vec![
            sh("A", "printf x; exit 0"),
            sh("B", "printf y; exit 1"),
            sh("C", "printf a; sleep 0.1; printf b >&2; sleep 0.1; printf c"),
        ])
        .await;

        for label in ["A", "B", "C"] {
            assert_exit_last(&records, label);
            let report = result.get(label).unwrap();
            let logged = for_label(&records, label).len() - 1;
            assert_eq!(report.chunks, logged);
        }
        assert_eq!(text_of(&for_label(&records, "A")), "x");
        assert_eq!(text_of(&for_label(&records, "B")), "y");
        assert_eq!(text_of(&for_label(&records, "C")), "abc");
        assert!(for_label(&records, "C").iter().any(|r| matches!(
            r,
            LogRecord::Chunk { output: Output::Stderr(_), .. }
        )));
        assert_eq!(result.get("C").unwrap().bytes, 3);
    }

    #[tokio::test]
    async fn trailing_output_is_not_dropped() {
        let (result, records) = run_captured(vec![sh(
            "fast",
            "i=0; while [ $i -lt 200 ]; do echo line $i; i=$((i+1)); done; exit 3",
        )])
        .await;

        assert_eq!(result.get("fast").unwrap().code(), 3);
        let text = text_of(&for_label(&records, "fast"));
        assert_eq!(text.lines().count(), 200);
        assert!(text.ends_with("line 199\n"));
        assert_exit_last(&records, "fast");
    }

    #[tokio::test]
    async fn signal_is_not_collapsed() {
        let (result, _) = run_captured(vec![sh("killed", "kill -TERM $$")]).await;
        let report = result.get("killed").unwrap();
        assert_eq!(report.status, JobStatus::Killed { signal: 15 });
        assert_eq!(report.code(), -15);
    }

    #[tokio::test]
    async fn slow_job_does_not_block_fast_one() {
        let (_, records) = run_captured(vec![
            sh("slow", "sleep 1; echo late"),
            sh("fast", "echo early"),
        ])
        .await;

        let position = |label: &str| {
            records
                .iter()
                .position(|r| r.is_exit() && r.label() == label)
                .unwrap()
        };
        assert!(position("fast") < position("slow"));
    }

    #[tokio::test]
    async fn duplicate_labels_are_tolerated() {
        let (result, records) = run_captured(vec![sh("dup", "exit 0"), sh("dup", "exit 5")]).await;
        assert_eq!(result.len(), 2);
        assert_eq!(result.reports()[0].code(), 0);
        assert_eq!(result.reports()[1].code(), 5);
        assert_ne!(result.reports()[0].id, result.reports()[1].id);
        assert_eq!(records.iter().filter(|r| r.is_exit()).count(), 2);
    }

    #[tokio::test]
    async fn empty_batch() {
        let (result, records) = run_captured(vec![]).await;
        assert!(result.is_empty());
        assert!(result.all_succeeded());
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn reruns_agree() {
        let specs = vec![
            sh("ok", "echo fine"),
            sh("bad", "echo nope >&2; exit 7"),
            JobSpec::new("gone", "/no/such/executable", Vec::<String>::new()),
        ];
        let supervisor = Supervisor::new(LogHandle::sink());
        let first = supervisor.run(specs.clone()).await;
        let second = supervisor.run(specs).await;
        assert_eq!(first.exit_codes(), second.exit_codes());
        assert_eq!(first.exit_codes()["bad"], 7);
    }

    #[tokio::test]
    async fn run_waits_for_every_job() {
        let specs: Vec<JobSpec> = (0..8)
            .map(|i| sh(&format!("job{}", i), &format!("sleep 0.{}; exit {}", i, i)))
            .collect();
        let (result, records) = run_captured(specs).await;
        assert_eq!(result.len(), 8);
        assert!(result.reports().iter().all(|r| r.status.is_terminal()));
        assert_eq!(records.iter().filter(|r| r.is_exit()).count(), 8);
        for (i, report) in result.reports().iter().enumerate() {
            assert_eq!(report.label, format!("job{}", i));
            assert_eq!(report.code(), i as i32);
        }
    }
}
