mod arg_parser;
mod batch_file;
mod presets;

use arg_parser::{ArgParser, SubCommand};
use batch_file::BatchFile;

use anyhow::{Context, Result};
use batchlib::{BatchResult, JobSpec, LogHandle, Supervisor};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // diagnostics go to stderr, stdout carries the job log
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = ArgParser::parse();
    let strict = args.strict;
    match run(args, LogHandle::stdout()).await {
        Ok(result) if strict && !result.all_succeeded() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Run the batch selected on the command line. Job failures are data, not errors.
async fn run(args: ArgParser, log: LogHandle) -> Result<BatchResult> {
    let specs = match args.sub_command {
        SubCommand::RandomRound1 { dir } => presets::random_round1(&args.interpreter, &dir),
        SubCommand::Variables { dir } => presets::variables(&args.interpreter, &dir),
        SubCommand::Run { file } => BatchFile::load_from(&file)?,
        SubCommand::Exec { label, command } => vec![exec_spec(label, command)?],
    };

    let result = Supervisor::new(log).run(specs).await;
    for report in result.failures() {
        tracing::info!(label = %report.label, status = ?report.status, "job did not succeed");
    }
    Ok(result)
}

fn exec_spec(label: Option<String>, command: Vec<String>) -> Result<JobSpec> {
    let mut command = command.into_iter();
    let program = command.next().context("no command given")?;
    let label = label.unwrap_or_else(|| {
        Path::new(&program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone())
    });
    Ok(JobSpec::new(label, program, command))
}
