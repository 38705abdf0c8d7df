use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Launch a batch of simulation scripts and log their output
#[derive(Debug, Parser)]
#[clap(name = "simbatch", version)]
pub struct ArgParser {
    /// Interpreter used to run preset scripts
    #[clap(
        long,
        global = true,
        env = "SIMBATCH_INTERPRETER",
        default_value = "python3"
    )]
    pub interpreter: String,
    /// Exit with a failure status if any job does not exit with code 0
    #[clap(long, global = true, env = "SIMBATCH_STRICT")]
    pub strict: bool,
    /// The sub-command to use
    #[clap(subcommand)]
    pub sub_command: SubCommand,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum SubCommand {
    /// run the random-round1 simulations, one job per range
    #[clap(name = "random-round1")]
    RandomRound1 {
        #[clap(long, default_value = "./simulation-scripts/random-round1")]
        /// directory holding the simulation_random_<lo>-<hi>.py scripts
        dir: PathBuf,
    },
    /// run the simulation_variables_<a..h>.py scripts
    Variables {
        #[clap(long, default_value = ".")]
        /// directory holding the scripts
        dir: PathBuf,
    },
    /// run the jobs described in a TOML batch file
    Run {
        /// path to the batch file
        file: PathBuf,
    },
    /// run a single command as a batch of one
    Exec {
        #[clap(long)]
        /// label for the log, defaults to the program name
        label: Option<String>,

        #[clap(required = true, last = true)]
        /// the program followed by its arguments
        command: Vec<String>,
    },
}
