//! The fixed script tables the simulations are normally run with.

use batchlib::JobSpec;
use std::path::Path;

/// random-round1 splits its input into 60 wide ranges, the last one stretching to 1001.
const RANDOM_ROUND1_RANGES: u32 = 17;
const RANDOM_ROUND1_STEP: u32 = 60;
const RANDOM_ROUND1_END: u32 = 1001;

/// One job per `simulation_random_<lo>-<hi>.py` script, 0-60 through 960-1001.
pub fn random_round1(interpreter: &str, dir: &Path) -> Vec<JobSpec> {
    (0..RANDOM_ROUND1_RANGES)
        .map(|i| {
            let lo = i * RANDOM_ROUND1_STEP;
            let hi = if i + 1 == RANDOM_ROUND1_RANGES {
                RANDOM_ROUND1_END
            } else {
                lo + RANDOM_ROUND1_STEP
            };
            script_job(
                interpreter,
                dir,
                format!("simulation_random_{}-{}.py", lo, hi),
            )
        })
        .collect()
}

/// One job per variable set, `simulation_variables_a.py` through `_h.py`.
pub fn variables(interpreter: &str, dir: &Path) -> Vec<JobSpec> {
    ('a'..='h')
        .map(|set| script_job(interpreter, dir, format!("simulation_variables_{}.py", set)))
        .collect()
}

fn script_job(interpreter: &str, dir: &Path, script: String) -> JobSpec {
    let path = dir.join(&script).to_string_lossy().into_owned();
    JobSpec::new(script, interpreter, [path])
}
