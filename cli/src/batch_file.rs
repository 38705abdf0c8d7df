//! Batches described in a TOML file.
//!
//! ```toml
//! [[jobs]]
//! label = "sim-a"
//! program = "python3"
//! args = ["simulation_variables_a.py"]
//! dir = "scripts"   # optional, relative to the batch file
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use batchlib::JobSpec;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

impl BatchFile {
    pub fn parse(content: &str) -> Result<Self> {
        let batch: BatchFile = toml::from_str(content).context("Failed to parse batch file")?;
        batch.validate()?;
        Ok(batch)
    }

    /// Load a batch file, resolving relative job directories against the file's own directory.
    pub fn load_from(path: &Path) -> Result<Vec<JobSpec>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        let batch = Self::parse(&content)
            .with_context(|| format!("Invalid batch file {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(batch.resolve(base))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (i, job) in self.jobs.iter().enumerate() {
            if job.program.is_empty() {
                bail!("job #{} ({:?}) has an empty program", i + 1, job.label);
            }
            if !seen.insert(job.label.as_str()) {
                tracing::warn!(label = %job.label, "duplicate job label, log output is ambiguous");
            }
        }
        Ok(())
    }

    fn resolve(self, base: &Path) -> Vec<JobSpec> {
        self.jobs
            .into_iter()
            .map(|mut job| {
                job.dir = job.dir.map(|dir| base.join(dir));
                job
            })
            .collect()
    }
}
