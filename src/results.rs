use crate::model::Allocation;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub(crate) struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn append(&self, level: u64, allocation: &Allocation) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(f, "{}", format_line(level, allocation))
            .with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }
}

pub(crate) fn format_line(level: u64, allocation: &Allocation) -> String {
    format!("Level {level}: {allocation}")
}
