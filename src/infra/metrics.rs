// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per epoch and phase.
//
// Output file: graphs/<model_name>_metrics.csv
//
//   epoch,phase,loss,accuracy,precision,recall,f1
//   1,train,0.412300,0.311000,0.602000,0.480000,0.534000
//   1,val,0.398100,0.334000,0.615000,0.502000,0.552800
//   ...
//
// The file is recreated at the start of every training run.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::metrics::PhaseMetrics;

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create (or truncate) the CSV and write its header row.
    pub fn create(dir: impl AsRef<Path>, model_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join(format!("{model_name}_metrics.csv"));
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,phase,loss,accuracy,precision,recall,f1")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one row. `epoch` is 1-based.
    pub fn log(&self, epoch: usize, phase: &str, m: &PhaseMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            epoch, phase, m.loss, m.accuracy, m.precision, m.recall, m.f1,
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
