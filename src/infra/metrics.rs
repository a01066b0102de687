// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per optimiser iteration.
//
// Columns:
//   - iteration:     L-BFGS iteration number (1, 2, 3, ...)
//   - objective:     regularised log-likelihood (should rise)
//   - gradient_norm: ‖∇‖ of the objective (should fall to ~0)
//   - step:          accepted line-search step length
//
// Output file: <output_dir>/metrics.csv
//
// Example CSV output:
//   iteration,objective,gradient_norm,step
//   1,-41.271209,12.004311,0.083304
//   2,-30.917554,5.128832,1.000000
//   ...
//
// The header is written only when the file is new, so repeated
// runs into the same directory append to one log.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::trainer::IterationMetrics;

const HEADER: &str = "iteration,objective,gradient_norm,step";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory if needed and write the header if the
    /// CSV does not exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &IterationMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.iteration, m.objective, m.gradient_norm, m.step,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(iteration: usize) -> IterationMetrics {
        IterationMetrics { iteration, objective: -1.5, gradient_norm: 0.25, step: 1.0 }
    }

    #[test]
    fn test_rows_follow_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&metrics(1)).unwrap();
        logger.log(&metrics(2)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,-1.500000,0.250000,1.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_second_logger_appends() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap().log(&metrics(1)).unwrap();
        MetricsLogger::new(dir.path()).unwrap().log(&metrics(1)).unwrap();

        let csv = fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().filter(|l| *l == HEADER).count(), 1);
        assert_eq!(csv.lines().count(), 3);
    }
}
