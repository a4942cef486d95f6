// ============================================================
// Layer 6 - Estimate Report
// ============================================================
// Appends illuminant estimates to a CSV file so runs over many
// images can be inspected or plotted later.
//
// One row per stage plus one row for the combined estimate:
//   source,stage,r,g,b
//   img_001.png,1,0.612300,0.581100,0.536200
//   img_001.png,2,...
//   img_001.png,combined,...

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::illuminant::{CascadeEstimate, Illuminant};

const HEADER: &str = "source,stage,r,g,b";

pub struct EstimateReport {
    csv_path: PathBuf,
}

impl EstimateReport {
    /// Open (or create) the report. The header is written only for a new
    /// file so repeated runs append to the same table.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();
        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create report '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created estimate report '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, estimate: &CascadeEstimate) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open report '{}'", self.csv_path.display()))?;

        for (i, stage) in estimate.stages.iter().enumerate() {
            write_row(&mut f, &estimate.source, &(i + 1).to_string(), stage)?;
        }
        write_row(&mut f, &estimate.source, "combined", &estimate.combined())?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn write_row(f: &mut impl Write, source: &str, stage: &str, illum: &Illuminant) -> Result<()> {
    // Commas in file names would split the column
    let source = source.replace(',', "_");
    writeln!(f, "{source},{stage},{:.6},{:.6},{:.6}", illum.r, illum.g, illum.b)?;
    Ok(())
}
