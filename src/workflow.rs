// Batch workflows. Both walk a list of scans one at a time, keep going when a
// single scan fails, and return a summary of what happened.

use crate::api::{ApiClient, Scan};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Server-side glob for the per-scan patch data export.
pub const PATCH_DATA_FILE: &str = "patch_data_*mm.csv";

const RULE_WIDTH: usize = 50;

/// One downloaded patch data CSV with the scan it belongs to.
#[derive(Debug, Clone)]
pub struct PatchData {
    pub scan: Scan,
    pub csv: Vec<u8>,
}

/// Counts and failed IDs for a finished batch.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub total: usize,
    pub failed: Vec<String>,
    pub elapsed: Option<Duration>,
    pub output: Option<PathBuf>,
}

impl Summary {
    pub fn succeeded(&self) -> usize {
        self.total.saturating_sub(self.failed.len())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{}", rule)?;
        if let Some(elapsed) = self.elapsed {
            writeln!(f, "Done in {:.2} seconds", elapsed.as_secs_f64())?;
        }
        if let Some(output) = &self.output {
            writeln!(f, "Saved to {}", output.display())?;
        }
        writeln!(f, "Succeeded {}/{} scans", self.succeeded(), self.total)?;
        writeln!(
            f,
            "Failed {}/{} scans: [{}]",
            self.failed.len(),
            self.total,
            self.failed.join(", ")
        )?;
        write!(f, "{}", rule)
    }
}

/// Result of `download_patch_data`.
#[derive(Debug)]
pub struct PatchDownload {
    pub patient_id: String,
    pub patches: Vec<PatchData>,
    pub summary: Summary,
}

/// Fetch the patch data CSV for every scan of `patient_id`.
///
/// A failed scan search aborts; a failed download only marks that scan.
pub fn download_patch_data(
    api: &ApiClient,
    patient_id: &str,
    progress: &ProgressBar,
) -> Result<PatchDownload> {
    let started = Instant::now();
    info!("Patient ID: {}", patient_id);
    let scans = api
        .search_scans(patient_id)
        .with_context(|| format!("Failed to list scans for patient {}", patient_id))?;
    info!("Found {} scans", scans.len());

    progress.set_length(scans.len() as u64);
    let mut patches = Vec::new();
    let mut failed = Vec::new();
    let total = scans.len();
    for scan in scans {
        let scan_id = scan.id.to_string();
        progress.set_message(format!("Downloading scan {}", scan_id));
        match api.scan_file(&scan_id, PATCH_DATA_FILE) {
            Ok(csv) => patches.push(PatchData { scan, csv }),
            Err(e) => {
                error!("Failed to download patch data for scan {}, skipping: {}", scan_id, e);
                failed.push(scan_id);
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(PatchDownload {
        patient_id: patient_id.to_string(),
        patches,
        summary: Summary {
            total,
            failed,
            elapsed: Some(started.elapsed()),
            output: None,
        },
    })
}

/// Trigger analysis for each ID in order.
pub fn run_analysis(api: &ApiClient, scan_ids: &[String], progress: &ProgressBar) -> Summary {
    let started = Instant::now();
    progress.set_length(scan_ids.len() as u64);
    let mut failed = Vec::new();
    for scan_id in scan_ids {
        progress.set_message(format!("Analyzing scan {}", scan_id));
        if let Err(e) = api.analyze(scan_id) {
            error!("Failed to analyze scan {}: {}", scan_id, e);
            failed.push(scan_id.clone());
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Summary {
        total: scan_ids.len(),
        failed,
        elapsed: Some(started.elapsed()),
        output: None,
    }
}

/// Split a comma-separated list of scan IDs, trimming each and dropping
/// empty entries.
pub fn parse_scan_ids(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
