// CSV to XLSX conversion: every downloaded scan becomes one worksheet.

use crate::workflow::PatchData;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Output file name for a patient, e.g. `patient_12_patch_data.xlsx`.
pub fn output_path(patient_id: &str) -> PathBuf {
    let safe: String = patient_id
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    PathBuf::from(format!("patient_{}_patch_data.xlsx", safe))
}

/// Worksheet name for a scan, made acceptable to Excel.
pub fn sheet_name(scan_id: &str) -> String {
    format!("Scan {}", scan_id)
        .chars()
        .filter(|c| !FORBIDDEN_SHEET_CHARS.contains(c))
        .take(MAX_SHEET_NAME)
        .collect()
}

/// One value to place on a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// Cell at (row, column).
pub type PlacedCell = (u32, u16, Cell);

pub fn build_workbook(patches: &[PatchData]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let mut used = HashSet::new();
    for patch in patches {
        let scan_id = patch.scan.id.to_string();
        let cells = plan_cells(&patch.csv)
            .with_context(|| format!("Failed to convert patch data for scan {}", scan_id))?;
        let name = unique_sheet_name(&sheet_name(&scan_id), &mut used);
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(name)
            .with_context(|| format!("Invalid sheet name for scan {}", scan_id))?;
        apply_cells(sheet, &cells)
            .with_context(|| format!("Failed to write sheet for scan {}", scan_id))?;
    }
    Ok(workbook)
}

/// Write all patches to `path`. Nothing is written when `patches` is empty.
pub fn write_patch_workbook(patches: &[PatchData], path: &Path) -> Result<bool> {
    if patches.is_empty() {
        return Ok(false);
    }
    let mut workbook = build_workbook(patches)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(true)
}

/// Excel compares sheet names case-insensitively, so a clash gets a
/// ` (2)`, ` (3)`, ... suffix, shortening the base to stay within 31 chars.
fn unique_sheet_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while !used.insert(name.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        name = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    name
}

/// Lay out a CSV the way a dataframe export does: header in row 0, one row
/// per record, and column 0 holding the 0-based record index under a blank
/// header. Short rows are allowed; their missing cells stay blank.
pub fn plan_cells(csv_bytes: &[u8]) -> Result<Vec<PlacedCell>> {
    let text = std::str::from_utf8(csv_bytes).context("Patch data is not valid UTF-8")?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut cells = Vec::new();
    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    for (col, header) in headers.iter().enumerate() {
        if !header.is_empty() {
            cells.push((0, column(col + 1)?, Cell::Text(header.to_string())));
        }
    }

    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad CSV record {}", index))?;
        let row = u32::try_from(index + 1).context("Too many rows for a worksheet")?;
        cells.push((row, 0, Cell::Number(index as f64)));
        for (col, value) in record.iter().enumerate() {
            if let Some(cell) = parse_cell(value) {
                cells.push((row, column(col + 1)?, cell));
            }
        }
    }
    Ok(cells)
}

fn parse_cell(value: &str) -> Option<Cell> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(value.to_string()),
    })
}

fn apply_cells(sheet: &mut Worksheet, cells: &[PlacedCell]) -> Result<()> {
    for (row, col, cell) in cells {
        match cell {
            Cell::Number(n) => sheet.write_number(*row, *col, *n)?,
            Cell::Text(s) => sheet.write_string(*row, *col, s)?,
        };
    }
    Ok(())
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).context("Too many columns for a worksheet")
}
