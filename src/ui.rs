// UI layer: provides a simple interactive menu using `dialoguer`.
// The functions are small and synchronous to make the flow easy to follow.

use crate::api::ApiClient;
use crate::token::TokenPrompt;
use crate::workbook;
use crate::workflow::{self, Summary};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

/// Asks the user to paste a refresh token copied from the web app.
pub struct TerminalPrompt;

impl TokenPrompt for TerminalPrompt {
    fn prompt_refresh_token(&mut self, login_url: &str) -> std::io::Result<String> {
        println!("Login by going to {} and copying the token", login_url);
        println!("Then paste it here:");
        let token: String = Input::new().with_prompt("Token").interact_text()?;
        Ok(token.trim().to_string())
    }
}

/// Main interactive menu. Runs a select loop until the user picks "Exit".
/// Errors from a single workflow are printed and the menu keeps going.
pub fn main_menu(api: &ApiClient) -> Result<()> {
    let items = vec![
        "Download patch data for a patient",
        "Run analysis on scans",
        "Exit",
    ];
    loop {
        let selection = Select::new().items(&items).default(0).interact()?;
        let outcome = match selection {
            0 => handle_download(api),
            1 => handle_analysis(api),
            _ => break,
        };
        if let Err(e) = outcome {
            println!("{} {:#}", "Error:".red(), e);
        }
    }
    Ok(())
}

/// Download every scan's patch data for one patient into a workbook.
fn handle_download(api: &ApiClient) -> Result<()> {
    let patient_id: String = Input::new().with_prompt("Enter patient ID").interact_text()?;
    let patient_id = patient_id.trim();

    let bar = progress_bar("Downloading");
    let download = workflow::download_patch_data(api, patient_id, &bar)?;

    let mut summary = download.summary;
    let out_file = workbook::output_path(&download.patient_id);
    if workbook::write_patch_workbook(&download.patches, &out_file)? {
        summary.output = Some(out_file);
    } else {
        println!("No patch data downloaded, nothing saved.");
    }
    print_summary(&summary);
    Ok(())
}

/// Trigger analysis for a comma-separated list of scan IDs.
fn handle_analysis(api: &ApiClient) -> Result<()> {
    let input: String = Input::new()
        .with_prompt("Enter scan IDs separated by commas")
        .interact_text()?;
    let scan_ids = workflow::parse_scan_ids(&input);
    if scan_ids.is_empty() {
        println!("No scan IDs given.");
        return Ok(());
    }

    let bar = progress_bar("Analyzing scans");
    let summary = workflow::run_analysis(api, &scan_ids, &bar);
    print_summary(&summary);
    Ok(())
}

fn progress_bar(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    // The template is a literal; fall back to the default style if it is
    // ever rejected.
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar
}

/// Summary block with the success count in green and failures in red.
fn print_summary(summary: &Summary) {
    let text = summary.to_string();
    for line in text.lines() {
        if line.starts_with("Succeeded") {
            println!("{}", line.to_string().green());
        } else if line.starts_with("Failed") && !summary.failed.is_empty() {
            println!("{}", line.to_string().red());
        } else {
            println!("{}", line);
        }
    }
}
