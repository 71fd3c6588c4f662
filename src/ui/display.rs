//! Display utilities for file lists and batch results.

use std::fs;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::style;
use figlet_rs::FIGfont;

use crate::config::APP_NAME;
use crate::types::{BatchReport, Outcome};

/// Prints the application banner, falling back to plain text.
pub fn print_banner() {
    let banner = match FIGfont::standard() {
        Ok(font) => font.convert(APP_NAME).map_or_else(|| APP_NAME.to_owned(), |figure| figure.to_string()),
        Err(_) => APP_NAME.to_owned(),
    };

    println!("{}", style(banner).green().bold());
}

/// Renders the candidate files with their sizes.
pub fn file_table(files: &[PathBuf]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(vec!["No", "Name", "Size"]);

    for (i, path) in files.iter().enumerate() {
        let size = fs::metadata(path).map_or_else(|_| "unknown".to_owned(), |meta| ByteSize::b(meta.len()).to_string());
        table.add_row(vec![(i + 1).to_string(), path.display().to_string(), size]);
    }

    table
}

/// Prints the file table, or a notice when there is nothing to show.
pub fn show_file_info(files: &[PathBuf]) {
    if files.is_empty() {
        println!("{}", style("No PDF files found").yellow());
        return;
    }

    println!();
    println!("{} {}", style("✓").green(), style(format!("Found {} file(s):", files.len())).bold());
    println!("{}", file_table(files));
    println!();
}

/// One status line for one output file.
pub fn show_outcome(outcome: Outcome, path: &Path) {
    let marker = match outcome {
        Outcome::Written => style("✓").green(),
        Outcome::Skipped => style("•").yellow(),
    };

    println!("{marker} {}", style(format!("{outcome}: {}", path.display())).bold());
}

/// Lists every output of the run followed by a count line.
pub fn show_summary(report: &BatchReport) {
    println!();
    for (outcome, path) in report.entries() {
        show_outcome(outcome, path);
    }

    println!("{} encrypted, {} skipped", style(report.written.len()).green().bold(), style(report.skipped.len()).yellow().bold());
}
