use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::Level;

use pdf_encrypt::config::{DEFAULT_OUTPUT_FOLDER, DEFAULT_SUFFIX, PDF_EXTENSION};
use pdf_encrypt::file::discover_pdfs;
use pdf_encrypt::ui::display::{print_banner, show_file_info, show_summary};
use pdf_encrypt::ui::prompt::Prompt;
use pdf_encrypt::{Batch, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Parser)]
#[command(name = "pdf-encrypt", version, about = "Password-protect PDF files with a single password.")]
pub struct App {
    /// PDF files or glob patterns. Without any, matching files are offered for selection.
    files: Vec<String>,

    /// Folder receiving the encrypted files; created if its parent exists.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FOLDER)]
    output_folder: PathBuf,

    /// Text inserted between the file name and its extension.
    #[arg(short, long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Keep the input file names unchanged.
    #[arg(long, conflicts_with = "suffix")]
    no_suffix: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Error)]
    log_level: LogLevel,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let subscriber = tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(Level::from(app.log_level))
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub fn execute(self) -> Result<()> {
        let mut prompt = Prompt::new();

        let batch = if self.files.is_empty() { Batch::from_paths(Self::pick_files(&prompt)?, self.output_folder) } else { Batch::new(self.files, self.output_folder) };
        let suffix = (!self.no_suffix).then_some(self.suffix);

        let batch = batch.with_suffix(suffix).with_progress(io::stderr().is_terminal());
        let report = batch.run(&mut prompt).context("batch encryption failed")?;

        show_summary(&report);

        Ok(())
    }

    fn pick_files(prompt: &Prompt) -> Result<Vec<PathBuf>> {
        print_banner();

        let files = discover_pdfs(Path::new("."));
        show_file_info(&files);

        let chosen = if files.is_empty() { Vec::new() } else { prompt.select_files(&files)? };
        if chosen.is_empty() {
            return Err(Error::NoInputFiles { patterns: format!("*.{PDF_EXTENSION}") }).context("nothing to encrypt");
        }

        Ok(chosen)
    }
}
