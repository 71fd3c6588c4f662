//! The batch loop: resolve inputs, acquire the password, encrypt each file.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::file::{FileTask, ensure_output_folder, expand_inputs, resolve_paths, validate_inputs};
use crate::pdf::{OutputDocument, SourceDocument};
use crate::secret::{Password, SecretHandle};
use crate::types::{BatchReport, Outcome};
use crate::ui::progress::Bar;
use crate::ui::prompt::{Interact, is_affirmative, overwrite_question};

/// Where a batch gets its files from.
#[derive(Debug, Clone)]
enum Inputs {
    /// Command-line arguments: literal paths or glob patterns.
    Arguments(Vec<String>),

    /// Paths already chosen by the user, taken as-is.
    Paths(Vec<PathBuf>),
}

/// One invocation's worth of work.
///
/// Every resolved file is written to `output_folder` under its own name,
/// optionally with a suffix spliced in before the extension.
#[derive(Debug, Clone)]
pub struct Batch {
    inputs: Inputs,
    output_folder: PathBuf,
    suffix: Option<String>,
    show_progress: bool,
}

impl Batch {
    /// Creates a batch over command-line arguments.
    ///
    /// # Arguments
    ///
    /// * `arguments` - Paths or glob patterns; an argument naming an existing
    ///   file is never expanded.
    /// * `output_folder` - Folder receiving the encrypted copies.
    pub fn new(arguments: Vec<String>, output_folder: impl Into<PathBuf>) -> Self {
        Self::with_inputs(Inputs::Arguments(arguments), output_folder.into())
    }

    /// Creates a batch over paths that need no expansion, such as the files
    /// picked in interactive mode.
    pub fn from_paths(paths: Vec<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        Self::with_inputs(Inputs::Paths(paths), output_folder.into())
    }

    fn with_inputs(inputs: Inputs, output_folder: PathBuf) -> Self {
        Self { inputs, output_folder, suffix: None, show_progress: false }
    }

    /// Sets the text inserted between each file stem and its extension.
    ///
    /// `None` keeps the input file names unchanged.
    pub fn with_suffix(mut self, suffix: Option<String>) -> Self {
        self.suffix = suffix;
        self
    }

    /// Shows a progress bar on stderr while files are processed.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs the batch to completion or to the first error.
    ///
    /// Inputs are resolved and validated before the password is asked for,
    /// so a bad argument never costs a prompt. The password lives only for
    /// the duration of the loop and is wiped on every exit path. Files
    /// written before a failure stay on disk.
    ///
    /// # Errors
    ///
    /// The first [`Error`] raised by expansion, validation, the prompt, the
    /// output folder, or any single file aborts the whole batch.
    pub fn run<I: Interact + ?Sized>(&self, prompt: &mut I) -> Result<BatchReport> {
        let inputs = match &self.inputs {
            Inputs::Arguments(arguments) => expand_inputs(arguments)?,
            Inputs::Paths(paths) => resolve_paths(paths.clone())?,
        };
        validate_inputs(&inputs)?;
        info!(files = inputs.len(), output_folder = %self.output_folder.display(), "starting batch");

        SecretHandle::scoped(prompt, |prompt, password| {
            ensure_output_folder(&self.output_folder)?;

            let mut report = BatchReport::default();
            let bar = Bar::new(inputs.len() as u64, self.show_progress);

            for input in &inputs {
                let task = FileTask::new(input, &self.output_folder, self.suffix.as_deref());
                bar.set_message(&task.input().file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default());

                if task.output().exists() && !bar.suspend(|| confirm_overwrite(prompt, &task))? {
                    warn!(output = %task.output().display(), "output exists, skipped");
                    report.record(Outcome::Skipped, task.output());
                    bar.add(1);
                    continue;
                }

                encrypt_file(&task, password)?;
                report.record(Outcome::Written, task.output());
                bar.add(1);
            }

            bar.finish();
            info!(written = report.written.len(), skipped = report.skipped.len(), "batch finished");
            Ok(report)
        })
    }
}

fn confirm_overwrite<I: Interact + ?Sized>(prompt: &mut I, task: &FileTask) -> Result<bool> {
    let answer = prompt.ask(&overwrite_question(task.output()))?;
    Ok(is_affirmative(&answer))
}

/// Copies every page of `task.input()` into a fresh document, encrypts it,
/// and writes it to `task.output()`.
#[tracing::instrument(skip_all, fields(input = %task.input().display(), output = %task.output().display()))]
fn encrypt_file(task: &FileTask, password: &Password) -> Result<()> {
    let source = SourceDocument::open(task.input())?;
    debug!(pages = source.page_count(), "source opened");

    let mut output = OutputDocument::derived_from(&source);
    for page in (0..source.page_count()).filter_map(|index| source.page(index)) {
        output.add_page(page)?;
    }

    if output.page_count() != source.page_count() {
        return Err(Error::Document { path: task.input().to_path_buf(), reason: "page tree could not be fully enumerated".to_owned() });
    }

    output.encrypt(password)?;
    output.write(task.output())?;
    info!("encrypted copy written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use lopdf::Document;
    use tempfile::tempdir;

    use super::*;
    use crate::pdf::write_sample_pdf;
    use crate::secret::tracking::live_passwords;
    use crate::ui::prompt::Scripted;

    fn arg(path: &Path) -> String {
        path.display().to_string()
    }

    fn decrypts_with(path: &Path, password: &str) -> bool {
        let Ok(mut doc) = Document::load(path) else { return false };
        doc.is_encrypted() && doc.decrypt(password).is_ok()
    }

    #[test]
    fn test_encrypts_every_matched_file() {
        let dir = tempdir().unwrap();
        write_sample_pdf(&dir.path().join("a.pdf"), 1);
        write_sample_pdf(&dir.path().join("b.pdf"), 2);
        let out = dir.path().join("out");

        let mut prompt = Scripted::new(&["s3cret", "s3cret"], &[]);
        let batch = Batch::new(vec![format!("{}/*.pdf", dir.path().display())], &out);
        let report = batch.run(&mut prompt).unwrap();

        assert_eq!(report.written, vec![out.join("a.pdf"), out.join("b.pdf")]);
        assert!(report.skipped.is_empty());
        assert!(decrypts_with(&out.join("a.pdf"), "s3cret"));
        assert!(decrypts_with(&out.join("b.pdf"), "s3cret"));
        assert!(!decrypts_with(&out.join("b.pdf"), "other"));
        assert_eq!(prompt.password_prompts, 2);
        assert!(prompt.questions.is_empty());
        assert_eq!(live_passwords(), 0);
    }

    #[test]
    fn test_named_file_wins_over_glob_lookalike() {
        let dir = tempdir().unwrap();
        let named = dir.path().join("report[1].pdf");
        write_sample_pdf(&named, 1);
        write_sample_pdf(&dir.path().join("report1.pdf"), 3);
        let out = dir.path().join("out");

        let mut prompt = Scripted::new(&["pw", "pw"], &[]);
        let report = Batch::new(vec![arg(&named)], &out).run(&mut prompt).unwrap();

        assert_eq!(report.written, vec![out.join("report[1].pdf")]);
        assert!(!out.join("report1.pdf").exists());

        let mut doc = Document::load(out.join("report[1].pdf")).unwrap();
        doc.decrypt("pw").unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_picked_paths_are_not_expanded() {
        let dir = tempdir().unwrap();
        let picked = dir.path().join("scan[a].pdf");
        write_sample_pdf(&picked, 1);
        write_sample_pdf(&dir.path().join("scana.pdf"), 2);
        let out = dir.path().join("out");

        let mut prompt = Scripted::new(&["pw", "pw"], &[]);
        let report = Batch::from_paths(vec![picked], &out).run(&mut prompt).unwrap();

        assert_eq!(report.written, vec![out.join("scan[a].pdf")]);
        assert!(!out.join("scana.pdf").exists());
    }

    #[test]
    fn test_suffix_is_spliced_into_output_name() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        write_sample_pdf(&input, 1);
        let out = dir.path().join("out");

        let mut prompt = Scripted::new(&["pw", "pw"], &[]);
        let batch = Batch::new(vec![arg(&input)], &out).with_suffix(Some("-encrypted".to_owned()));
        let report = batch.run(&mut prompt).unwrap();

        assert_eq!(report.written, vec![out.join("a-encrypted.pdf")]);
        assert!(decrypts_with(&out.join("a-encrypted.pdf"), "pw"));
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        write_sample_pdf(&input, 1);
        let out = dir.path().join("out");

        let mut prompt = Scripted::new(&["one", "two"], &[]);
        let result = Batch::new(vec![arg(&input)], &out).run(&mut prompt);

        assert!(matches!(result, Err(Error::Mismatch)));
        assert!(!out.exists());
        assert_eq!(live_passwords(), 0);
    }

    #[test]
    fn test_declined_overwrite_keeps_existing_file() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        write_sample_pdf(&first, 1);
        write_sample_pdf(&second, 1);
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("a.pdf"), b"keep me").unwrap();

        let mut prompt = Scripted::new(&["pw", "pw"], &["n"]);
        let report = Batch::new(vec![arg(&first), arg(&second)], &out).run(&mut prompt).unwrap();

        assert_eq!(fs::read(out.join("a.pdf")).unwrap(), b"keep me");
        assert_eq!(report.skipped, vec![out.join("a.pdf")]);
        assert_eq!(report.written, vec![out.join("b.pdf")]);
        assert_eq!(prompt.questions, vec!["a.pdf already exists. Overwrite? (Y/N)".to_owned()]);
    }

    #[test]
    fn test_accepted_overwrite_replaces_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        write_sample_pdf(&input, 2);
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("a.pdf"), b"stale").unwrap();

        let mut prompt = Scripted::new(&["pw", "pw"], &["Yes"]);
        let report = Batch::new(vec![arg(&input)], &out).run(&mut prompt).unwrap();

        assert_eq!(report.written, vec![out.join("a.pdf")]);
        assert!(decrypts_with(&out.join("a.pdf"), "pw"));
    }

    #[test]
    fn test_empty_answer_skips() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        write_sample_pdf(&input, 1);
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("a.pdf"), b"keep me").unwrap();

        let mut prompt = Scripted::new(&["pw", "pw"], &[""]);
        let report = Batch::new(vec![arg(&input)], &out).run(&mut prompt).unwrap();

        assert_eq!(report.skipped, vec![out.join("a.pdf")]);
        assert_eq!(fs::read(out.join("a.pdf")).unwrap(), b"keep me");
    }

    #[test]
    fn test_directory_input_rejected_before_prompt() {
        let dir = tempdir().unwrap();
        let mut prompt = Scripted::new(&["pw", "pw"], &[]);

        let result = Batch::new(vec![arg(dir.path())], dir.path().join("out")).run(&mut prompt);

        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert_eq!(prompt.password_prompts, 0);
    }

    #[test]
    fn test_no_matches_rejected_before_prompt() {
        let dir = tempdir().unwrap();
        let mut prompt = Scripted::new(&["pw", "pw"], &[]);

        let result = Batch::new(vec![format!("{}/*.pdf", dir.path().display())], dir.path().join("out")).run(&mut prompt);

        assert!(matches!(result, Err(Error::NoInputFiles { .. })));
        assert_eq!(prompt.password_prompts, 0);
    }

    #[test]
    fn test_bad_document_aborts_but_keeps_earlier_outputs() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("a.pdf");
        let bad = dir.path().join("b.pdf");
        let never = dir.path().join("c.pdf");
        write_sample_pdf(&good, 1);
        fs::write(&bad, b"not a pdf").unwrap();
        write_sample_pdf(&never, 1);
        let out = dir.path().join("out");

        let mut prompt = Scripted::new(&["pw", "pw"], &[]);
        let result = Batch::new(vec![arg(&good), arg(&bad), arg(&never)], &out).run(&mut prompt);

        assert!(matches!(result, Err(Error::Document { .. })));
        assert!(decrypts_with(&out.join("a.pdf"), "pw"));
        assert!(!out.join("b.pdf").exists());
        assert!(!out.join("c.pdf").exists());
        assert_eq!(live_passwords(), 0);
    }

    #[test]
    fn test_output_folder_with_missing_parent_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        write_sample_pdf(&input, 1);
        let out = dir.path().join("missing").join("out");

        let mut prompt = Scripted::new(&["pw", "pw"], &[]);
        let result = Batch::new(vec![arg(&input)], &out).run(&mut prompt);

        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(!out.exists());
        assert_eq!(live_passwords(), 0);
    }
}
