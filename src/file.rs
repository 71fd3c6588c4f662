//! Input expansion, validation, and output naming.
//!
//! Everything that touches paths before a PDF is opened lives here: turning
//! command-line arguments into a list of files, rejecting unusable inputs,
//! mapping each input to its output location, and preparing the output folder.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fast_glob::glob_match;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::{EXCLUDED_PATTERNS, GLOB_META_CHARS, PDF_EXTENSION};
use crate::error::{Error, Result};

/// One input-to-output mapping processed by the batch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    input: PathBuf,
    output: PathBuf,
}

impl FileTask {
    /// Maps `input` into `output_folder`, splicing `suffix` into the name when given.
    pub fn new(input: impl Into<PathBuf>, output_folder: &Path, suffix: Option<&str>) -> Self {
        let input = input.into();
        let output = output_folder.join(output_file_name(&input, suffix));
        Self { input, output }
    }

    #[inline]
    pub fn input(&self) -> &Path {
        &self.input
    }

    #[inline]
    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Builds the output file name for `input`.
///
/// With a suffix the result is `stem + suffix + "." + extension` (or
/// `stem + suffix` for inputs without an extension); without one the input's
/// own file name is reused.
pub fn output_file_name(input: &Path, suffix: Option<&str>) -> OsString {
    let Some(suffix) = suffix else {
        return input.file_name().map(OsStr::to_os_string).unwrap_or_default();
    };

    let mut name = input.file_stem().map(OsStr::to_os_string).unwrap_or_default();
    name.push(suffix);

    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }

    name
}

/// Resolves command-line arguments to a list of candidate files.
///
/// An argument naming an existing path is taken literally, even when it
/// contains glob characters. Other arguments containing glob characters are
/// expanded against the filesystem in sorted order; anything else is taken
/// literally and checked later by [`validate_inputs`]. Duplicates are
/// dropped, first occurrence wins.
///
/// # Errors
///
/// Returns [`Error::NoInputFiles`] when nothing is left after expansion.
pub fn expand_inputs<S: AsRef<str>>(arguments: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for argument in arguments.iter().map(AsRef::as_ref) {
        if is_pattern(argument) && !Path::new(argument).exists() {
            let matches = expand_pattern(argument);
            debug!(pattern = argument, matches = matches.len(), "expanded input pattern");
            paths.extend(matches);
        } else {
            paths.push(PathBuf::from(argument));
        }
    }

    let patterns = arguments.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(", ");
    resolved(paths, patterns)
}

/// Accepts paths that were already chosen, such as picker selections.
///
/// Nothing is expanded; duplicates are dropped, first occurrence wins.
///
/// # Errors
///
/// Returns [`Error::NoInputFiles`] when `paths` is empty.
pub fn resolve_paths(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    resolved(paths, "no files selected".to_owned())
}

fn resolved(mut paths: Vec<PathBuf>, patterns: String) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    paths.retain(|path| seen.insert(path.clone()));

    if paths.is_empty() {
        return Err(Error::NoInputFiles { patterns });
    }

    debug!("{} input file(s) resolved", paths.len());
    Ok(paths)
}

#[inline]
fn is_pattern(argument: &str) -> bool {
    argument.contains(GLOB_META_CHARS)
}

fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let normalized = pattern.replace('\\', "/");
    let normalized = normalized.strip_prefix("./").unwrap_or(&normalized);

    // Walk from the longest literal prefix, only as deep as the pattern reaches.
    let segments: Vec<&str> = normalized.split('/').collect();
    let literal = segments.iter().take_while(|segment| !is_pattern(segment)).count();
    let root = if literal == 0 { PathBuf::from(".") } else { PathBuf::from(segments[..literal].join("/")) };

    let mut walker = WalkDir::new(&root).min_depth(1).sort_by_file_name();
    if !segments[literal..].contains(&"**") {
        walker = walker.max_depth(segments.len() - literal);
    }

    walker
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| {
            let candidate = entry.path().to_string_lossy().replace('\\', "/");
            let candidate = candidate.strip_prefix("./").unwrap_or(&candidate);
            glob_match(normalized, candidate)
        })
        .map(DirEntry::into_path)
        .collect()
}

/// Checks that every path is an existing, readable regular file.
///
/// Runs before any password prompt so a typo never costs the user a secret.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for the first offending path.
pub fn validate_inputs(paths: &[PathBuf]) -> Result<()> {
    paths.iter().try_for_each(|path| validate_input(path))
}

fn validate_input(path: &Path) -> Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::invalid_input(path, "file not found")),
        Err(e) => return Err(Error::invalid_input(path, e.to_string())),
    };

    if meta.is_dir() {
        return Err(Error::invalid_input(path, "path is a directory, but it needs to be a file"));
    }

    if !meta.is_file() {
        return Err(Error::invalid_input(path, "not a regular file"));
    }

    fs::File::open(path).map_err(|e| Error::invalid_input(path, format!("file is not readable: {e}")))?;

    Ok(())
}

/// Creates the output folder if it does not exist yet.
///
/// Only the last path component is created. A folder whose parent is also
/// missing is reported as an I/O failure rather than built recursively.
///
/// # Errors
///
/// Returns [`Error::Io`] when the folder cannot be created.
pub fn ensure_output_folder(folder: &Path) -> Result<()> {
    if folder.as_os_str().is_empty() || folder.is_dir() {
        return Ok(());
    }

    fs::create_dir(folder).map_err(Error::io(folder))?;
    info!(folder = %folder.display(), "created output folder");

    Ok(())
}

/// Lists PDF files below `root` for the interactive picker.
///
/// Hidden entries and the directories in [`EXCLUDED_PATTERNS`] are skipped.
pub fn discover_pdfs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !(is_hidden(entry.file_name()) || is_excluded(entry.file_name())))
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

#[inline]
fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_excluded(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    EXCLUDED_PATTERNS.iter().any(|pattern| glob_match(pattern, &*name))
}

#[inline]
fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"%PDF-1.4\n").unwrap();
    }

    #[test]
    fn test_output_file_name_with_suffix() {
        assert_eq!(output_file_name(Path::new("a.pdf"), Some("-encrypted")), "a-encrypted.pdf");
        assert_eq!(output_file_name(Path::new("dir/report.v2.PDF"), Some("_locked")), "report.v2_locked.PDF");
        assert_eq!(output_file_name(Path::new("notes"), Some("-encrypted")), "notes-encrypted");
    }

    #[test]
    fn test_output_file_name_without_suffix() {
        assert_eq!(output_file_name(Path::new("a.pdf"), None), "a.pdf");
        assert_eq!(output_file_name(Path::new("in/scans/b.pdf"), None), "b.pdf");
    }

    #[test]
    fn test_file_task_joins_output_folder() {
        let task = FileTask::new("in/a.pdf", Path::new("out"), Some("-encrypted"));
        assert_eq!(task.input(), Path::new("in/a.pdf"));
        assert_eq!(task.output(), Path::new("out/a-encrypted.pdf"));

        let task = FileTask::new("in/a.pdf", Path::new("out"), None);
        assert_eq!(task.output(), Path::new("out/a.pdf"));
    }

    #[test]
    fn test_expand_pattern_sorted() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("test2.pdf"));
        touch(&dir.path().join("test1.pdf"));
        touch(&dir.path().join("other.pdf"));
        touch(&dir.path().join("nested/test3.pdf"));

        let pattern = format!("{}/test*.pdf", dir.path().display());
        let paths = expand_inputs(&[pattern]).unwrap();

        assert_eq!(paths, vec![dir.path().join("test1.pdf"), dir.path().join("test2.pdf")]);
    }

    #[test]
    fn test_expand_recursive_pattern() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.pdf"));
        touch(&dir.path().join("nested/deeper/b.pdf"));

        let pattern = format!("{}/**/*.pdf", dir.path().display());
        let paths = expand_inputs(&[pattern]).unwrap();

        assert!(paths.contains(&dir.path().join("nested/deeper/b.pdf")));
    }

    #[test]
    fn test_expand_literal_and_dedup() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("test1.pdf"));

        let literal = dir.path().join("test1.pdf").display().to_string();
        let pattern = format!("{}/*.pdf", dir.path().display());
        let missing = dir.path().join("missing.pdf").display().to_string();

        let paths = expand_inputs(&[literal.clone(), pattern, missing.clone()]).unwrap();
        assert_eq!(paths, vec![PathBuf::from(literal), PathBuf::from(missing)]);
    }

    #[test]
    fn test_expand_nothing_matches() {
        let dir = tempdir().unwrap();
        let pattern = format!("{}/*.pdf", dir.path().display());

        let result = expand_inputs(&[pattern]);
        assert!(matches!(result, Err(Error::NoInputFiles { .. })));

        let empty: [&str; 0] = [];
        assert!(matches!(expand_inputs(&empty), Err(Error::NoInputFiles { .. })));
    }

    #[test]
    fn test_existing_path_with_glob_characters_is_literal() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("report[1].pdf"));
        touch(&dir.path().join("report1.pdf"));

        let literal = dir.path().join("report[1].pdf").display().to_string();
        let paths = expand_inputs(&[literal]).unwrap();

        assert_eq!(paths, vec![dir.path().join("report[1].pdf")]);
    }

    #[test]
    fn test_resolve_paths_dedups_without_expanding() {
        let picked = PathBuf::from("a[1].pdf");
        let paths = resolve_paths(vec![picked.clone(), PathBuf::from("b.pdf"), picked.clone()]).unwrap();
        assert_eq!(paths, vec![picked, PathBuf::from("b.pdf")]);

        assert!(matches!(resolve_paths(Vec::new()), Err(Error::NoInputFiles { .. })));
    }

    #[test]
    fn test_validate_inputs() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.pdf");
        touch(&file);

        assert!(validate_inputs(std::slice::from_ref(&file)).is_ok());

        let result = validate_inputs(&[file.clone(), dir.path().to_path_buf()]);
        assert!(matches!(result, Err(Error::InvalidInput { path, .. }) if path == dir.path()));

        let missing = dir.path().join("missing.pdf");
        let result = validate_inputs(std::slice::from_ref(&missing));
        assert!(matches!(result, Err(Error::InvalidInput { reason, .. }) if reason == "file not found"));
    }

    #[test]
    fn test_ensure_output_folder_one_level() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("out");

        ensure_output_folder(&folder).unwrap();
        assert!(folder.is_dir());

        // Existing folders are left alone.
        ensure_output_folder(&folder).unwrap();
    }

    #[test]
    fn test_ensure_output_folder_not_recursive() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("missing/out");

        let result = ensure_output_folder(&folder);
        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_discover_pdfs_filters() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.pdf"));
        touch(&dir.path().join("docs/B.PDF"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join(".hidden.pdf"));
        touch(&dir.path().join("target/c.pdf"));
        touch(&dir.path().join(".git/d.pdf"));

        let found = discover_pdfs(dir.path());
        assert_eq!(found, vec![dir.path().join("a.pdf"), dir.path().join("docs/B.PDF")]);
    }
}
