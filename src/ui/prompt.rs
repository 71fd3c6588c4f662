//! Interactive prompts.
//!
//! The batch processor talks to the terminal only through the [`Interact`]
//! trait, so the whole pipeline can be driven by a script in tests.

use std::path::{Path, PathBuf};

use inquire::validator::Validation;
use inquire::{CustomUserError, InquireError, MultiSelect, PasswordDisplayMode, Text};
use secrecy::SecretString;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Terminal interactions needed by a batch run.
pub trait Interact {
    /// Reads a password without echoing it.
    ///
    /// Implementations must hand the value over already wrapped; no plain copy
    /// may outlive the call.
    fn read_password(&mut self, message: &str) -> Result<SecretString>;

    /// Asks a free-form question with echoed input and returns the raw answer.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Prompt handler backed by `inquire`.
#[derive(Default)]
pub struct Prompt;

impl Prompt {
    /// Creates a prompt handler reading from the controlling terminal.
    pub fn new() -> Self {
        Self
    }

    /// Lets the user pick any number of files from `files`.
    ///
    /// # Arguments
    ///
    /// * `files` - Candidates, shown in the given order.
    ///
    /// # Returns
    ///
    /// The chosen paths in the order they were listed, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prompt`] when the terminal is unavailable or the
    /// user cancels the selection.
    pub fn select_files(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let names: Vec<String> = files.iter().map(|path| path.display().to_string()).collect();

        let chosen = MultiSelect::new("Select files to encrypt", names).raw_prompt().map_err(prompt_error)?;

        Ok(chosen.into_iter().map(|option| files[option.index].clone()).collect())
    }
}

impl Interact for Prompt {
    fn read_password(&mut self, message: &str) -> Result<SecretString> {
        let mut raw = inquire::Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Hidden)
            .with_validator(|input: &str| -> std::result::Result<Validation, CustomUserError> {
                if input.trim().is_empty() {
                    Ok(Validation::Invalid("password cannot be empty or whitespace only".into()))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt()
            .map_err(prompt_error)?;

        // An exact-size copy keeps the boxed secret from reallocating; the
        // prompt's own buffer is wiped right after.
        let secret = SecretString::from(raw.as_str().to_owned());
        raw.zeroize();

        Ok(secret)
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        Text::new(question).prompt().map_err(prompt_error)
    }
}

/// Question shown when an output file is about to be replaced.
pub fn overwrite_question(path: &Path) -> String {
    let filename = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    format!("{filename} already exists. Overwrite? (Y/N)")
}

/// Only answers starting with `y` or `Y` count as consent.
pub fn is_affirmative(answer: &str) -> bool {
    answer.chars().next().is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

fn prompt_error(err: InquireError) -> Error {
    Error::Prompt { reason: err.to_string() }
}

/// Replays canned passwords and answers instead of reading the terminal.
#[cfg(test)]
pub(crate) struct Scripted {
    passwords: std::collections::VecDeque<&'static str>,
    answers: std::collections::VecDeque<&'static str>,
    pub password_prompts: usize,
    pub questions: Vec<String>,
}

#[cfg(test)]
impl Scripted {
    pub fn new(passwords: &[&'static str], answers: &[&'static str]) -> Self {
        Self { passwords: passwords.iter().copied().collect(), answers: answers.iter().copied().collect(), password_prompts: 0, questions: Vec::new() }
    }
}

#[cfg(test)]
impl Interact for Scripted {
    fn read_password(&mut self, _message: &str) -> Result<SecretString> {
        self.password_prompts += 1;
        self.passwords.pop_front().map(|p| SecretString::from(p.to_owned())).ok_or_else(|| Error::Prompt { reason: "no scripted password left".to_owned() })
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_owned());
        self.answers.pop_front().map(str::to_owned).ok_or_else(|| Error::Prompt { reason: "no scripted answer left".to_owned() })
    }
}
