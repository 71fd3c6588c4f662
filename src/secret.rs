//! Scoped ownership of the batch password.
//!
//! A [`SecretHandle`] is the only owner of the password for the lifetime of a
//! batch. The value is wiped when the handle goes away, whichever way the
//! scope ends: normal return, an error bubbling through `?`, or a panic
//! unwinding through the caller.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ui::prompt::Interact;

const PASSWORD_PROMPT: &str = "Password:";
const CONFIRM_PROMPT: &str = "Retype password:";

/// A password read from the terminal.
///
/// Deliberately not `Clone`: there is exactly one owner, and dropping it
/// zeroizes the backing buffer.
pub struct Password {
    inner: SecretString,
}

impl Password {
    fn new(inner: SecretString) -> Self {
        #[cfg(test)]
        tracking::acquired();

        Self { inner }
    }

    #[cfg(test)]
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self::new(SecretString::from(value.to_owned()))
    }

    pub(crate) fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }

    fn matches(&self, other: &Self) -> bool {
        self.expose_secret().as_bytes().ct_eq(other.expose_secret().as_bytes()).into()
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        // `inner` zeroizes itself right after this runs.
        #[cfg(test)]
        tracking::released();
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Password([REDACTED])")
    }
}

/// Owns the batch password between acquisition and release.
#[derive(Debug)]
pub struct SecretHandle {
    password: Password,
}

impl SecretHandle {
    /// Prompts for a password and its confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mismatch`] when the two entries differ; both entries
    /// are wiped before the error is returned. Prompt failures propagate as-is.
    pub fn acquire<I: Interact + ?Sized>(prompt: &mut I) -> Result<Self> {
        let password = Password::new(prompt.read_password(PASSWORD_PROMPT)?);
        let confirmation = Password::new(prompt.read_password(CONFIRM_PROMPT)?);

        let matches = password.matches(&confirmation);
        drop(confirmation);

        if !matches {
            drop(password);
            debug!("password confirmation mismatch, both entries cleared");
            return Err(Error::Mismatch);
        }

        debug!("password acquired");
        Ok(Self { password })
    }

    /// Borrow of the held password, valid while the handle lives.
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Wipes the password now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }

    /// Runs `body` with a freshly acquired password and releases it afterwards.
    ///
    /// The prompt is handed back to `body` so it can keep asking questions
    /// while the password is held. The password is wiped before `body`'s
    /// result, success or error, is returned.
    pub fn scoped<I, T, F>(prompt: &mut I, body: F) -> Result<T>
    where
        I: Interact + ?Sized,
        F: FnOnce(&mut I, &Password) -> Result<T>,
    {
        let handle = Self::acquire(prompt)?;
        let outcome = body(prompt, handle.password());
        handle.release();
        outcome
    }
}

impl Drop for SecretHandle {
    fn drop(&mut self) {
        debug!("password released");
    }
}
