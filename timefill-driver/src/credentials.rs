//! Password lookup for the SSO login.
//!
//! Sources are tried in order: the `TIMEFILL_PASSWORD` environment variable, the OS
//! keyring, then an interactive prompt. A source that errors is skipped with a warning.

use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const PASSWORD_ENV: &str = "TIMEFILL_PASSWORD";
pub const KEYRING_SERVICE: &str = "timefill";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("keyring lookup failed")]
    Keyring(#[from] keyring::Error),
    #[error("reading the password failed")]
    Io(#[from] io::Error),
    #[error("no password available for `{user}`")]
    Missing { user: String },
}

/// One place a password may come from.
pub trait CredentialSource {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this source has nothing for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source itself fails.
    fn password(&mut self, user: &str) -> Result<Option<String>, CredentialError>;
}

/// Reads the password from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSource {
    var: String,
}

impl EnvSource {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new(PASSWORD_ENV)
    }
}

impl CredentialSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn password(&mut self, _user: &str) -> Result<Option<String>, CredentialError> {
        Ok(std::env::var(&self.var).ok().and_then(non_empty))
    }
}

/// Reads the password stored for the user under a keyring service.
#[derive(Debug, Clone)]
pub struct KeyringSource {
    service: String,
}

impl KeyringSource {
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringSource {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl CredentialSource for KeyringSource {
    fn name(&self) -> &'static str {
        "keyring"
    }

    fn password(&mut self, user: &str) -> Result<Option<String>, CredentialError> {
        let entry = keyring::Entry::new(&self.service, user)?;
        match entry.get_password() {
            Ok(pw) => Ok(non_empty(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Asks for the password on `output` and reads one line from `input`.
pub struct PromptSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSource<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptSource<io::StdinLock<'static>, io::Stderr> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> CredentialSource for PromptSource<R, W> {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn password(&mut self, user: &str) -> Result<Option<String>, CredentialError> {
        writeln!(self.output, "Please enter the SSO password for {user}.")?;
        write!(self.output, "Password: ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(non_empty(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// First password any source yields for `user`.
///
/// # Errors
///
/// Returns [`CredentialError::Missing`] when every source is empty or failed.
pub fn resolve_password(
    user: &str,
    sources: &mut [&mut dyn CredentialSource],
) -> Result<String, CredentialError> {
    for source in sources.iter_mut() {
        match source.password(user) {
            Ok(Some(password)) => {
                log::debug!("Using password from {}", source.name());
                return Ok(password);
            }
            Ok(None) => {}
            Err(err) => log::warn!("{} credential source failed: {err}", source.name()),
        }
    }
    Err(CredentialError::Missing {
        user: user.to_string(),
    })
}

/// Look up `user`'s password from the environment, the keyring, then stdin.
///
/// # Errors
///
/// Returns [`CredentialError::Missing`] when no source produced a password.
pub fn get_password(user: &str) -> Result<String, CredentialError> {
    let mut env = EnvSource::default();
    let mut keyring = KeyringSource::default();
    let mut prompt = PromptSource::stdio();
    resolve_password(user, &mut [&mut env, &mut keyring, &mut prompt])
}
