//! Dotenv-style credentials file shared by every command.
//!
//! The file holds `KEY=VALUE` lines. Only [`ACCESS_KEY_VAR`] and
//! [`TOKEN_VAR`] are interpreted; every other line, comments included, is
//! preserved verbatim when the token is rewritten.

use std::{fmt, io};

use camino::{Utf8Path, Utf8PathBuf};
use carpark_fs::{read_optional_text, replace_text};
use log::info;
use thiserror::Error;

/// Variable holding the URA access key.
pub const ACCESS_KEY_VAR: &str = "URA_ACCESS_KEY";
/// Variable holding the daily URA token.
pub const TOKEN_VAR: &str = "URA_TOKEN";
/// Default credentials file location.
pub const DEFAULT_CREDENTIALS_FILE: &str = ".env";

/// Errors raised while reading or writing the credentials file.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// The file exists but could not be read.
    #[error("failed to read credentials from {path}: {source}")]
    Read {
        /// Location of the credentials file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file could not be rewritten.
    #[error("failed to write credentials to {path}: {source}")]
    Write {
        /// Location of the credentials file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Values read from the credentials file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    /// `URA_ACCESS_KEY`, when present and non-empty.
    pub access_key: Option<String>,
    /// `URA_TOKEN`, when present and non-empty.
    pub token: Option<String>,
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Handle on a credentials file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsFile {
    path: Utf8PathBuf,
}

impl Default for CredentialsFile {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_FILE)
    }
}

impl CredentialsFile {
    /// Refer to the credentials file at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the stored credentials. A missing file yields empty values.
    pub fn load(&self) -> Result<StoredCredentials, CredentialsError> {
        let contents = self.read()?.unwrap_or_default();
        let mut credentials = StoredCredentials::default();
        for (key, value) in contents.lines().filter_map(parse_assignment) {
            let value = Some(value).filter(|value| !value.is_empty()).map(str::to_owned);
            match key {
                ACCESS_KEY_VAR => credentials.access_key = value,
                TOKEN_VAR => credentials.token = value,
                _ => {}
            }
        }
        Ok(credentials)
    }

    /// Store `token`, replacing any existing token line in place.
    ///
    /// All other lines are kept as they are. When no token line exists one
    /// is appended; a missing file is created.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8PathBuf;
    /// use carpark_data::credentials::CredentialsFile;
    ///
    /// let dir = tempfile::tempdir().expect("temp dir");
    /// let path = Utf8PathBuf::from_path_buf(dir.path().join(".env")).expect("utf-8 path");
    /// std::fs::write(&path, "URA_ACCESS_KEY=key\nURA_TOKEN=old\nOTHER=1\n").expect("seed");
    ///
    /// let file = CredentialsFile::new(path.clone());
    /// file.persist_token("fresh").expect("persist");
    ///
    /// let contents = std::fs::read_to_string(&path).expect("read");
    /// assert_eq!(contents, "URA_ACCESS_KEY=key\nURA_TOKEN=fresh\nOTHER=1\n");
    /// ```
    pub fn persist_token(&self, token: &str) -> Result<(), CredentialsError> {
        let contents = self.read()?.unwrap_or_default();
        let updated = rewrite_token(&contents, token);
        replace_text(&self.path, &updated).map_err(|source| CredentialsError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!("stored new token in {}", self.path);
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, CredentialsError> {
        read_optional_text(&self.path).map_err(|source| CredentialsError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// Split `KEY=VALUE`, tolerating an `export ` prefix and surrounding quotes.
fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = assignment.split_once('=')?;
    Some((key.trim(), unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(value)
}

fn rewrite_token(contents: &str, token: &str) -> String {
    let replacement = format!("{TOKEN_VAR}={token}");
    let mut replaced = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| match parse_assignment(line) {
            Some((TOKEN_VAR, _)) => {
                replaced = true;
                replacement.clone()
            }
            _ => line.to_owned(),
        })
        .collect();
    if !replaced {
        lines.push(replacement);
    }
    let mut rewritten = lines.join("\n");
    rewritten.push('\n');
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_file() -> (TempDir, CredentialsFile) {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join(".env")).expect("utf-8 path");
        (dir, CredentialsFile::new(path))
    }

    #[rstest]
    #[case("URA_TOKEN=old\n", "URA_TOKEN=new\n")]
    #[case("A=1\n# note\nURA_TOKEN=old\nB=2", "A=1\n# note\nURA_TOKEN=new\nB=2\n")]
    #[case("A=1\n", "A=1\nURA_TOKEN=new\n")]
    #[case("", "URA_TOKEN=new\n")]
    #[case("export URA_TOKEN=\"old\"\n", "URA_TOKEN=new\n")]
    fn token_line_is_rewritten(#[case] before: &str, #[case] after: &str) {
        assert_eq!(rewrite_token(before, "new"), after);
    }

    #[rstest]
    fn similarly_named_keys_are_untouched() {
        let rewritten = rewrite_token("URA_TOKEN_BACKUP=keep\n", "new");
        assert_eq!(rewritten, "URA_TOKEN_BACKUP=keep\nURA_TOKEN=new\n");
    }

    #[rstest]
    fn load_reads_known_keys(temp_file: (TempDir, CredentialsFile)) {
        let (_guard, file) = temp_file;
        std::fs::write(
            file.path(),
            "# credentials\nexport URA_ACCESS_KEY='key-1'\nURA_TOKEN=\nFIREBASE_JSON=x.json\n",
        )
        .expect("seed");
        let credentials = file.load().expect("load");
        assert_eq!(credentials.access_key.as_deref(), Some("key-1"));
        assert_eq!(credentials.token, None);
    }

    #[rstest]
    fn missing_file_loads_empty_and_persist_creates_it(temp_file: (TempDir, CredentialsFile)) {
        let (_guard, file) = temp_file;
        assert_eq!(file.load().expect("load"), StoredCredentials::default());
        file.persist_token("abc").expect("persist");
        assert_eq!(file.load().expect("reload").token.as_deref(), Some("abc"));
    }
}
