// Credential store: keeps the session cookie header in a small JSON file.
//
// The cookie is written as plaintext JSON (`{"cookie": "..."}`) with
// owner-only permissions. There is no keychain and no encryption, so the
// file must be treated like a password.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "solutions_search_cli";
const STORE_FILE: &str = "auth.json";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no saved cookie at {0}")]
    NotFound(PathBuf),
    #[error("malformed auth store {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("auth store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct StoredCookie {
    #[serde(default)]
    cookie: String,
}

/// Location of the saved cookie file. Built once per run and passed to
/// whoever needs to read or write the credential.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    /// Use the explicit override when given, otherwise the default path.
    pub fn resolve(override_path: Option<PathBuf>) -> Self {
        match override_path {
            Some(path) => Self::new(path),
            None => Self::new(default_path()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the cookie header, replacing any previous file.
    pub fn save(&self, secret: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_private_dir(parent).map_err(|source| self.io_err(source))?;
            }
        }
        let mut contents = serde_json::to_string(&StoredCookie {
            cookie: secret.to_string(),
        })
        .map_err(|err| self.io_err(err.into()))?;
        contents.push('\n');

        let mut file = open_private(&self.path).map_err(|source| self.io_err(source))?;
        file.write_all(contents.as_bytes())
            .map_err(|source| self.io_err(source))?;
        Ok(())
    }

    /// Read the cookie header back, trimmed.
    pub fn load(&self) -> Result<String, StoreError> {
        let data = fs::read_to_string(&self.path).map_err(|source| self.read_err(source))?;
        let stored: StoredCookie =
            serde_json::from_str(&data).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;
        Ok(stored.cookie.trim().to_string())
    }

    pub fn delete(&self) -> Result<(), StoreError> {
        fs::remove_file(&self.path).map_err(|source| self.read_err(source))
    }

    fn read_err(&self, source: io::Error) -> StoreError {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(self.path.clone())
        } else {
            self.io_err(source)
        }
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// `<config dir>/solutions_search_cli/auth.json`, falling back to the home
/// directory and then the current directory.
pub fn default_path() -> PathBuf {
    let dir = dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(APP_DIR).join(STORE_FILE)
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten files that already existed.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}
