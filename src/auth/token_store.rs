//! Credential persistence.

use super::{AuthError, Credential};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the authorized credential lives between runs.
pub trait TokenStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Credential>, AuthError>;
    fn save(&self, credential: &Credential) -> Result<(), AuthError>;
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Credential>, AuthError> {
        if !self.path.exists() {
            debug!("No credential at {}", self.path.display());
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let credential = serde_json::from_str(&content)?;
        Ok(Some(credential))
    }

    fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(credential)?;
        write_private(&self.path, content.as_bytes())?;

        debug!("Saved credential to {}", self.path.display());
        Ok(())
    }
}

/// Owner-only file: restricted before any byte of the credential lands in it.
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    // An existing file keeps its old mode through open
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content)
}
