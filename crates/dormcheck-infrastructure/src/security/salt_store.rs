use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-installation key-derivation salt, kept in `<data_dir>/.salt`
pub struct SaltStore {
    path: PathBuf,
}

impl SaltStore {
    pub const FILE_NAME: &'static str = ".salt";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    /// Read the salt, creating it on first run
    pub fn load_or_create(&self) -> Result<[u8; 32], SaltError> {
        if self.path.exists() {
            return self.load();
        }

        let mut salt = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut salt);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SaltError::Io(self.describe(e)))?;
        }
        fs::write(&self.path, salt).map_err(|e| SaltError::Io(self.describe(e)))?;
        restrict_permissions(&self.path);

        tracing::info!("Generated new encryption salt at {}", self.path.display());
        Ok(salt)
    }

    fn load(&self) -> Result<[u8; 32], SaltError> {
        let bytes = fs::read(&self.path).map_err(|e| SaltError::Io(self.describe(e)))?;

        bytes
            .as_slice()
            .try_into()
            .map_err(|_| SaltError::Corrupt(bytes.len()))
    }

    fn describe(&self, err: std::io::Error) -> String {
        format!("{}: {err}", self.path.display())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Could not restrict salt file permissions: {}", e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[derive(Debug, thiserror::Error)]
pub enum SaltError {
    #[error("Salt file I/O failed: {0}")]
    Io(String),

    #[error("Salt file holds {0} bytes, expected 32")]
    Corrupt(usize),
}
