use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to store upload: {0}")]
    Write(#[from] io::Error),
}

/// Writes uploads into a private directory for the classifiers to read.
#[derive(Clone, Debug)]
pub struct ScopedImageStore {
    dir: PathBuf,
}

/// Handle to one stored upload. The file is removed on `release` or drop,
/// whichever comes first.
#[derive(Debug)]
pub struct ScopedImage {
    path: PathBuf,
    released: bool,
}

impl ScopedImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `extension` carries its leading dot, as returned by the validator.
    pub async fn acquire(
        &self,
        content: &[u8],
        extension: &str,
    ) -> Result<ScopedImage, StorageError> {
        let path = self.dir.join(format!("{}{}", Uuid::new_v4(), extension));

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        // The guard exists before the first byte lands, so a failed write
        // removes the partial file on the way out.
        let image = ScopedImage {
            path,
            released: false,
        };
        file.write_all(content).await?;
        file.flush().await?;

        log::debug!("Stored upload at {} ({} bytes)", image.path.display(), content.len());
        Ok(image)
    }
}

impl ScopedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Released upload {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for ScopedImage {
    fn drop(&mut self) {
        self.release();
    }
}
