use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// On-disk storage for profile images.
///
/// Each avatar is a single flat file at `{dir}/{key}`; the key carries the
/// image extension so the content type survives a round trip.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Avatar storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        fs::write(self.file_path(key), data).await?;
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.file_path(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Avatar {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
