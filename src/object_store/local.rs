use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

use super::{ObjectReader, ObjectStore, ObjectStoreError};

/// Object store backed by the local upload directory.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    /// Open the store, creating the directory if it is absent.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to a path directly inside the base directory.
    /// Anything that is not a single plain file name is rejected.
    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !key.contains('\\') => {
                Ok(self.base_path.join(name))
            }
            _ => Err(ObjectStoreError::InvalidKey(key.to_string())),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn open(&self, key: &str) -> Result<ObjectReader, ObjectStoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let source = self.object_path(from)?;
        let target = self.object_path(to)?;
        if !source.exists() {
            return Err(ObjectStoreError::NotFound(from.to_string()));
        }
        tokio::fs::copy(&source, &target).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}
