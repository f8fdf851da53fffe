use crate::config::StoreConfig;
use crate::dataset::append_line;
use crate::errors::StorageError;
use object_store::{ObjectStore, PutPayload, aws::AmazonS3Builder, path::Path as ObjectPath};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs;
use tracing::{debug, info};

/// Where the dataset lives. Reads and writes always move the whole file or object.
#[derive(Debug, Clone)]
pub enum DatasetStore {
    Local { path: PathBuf },
    Object {
        store: Arc<dyn ObjectStore>,
        bucket: String,
        key: ObjectPath,
    },
}

impl DatasetStore {
    /// Buckets are reached through S3; credentials and region are taken from the `AWS_*`
    /// environment the way the AWS tooling reads them.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StorageError> {
        match config {
            StoreConfig::Local(path) => Ok(Self::Local { path: path.clone() }),
            StoreConfig::Object { bucket, key } => {
                let s3 = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|source| StorageError::Object {
                        location: format!("s3://{bucket}/{key}"),
                        source,
                    })?;
                Ok(Self::object(Arc::new(s3), bucket, key))
            }
        }
    }

    pub fn object(store: Arc<dyn ObjectStore>, bucket: &str, key: &str) -> Self {
        Self::Object {
            store,
            bucket: bucket.to_string(),
            key: ObjectPath::from(key),
        }
    }

    pub async fn read(&self) -> Result<String, StorageError> {
        match self {
            Self::Local { path } => fs::read_to_string(path)
                .await
                .map_err(|source| StorageError::Read {
                    path: path.clone(),
                    source,
                }),
            Self::Object { store, key, .. } => {
                let bytes = store
                    .get(key)
                    .await
                    .map_err(|source| self.object_error(source))?
                    .bytes()
                    .await
                    .map_err(|source| self.object_error(source))?;
                String::from_utf8(bytes.to_vec()).map_err(|_| StorageError::NotUtf8 {
                    location: self.to_string(),
                })
            }
        }
    }

    pub async fn write(&self, contents: String) -> Result<(), StorageError> {
        match self {
            Self::Local { path } => write_replacing(path, contents).await,
            Self::Object { store, key, .. } => {
                let result = store
                    .put(key, PutPayload::from(contents.into_bytes()))
                    .await
                    .map_err(|source| self.object_error(source))?;
                debug!(e_tag = ?result.e_tag, store = %self, "uploaded dataset object");
                Ok(())
            }
        }
    }

    /// Read-modify-write append. The new content is only built in memory; if the final write
    /// fails the stored copy is left as it was.
    pub async fn append_line(&self, line: &str) -> Result<(), StorageError> {
        let existing = self.read().await?;
        debug!(bytes = existing.len(), store = %self, "read existing dataset");
        let updated = append_line(&existing, line);
        self.write(updated).await?;
        info!(store = %self, "appended dataset row");
        Ok(())
    }

    fn object_error(&self, source: object_store::Error) -> StorageError {
        StorageError::Object {
            location: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for DatasetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::Object { bucket, key, .. } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

/// Writes beside the target and renames over it, so readers see the old or the new file.
async fn write_replacing(path: &Path, contents: String) -> Result<(), StorageError> {
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).await.map_err(write_err)?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(write_err(err));
    }
    Ok(())
}
