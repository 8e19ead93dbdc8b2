use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8PathBuf as PathBuf;
use chrono::{DateTime, Utc};
use eyre::{eyre, Context, Result};

/// Abstraction for storing uploaded model files in any backing store.
/// This interface is basically a blob store, where every object has
/// a `key` used to store and retrieve it.
/// Keys are flat file names (see [`asset_file_key`]), so that `LocalFileStorage`
/// can use them as paths inside its root without any fuss.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Writes a new object. Fails if an object with this key already exists.
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;
    /// Removing an object that does not exist is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
}

pub type Storage = Arc<dyn StorageProvider>;

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: PathBuf) -> LocalFileStorage {
        LocalFileStorage { root }
    }

    /// Creates the root directory if it does not exist yet.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .wrap_err_with(|| format!("error creating storage directory {}", self.root))
    }

    pub fn root(&self) -> &camino::Utf8Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(eyre!("invalid storage key {:?}", key));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageProvider for LocalFileStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        use tokio::io::AsyncWriteExt;
        let path = self.path_for(key)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .await
            .wrap_err("error opening file for writing")?;
        file.write_all(data)
            .await
            .wrap_err("error writing file")?;
        file.flush().await.wrap_err("error writing file")?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).wrap_err("error removing file"),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .wrap_err("error checking if path exists")
    }
}

/// Storage key for a newly uploaded file: upload time in unix millis,
/// followed by the original file name with anything that is not safe in a
/// file name or URL path replaced by `_`.
pub fn asset_file_key(uploaded_at: DateTime<Utc>, original_file_name: &str) -> String {
    let base_name = original_file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_file_name);
    let sanitized: String = base_name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    format!("{}_{}", uploaded_at.timestamp_millis(), sanitized)
}

/// Path under which stored files are publicly served.
pub const PUBLIC_FILES_PATH: &str = "/files/assets/";

/// Maps storage keys to the public URLs stored in asset records, and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrls {
    base_url: String,
}

impl PublicUrls {
    pub fn new(base_url: &str) -> PublicUrls {
        PublicUrls {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}{}", self.base_url, PUBLIC_FILES_PATH, key)
    }

    /// Recovers the storage key from a public URL by cutting everything up to
    /// and including [`PUBLIC_FILES_PATH`], so records created under a
    /// different base URL still resolve.
    pub fn key_from_public_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let (_, key) = url.split_once(PUBLIC_FILES_PATH)?;
        match key.is_empty() {
            true => None,
            false => Some(key),
        }
    }
}
