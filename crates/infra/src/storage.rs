//! Object storage for generated export artifacts.
//!
//! Objects are addressed by slash-separated keys such as
//! `exports/<workspaceId>/<repairPlanId>.zip`. A put either stores the whole
//! object or nothing.
//!
//! With `S3_BUCKET` set, objects go to that bucket; otherwise they are
//! written under `STORAGE_DIR`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key `{0}`")]
    InvalidKey(String),

    #[error("storage configuration error: {0}")]
    Config(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous object. Returns the
    /// object's URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<String, StorageError>;
}

/// URL scheme for stored objects.
///
/// `<public_url>/<key>` when a public prefix is configured, otherwise
/// `<endpoint>/<bucket>/<key>` with whichever parts are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrls {
    base: String,
}

impl ObjectUrls {
    pub fn new(public_url: Option<&str>, endpoint: Option<&str>, bucket: Option<&str>) -> Self {
        let base = match public_url {
            Some(public) => public.trim_end_matches('/').to_string(),
            None => {
                let mut base = endpoint.unwrap_or_default().trim_end_matches('/').to_string();
                if let Some(bucket) = bucket {
                    base.push('/');
                    base.push_str(bucket.trim_matches('/'));
                }
                base
            }
        };
        Self { base }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.public_url.as_deref(),
            config.endpoint.as_deref(),
            config.bucket.as_deref(),
        )
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base, key)
    }
}

/// Reject keys that are empty, absolute, or escape the storage root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidKey(key.to_string());

    if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
        return Err(invalid());
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(invalid());
    }
    if !Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(invalid());
    }
    Ok(())
}

/// Objects stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    urls: ObjectUrls,
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, urls: ObjectUrls) -> Self {
        Self {
            root: root.into(),
            urls,
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let path = self.path_for(key);
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        tokio::fs::create_dir_all(dir).await?;

        // Write beside the target then rename, so readers never see a partial file.
        let tmp = dir.join(format!(
            ".{}.{}.partial",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(key, content_type, bytes = bytes.len(), "object stored");
        Ok(self.urls.url_for(key))
    }
}

/// Objects stored in an S3-compatible bucket.
#[derive(Debug)]
pub struct S3ObjectStorage {
    store: Arc<dyn ObjectStore>,
    urls: ObjectUrls,
}

impl S3ObjectStorage {
    pub fn new(store: Arc<dyn ObjectStore>, urls: ObjectUrls) -> Self {
        Self { store, urls }
    }

    /// Client for `S3_BUCKET` at `S3_ENDPOINT` (AWS when unset), signed with
    /// the configured region and credentials.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .as_deref()
            .ok_or_else(|| StorageError::Config("S3_BUCKET is not set".to_string()))?;

        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(key_id) = &config.access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }

        Ok(Self::new(Arc::new(builder.build()?), ObjectUrls::from_config(config)))
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        let location =
            ObjectPath::parse(key).map_err(|_| StorageError::InvalidKey(key.to_string()))?;
        let size = bytes.len();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            attributes,
            ..PutOptions::default()
        };
        self.store
            .put_opts(&location, PutPayload::from(bytes), opts)
            .await?;

        debug!(key, content_type, bytes = size, "object uploaded");
        Ok(self.urls.url_for(key))
    }
}

/// Pick the backend for this deployment: the bucket when one is configured,
/// the local directory otherwise.
pub fn storage_from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    if config.bucket.is_some() {
        info!(
            bucket = config.bucket.as_deref().unwrap_or_default(),
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "using S3 object storage"
        );
        return Ok(Arc::new(S3ObjectStorage::from_config(config)?));
    }

    info!(dir = %config.local_dir.display(), "using local object storage");
    Ok(Arc::new(LocalObjectStorage::new(
        config.local_dir.clone(),
        ObjectUrls::from_config(config),
    )))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object storage (tests/dev).
#[derive(Debug)]
pub struct InMemoryObjectStorage {
    urls: ObjectUrls,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStorage {
    pub fn new(urls: ObjectUrls) -> Self {
        Self {
            urls,
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryObjectStorage {
    fn default() -> Self {
        Self::new(ObjectUrls::new(Some("memory://objects"), None, None))
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        self.objects.lock().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.urls.url_for(key))
    }
}
