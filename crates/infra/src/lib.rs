//! Infrastructure layer: configuration, Redis queue, object storage, plan
//! data loading and the export job runner.

pub mod config;
pub mod export_runner;
#[cfg(feature = "redis")]
pub mod redis_queue;
pub mod source;
pub mod storage;

pub use config::{AppConfig, ConfigError, StorageConfig};
pub use export_runner::{ExportArtifact, ExportJobError, ExportJobRunner};
#[cfg(feature = "redis")]
pub use redis_queue::RedisQueue;
pub use source::{ExportSource, InMemoryExportSource, PostgresExportSource, SourceError};
pub use storage::{
    InMemoryObjectStorage, LocalObjectStorage, ObjectStorage, ObjectUrls, S3ObjectStorage,
    StorageError, storage_from_config,
};
