//! S3-compatible object storage helper.
//!
//! This crate provides:
//! - Reference-image upload for image-to-video jobs
//! - Presigned URL generation
//! - Best-effort object cleanup

pub mod client;
pub mod error;

pub use client::{StorageClient, StorageConfig, UploadedReference, REFERENCE_URL_TTL};
pub use error::{StorageError, StorageResult};
