//! Bucket holding uploaded attachments. Every object lives under
//! [`ATTACHMENT_PREFIX`] and is served inline with its original content type.

use std::time::Duration;

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;

pub const ATTACHMENT_PREFIX: &str = "uploads";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Object key for attachment `id`, e.g. `uploads/<id>.png`.
pub fn attachment_key(id: Uuid, ext: &str) -> String {
    format!("{ATTACHMENT_PREFIX}/{id}.{}", ext.trim_start_matches('.'))
}

/// Media type without parameters, lowercased. Unparseable input becomes
/// `application/octet-stream`.
pub fn normalize_content_type(raw: &str) -> String {
    let essence = raw.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() && !sub.contains('/') => {
            essence.to_ascii_lowercase()
        }
        _ => FALLBACK_CONTENT_TYPE.to_string(),
    }
}

fn ensure_attachment_key(key: &str) -> anyhow::Result<()> {
    match key.strip_prefix(ATTACHMENT_PREFIX) {
        Some(rest) if rest.len() > 1 && rest.starts_with('/') => Ok(()),
        _ => anyhow::bail!("{key} is not an attachment key"),
    }
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Writes the body under [`attachment_key`] and returns that key.
    async fn store(
        &self,
        id: Uuid,
        ext: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
    /// Time-limited GET link for a stored attachment.
    async fn download_url(&self, key: &str, ttl: Duration) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct S3AttachmentStore {
    client: Client,
    bucket: String,
}

impl S3AttachmentStore {
    /// MinIO-compatible client: static credentials and path-style addressing.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(config.minio_region.clone()))
            .credentials_provider(Credentials::new(
                &config.minio_access_key,
                &config.minio_secret_key,
                None,
                None,
                "appointments-config",
            ))
            .endpoint_url(&config.minio_endpoint)
            .load()
            .await;
        let s3 = S3ConfigBuilder::from(&shared)
            .force_path_style(true)
            .build();
        debug!(
            endpoint = %config.minio_endpoint,
            bucket = %config.minio_bucket,
            "attachment store ready"
        );
        Ok(Self {
            client: Client::from_conf(s3),
            bucket: config.minio_bucket.clone(),
        })
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    async fn store(
        &self,
        id: Uuid,
        ext: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        let key = attachment_key(id, ext);
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(normalize_content_type(content_type))
            .content_disposition("inline")
            .send()
            .await
            .with_context(|| format!("store attachment {key}"))?;
        debug!(%key, size, "attachment stored");
        Ok(key)
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        ensure_attachment_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("remove attachment {key}"))?;
        debug!(%key, "attachment removed");
        Ok(())
    }

    async fn download_url(&self, key: &str, ttl: Duration) -> anyhow::Result<String> {
        ensure_attachment_key(key)?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(ttl)?)
            .await
            .with_context(|| format!("presign attachment {key}"))?;
        Ok(presigned.uri().to_string())
    }
}
