use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{FileRecord, FileRepo, NewFile};
use crate::{
    error::{ApiError, ApiResult},
    storage::{normalize_content_type, AttachmentStore},
};

pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;
const DOWNLOAD_LINK_TTL: Duration = Duration::from_secs(30 * 60);

pub struct Upload {
    pub body: Bytes,
    pub client_name: String,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Subtype of an `image/*` content type, `None` for anything else.
fn image_subtype(ct: &str) -> Option<&str> {
    let subtype = ct.strip_prefix("image/")?;
    let subtype = subtype.split(';').next().unwrap_or(subtype).trim();
    (!subtype.is_empty()).then_some(subtype)
}

pub async fn upload(
    files: &dyn FileRepo,
    storage: &dyn AttachmentStore,
    upload: Upload,
) -> ApiResult<FileRecord> {
    let content_type = normalize_content_type(&upload.content_type);
    let subtype = image_subtype(&content_type)
        .ok_or_else(|| ApiError::Validation("Only image files are accepted".into()))?
        .to_string();
    if upload.body.is_empty() {
        return Err(ApiError::Validation("file is empty".into()));
    }
    if upload.body.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation("file exceeds 2mb".into()));
    }

    let id = Uuid::new_v4();
    let ext = ext_from_mime(&content_type).unwrap_or(subtype.as_str());
    let key = storage
        .store(id, ext, upload.body, &content_type)
        .await
        .with_context(|| format!("upload attachment {id}"))?;

    let new = NewFile {
        id,
        file: key.clone(),
        name: upload.client_name,
        content_type,
        subtype,
    };
    match files.create_file(new).await {
        Ok(record) => {
            info!(file_id = %record.id, key = %record.file, "file uploaded");
            Ok(record)
        }
        Err(e) => {
            if let Err(cleanup) = storage.remove(&key).await {
                warn!(error = %cleanup, %key, "orphaned object left in storage");
            }
            Err(e.into())
        }
    }
}

pub async fn presign(
    files: &dyn FileRepo,
    storage: &dyn AttachmentStore,
    id: Uuid,
) -> ApiResult<String> {
    let record = files
        .find_file(id)
        .await?
        .ok_or(ApiError::NotFound("File"))?;
    let url = storage
        .download_url(&record.file, DOWNLOAD_LINK_TTL)
        .await
        .with_context(|| format!("download link for {}", record.file))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FakeStorage, MemoryStore};

    fn png(len: usize) -> Upload {
        Upload {
            body: Bytes::from(vec![0u8; len]),
            client_name: "scan.png".into(),
            content_type: "image/png".into(),
        }
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_image_subtype() {
        assert_eq!(image_subtype("image/png"), Some("png"));
        assert_eq!(image_subtype("image/svg+xml; charset=utf-8"), Some("svg+xml"));
        assert_eq!(image_subtype("image/"), None);
        assert_eq!(image_subtype("text/plain"), None);
    }

    #[tokio::test]
    async fn upload_stores_object_and_record() {
        let store = MemoryStore::default();
        let storage = FakeStorage::default();
        let record = upload(&store, &storage, png(16)).await.unwrap();
        assert_eq!(record.name, "scan.png");
        assert_eq!(record.subtype, "png");
        assert_eq!(record.file, format!("uploads/{}.png", record.id));
        assert!(storage.contains(&record.file).await);
        assert_eq!(storage.content_type(&record.file).await.as_deref(), Some("image/png"));

        let url = presign(&store, &storage, record.id).await.unwrap();
        assert!(url.ends_with(&record.file));
    }

    #[tokio::test]
    async fn upload_drops_content_type_parameters() {
        let store = MemoryStore::default();
        let storage = FakeStorage::default();
        let mut jpeg = png(16);
        jpeg.content_type = "image/JPEG; q=0.9".into();
        let record = upload(&store, &storage, jpeg).await.unwrap();
        assert_eq!(record.content_type, "image/jpeg");
        assert_eq!(record.subtype, "jpeg");
        assert_eq!(record.file, format!("uploads/{}.jpg", record.id));
        assert_eq!(storage.content_type(&record.file).await.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn upload_rejects_non_images_and_oversized() {
        let store = MemoryStore::default();
        let storage = FakeStorage::default();
        let mut pdf = png(16);
        pdf.content_type = "application/pdf".into();
        assert!(matches!(upload(&store, &storage, pdf).await, Err(ApiError::Validation(_))));
        assert!(matches!(
            upload(&store, &storage, png(MAX_UPLOAD_BYTES + 1)).await,
            Err(ApiError::Validation(_))
        ));
        assert!(upload(&store, &storage, png(MAX_UPLOAD_BYTES)).await.is_ok());
    }

    #[tokio::test]
    async fn failed_record_insert_removes_object() {
        let store = MemoryStore::default();
        let storage = FakeStorage::default();
        store.fail_next_write_with_conflict().await;
        assert!(upload(&store, &storage, png(16)).await.is_err());
        assert_eq!(storage.len().await, 0);
    }

    #[tokio::test]
    async fn presign_unknown_file_is_not_found() {
        let store = MemoryStore::default();
        let storage = FakeStorage::default();
        let res = presign(&store, &storage, Uuid::new_v4()).await;
        assert!(matches!(res, Err(ApiError::NotFound("File"))));
    }
}
