use async_trait::async_trait;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Where pet photos end up. Returns the public URL of the stored object.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, object_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

pub struct GcsImageStore {
    client: GcsClient,
    bucket: String,
}

impl GcsImageStore {
    pub async fn connect(bucket: String) -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::Storage(format!("GCS auth failed: {e}")))?;
        Ok(Self {
            client: GcsClient::new(config),
            bucket,
        })
    }
}

#[async_trait]
impl ImageStore for GcsImageStore {
    async fn put(&self, object_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let upload_type = UploadType::Simple(Media {
            name: object_name.to_string().into(),
            content_type: content_type.to_string().into(),
            content_length: Some(bytes.len() as u64),
        });

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                bytes,
                &upload_type,
            )
            .await
            .map_err(|e| Error::Storage(format!("GCS upload failed: {e}")))?;

        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket, object_name
        ))
    }
}

/// `pets/<pet>/<random>.<ext>`, keeping the uploaded file's extension.
pub fn object_name(pet_id: Uuid, file_name: &str) -> String {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "jpg".to_string());
    format!("pets/{}/{}.{}", pet_id, Uuid::new_v4(), ext)
}

/// Content type guessed from the file name; only images are accepted.
pub fn image_content_type(file_name: &str) -> Result<String> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(Error::validation("image", format!("{mime} is not an image type")));
    }
    Ok(mime.to_string())
}
