use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use image::ImageFormat;
use uuid::Uuid;

use crate::domain::media::{CreatePostRequest, NewSpot, PresignRequest, PresignedUpload, UploadedSpot};
use crate::http::{routes, ApiError};
use crate::infra::api::ApiClient;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Clone)]
pub struct MediaService {
    api: ApiClient,
}

impl MediaService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Presign, upload the photo straight to object storage, then record the
    /// spot. `file_name` defaults to a generated `photo_<uuid>.<ext>`.
    pub async fn upload_spot(
        &self,
        photo: Bytes,
        file_name: Option<&str>,
        spot: &NewSpot,
    ) -> Result<UploadedSpot> {
        if photo.is_empty() {
            return Err(anyhow!("no photo to upload"));
        }

        let (content_type, extension) = sniff_content_type(&photo);
        let file_name = match file_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("photo_{}.{}", Uuid::new_v4(), extension),
        };

        let presigned = self.presign(&file_name, content_type).await?;
        let upload_url = presigned
            .upload_url
            .ok_or_else(|| ApiError::invalid_response("presigned URL missing from response"))?;
        let file_url = presigned
            .file_url
            .ok_or_else(|| ApiError::invalid_response("file URL missing from presign response"))?;

        tracing::debug!(file_name = %file_name, bytes = photo.len(), "uploading photo");
        self.api
            .put_bytes(&upload_url, content_type, photo)
            .await
            .context("photo upload failed")?;

        let body = CreatePostRequest {
            spot,
            file_url: &file_url,
        };
        let response = self
            .api
            .post_authed(&routes::create_post(), &body)
            .await
            .context("failed to create post")?
            .ok_or_else(ApiError::missing_credential)?;

        tracing::info!(file_url = %file_url, "spot created");
        Ok(UploadedSpot { file_url, response })
    }

    async fn presign(&self, file_name: &str, file_type: &str) -> Result<PresignedUpload> {
        let request = PresignRequest {
            file_name,
            file_type,
        };
        let response = self
            .api
            .post_public(&routes::presign(), &request)
            .await
            .context("failed to get presigned URL")?;
        serde_json::from_value(response)
            .map_err(|err| ApiError::invalid_response(format!("bad presign response: {}", err)).into())
    }
}

/// MIME type and file extension from the image header. Unknown data is sent
/// as JPEG, which is what the camera produces.
pub fn sniff_content_type(photo: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(photo) {
        Ok(ImageFormat::Png) => ("image/png", "png"),
        Ok(ImageFormat::WebP) => ("image/webp", "webp"),
        _ => (DEFAULT_CONTENT_TYPE, "jpg"),
    }
}
