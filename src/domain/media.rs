use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest<'a> {
    pub file_name: &'a str,
    pub file_type: &'a str,
}

/// Metadata sent to `POST /create-post` once the photo is uploaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSpot {
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostRequest<'a> {
    #[serde(flatten)]
    pub spot: &'a NewSpot,
    #[serde(rename = "fileUrl")]
    pub file_url: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedSpot {
    pub file_url: String,
    pub response: serde_json::Value,
}
