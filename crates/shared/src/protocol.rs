use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::StoreCredentials;

pub const CONNECT_PATH: &str = "/api/v1/auth/connect";
pub const CHAT_PATH: &str = "/api/v1/chatbot/chat";
pub const UPLOAD_PATH: &str = "/api/v1/files/upload";
pub const HEALTH_PATH: &str = "/";

/// Multipart field name the upload endpoint reads the file from.
pub const UPLOAD_FIELD: &str = "file";

/// The connect endpoint takes the credential bundle as its body unchanged.
pub type ConnectRequest = StoreCredentials;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub message: String,
    pub store_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub credentials: Option<StoreCredentials>,
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response_text: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}
