//! Data Transfer Objects
//!
//! 字段统一使用 camelCase，与前端 / 主后端的调用约定一致

use serde::{Deserialize, Serialize};

use crate::application::CreatePreviewResponse;

// ============================================================================
// Preview DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreviewRequest {
    #[serde(default)]
    pub s3_path: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreviewResponseDto {
    pub success: bool,
    pub preview_url: String,
    pub s3_path: String,
    pub session_id: String,
    pub expires_in: u64,
    pub message: String,
}

impl From<CreatePreviewResponse> for CreatePreviewResponseDto {
    fn from(resp: CreatePreviewResponse) -> Self {
        Self {
            success: true,
            message: format!(
                "Preview URL created (valid for {} seconds)",
                resp.expires_in
            ),
            preview_url: resp.preview_url,
            s3_path: resp.storage_path,
            session_id: resp.session_id,
            expires_in: resp.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpirePreviewResponseDto {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Execute DTOs
// ============================================================================

fn default_language() -> String {
    "javascript".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExecuteCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
