//! report.rs
//! Front-end result contract.
//!
//! `{"success": true, "watermark": {...}}` or `{"success": false, "message": "..."}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::container::ContainerKind;
use crate::engine::Verified;
use crate::types::WatermarkError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Verified>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerifyResponse {
    pub fn ok(verified: Verified) -> Self {
        Self { success: true, watermark: Some(verified), message: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, watermark: None, message: Some(message.into()) }
    }
}

impl From<Result<Verified, WatermarkError>> for VerifyResponse {
    fn from(result: Result<Verified, WatermarkError>) -> Self {
        match result {
            Ok(v) => Self::ok(v),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Reject unsupported uploads before any core call.
pub fn route_upload(file_name: &str) -> Result<ContainerKind, WatermarkError> {
    ContainerKind::from_path(Path::new(file_name))
}
