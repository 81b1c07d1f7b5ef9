use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::models::PageMeta;

/// Uniform response wrapper used by every API endpoint:
/// `{ success, message, data?, meta?, errors? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
}

/// Typed `data` of a successful response together with the envelope fields
/// callers occasionally need
#[derive(Debug, Clone)]
pub struct Payload<T> {
    pub data: T,
    pub message: String,
    pub meta: Option<PageMeta>,
}

/// Lenient view of an error body; anything that is not an envelope yields
/// the empty default
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    pub fn message(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors.clone().unwrap_or_default()
    }
}
