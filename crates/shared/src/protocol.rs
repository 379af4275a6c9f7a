use serde::{Deserialize, Serialize};

use crate::domain::{CompilerId, LanguageId};

/// Output substituted when a structured reply carries neither `assemblyOutput` nor `output`.
pub const NO_OUTPUT_PLACEHOLDER: &str = "No output generated.";

/// Body of `POST /api/compiler/compile` and `POST /api/compiler/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub language: LanguageId,
    pub code: String,
    pub compiler_id: CompilerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_options: Option<String>,
}

/// Canonical shape of every compile or execute reply after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompileResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}
