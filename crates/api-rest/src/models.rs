//! Request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddPhysicianReq {
    /// Missing is treated like blank and rejected with 400.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddPhysicianRes {
    pub message: String,
    pub name: String,
    /// `false` when a case-insensitive match was already registered.
    pub added: bool,
}

/// Free-form visit description; every key becomes a template variable.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct GenerateDocReq(#[schema(value_type = Object)] pub serde_json::Value);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentsReq {
    /// Document folder name; the newest PDF in it is uploaded.
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub date_of_evaluation: String,
    /// Prefix of the RAW PDF to upload before the transcribed note.
    #[serde(default)]
    pub raw_file_name: Option<String>,
    /// Return 202 immediately and upload in the background.
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedDocument {
    pub title: String,
    pub path: String,
    pub confirmed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadDocumentsRes {
    pub message: String,
    pub uploads: Vec<UploadedDocument>,
}
