use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use followup_core::constants::DOCX_MEDIA_TYPE;
use followup_core::{
    plan_uploads, AddPhysicianOutcome, DocumentRequest, FollowUpError, FollowUpResult,
    GeneratedDocument, UploadKind,
};
use followup_portal::PortalDocument;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AddPhysicianReq, AddPhysicianRes, ErrorRes, GenerateDocReq, HealthRes, MessageRes,
    UploadDocumentsReq, UploadDocumentsRes, UploadedDocument,
};
use crate::AppState;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Runs registry file I/O on the blocking pool.
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> FollowUpResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| FollowUpError::Task(e.to_string()))?;
    Ok(result?)
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Liveness message", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn root() -> Json<MessageRes> {
    Json(MessageRes {
        message: "Welcome to the Follow-up Document Generator API".into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Follow-up REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/physicians",
    responses(
        (status = 200, description = "Registered physician names in storage order", body = Vec<String>),
        (status = 500, description = "Physician store unreadable", body = ErrorRes)
    )
)]
/// List registered physicians.
#[axum::debug_handler]
pub async fn list_physicians(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let physicians = state.physicians.clone();
    let names = blocking(move || physicians.list()).await?;
    Ok(Json(names))
}

#[utoipa::path(
    post,
    path = "/physicians",
    request_body = AddPhysicianReq,
    responses(
        (status = 200, description = "Physician added, or already registered", body = AddPhysicianRes),
        (status = 400, description = "Name missing or blank", body = ErrorRes),
        (status = 500, description = "Physician store unreadable or unwritable", body = ErrorRes)
    )
)]
/// Register a physician.
///
/// Names are trimmed and compared case-insensitively; adding a name that is already
/// registered succeeds without changing the store and reports the stored spelling.
#[axum::debug_handler]
pub async fn add_physician(
    State(state): State<AppState>,
    payload: Result<Json<AddPhysicianReq>, JsonRejection>,
) -> ApiResult<Json<AddPhysicianRes>> {
    let req = json_body(payload)?;
    let physicians = state.physicians.clone();
    let outcome = blocking(move || physicians.add(&req.name)).await?;

    Ok(Json(AddPhysicianRes {
        message: outcome.message(),
        name: outcome.name().to_string(),
        added: matches!(outcome, AddPhysicianOutcome::Added(_)),
    }))
}

#[utoipa::path(
    post,
    path = "/generate-doc",
    request_body = GenerateDocReq,
    responses(
        (status = 200, description = "Rendered follow-up note as a DOCX attachment",
            content_type = "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        (status = 400, description = "Body is not a JSON object", body = ErrorRes),
        (status = 422, description = "Required field missing", body = ErrorRes),
        (status = 500, description = "Template missing, render or storage failure", body = ErrorRes)
    )
)]
/// Render a follow-up visit note.
///
/// The DOCX is stored under the output directory, converted to PDF where possible, and
/// returned as a download named after `fileName` (or `patientName`).
#[axum::debug_handler]
pub async fn generate_doc(
    State(state): State<AppState>,
    payload: Result<Json<GenerateDocReq>, JsonRejection>,
) -> ApiResult<Response> {
    let GenerateDocReq(body) = json_body(payload)?;
    let request = DocumentRequest::from_value(body)?;

    let doc = state.documents.generate(request).await?;

    if state.cfg.auto_upload() {
        spawn_auto_upload(&state, &doc);
    }

    let disposition = HeaderValue::from_str(&doc.content_disposition()).map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid Content-Disposition for '{}': {e}", doc.file_name),
        )
    })?;
    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static(DOCX_MEDIA_TYPE)),
        (CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, doc.bytes).into_response())
}

/// Queues the freshly converted PDF for portal upload. Failures are logged only.
fn spawn_auto_upload(state: &AppState, doc: &GeneratedDocument) {
    let (Some(pdf), Some(date)) = (&doc.pdf_path, &doc.date_of_evaluation) else {
        tracing::warn!(
            "auto-upload skipped for '{}': PDF or dateOfEvaluation missing",
            doc.file_name
        );
        return;
    };

    let documents = vec![PortalDocument::titled(
        UploadKind::Transcribed.title(date),
        pdf.clone(),
    )];
    let uploader = state.uploader.clone();
    let label = doc.file_name.to_string();

    tokio::spawn(async move {
        match uploader.upload(documents).await {
            Ok(reports) => tracing::info!("auto-uploaded {} document(s) for '{}'", reports.len(), label),
            Err(e) => tracing::error!("auto-upload failed for '{}': {}", label, e),
        }
    });
}

#[utoipa::path(
    post,
    path = "/upload-documents",
    request_body = UploadDocumentsReq,
    responses(
        (status = 200, description = "Documents uploaded", body = UploadDocumentsRes),
        (status = 202, description = "Upload started in the background", body = UploadDocumentsRes),
        (status = 400, description = "fileName or dateOfEvaluation missing", body = ErrorRes),
        (status = 404, description = "No matching PDF on disk", body = ErrorRes),
        (status = 502, description = "Portal automation failed", body = ErrorRes)
    )
)]
/// Upload a patient's notes to the practice-management portal.
///
/// The RAW note (when `rawFileName` is given) is uploaded first, then the newest PDF in the
/// patient's document folder.
#[axum::debug_handler]
pub async fn upload_documents(
    State(state): State<AppState>,
    payload: Result<Json<UploadDocumentsReq>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UploadDocumentsRes>)> {
    let req = json_body(payload)?;
    let file_name = req.file_name.trim().to_string();

    let documents: Vec<PortalDocument> = plan_uploads(
        &state.cfg,
        &file_name,
        &req.date_of_evaluation,
        req.raw_file_name.as_deref(),
    )?
    .into_iter()
    .map(|planned| PortalDocument::titled(planned.title, planned.path))
    .collect();

    if req.background {
        let uploader = state.uploader.clone();
        let label = file_name.clone();
        tokio::spawn(async move {
            match uploader.upload(documents).await {
                Ok(reports) => {
                    tracing::info!("uploaded {} document(s) for '{}'", reports.len(), label)
                }
                Err(e) => tracing::error!("background upload failed for '{}': {}", label, e),
            }
        });

        return Ok((
            StatusCode::ACCEPTED,
            Json(UploadDocumentsRes {
                message: format!("Upload triggered for '{file_name}'."),
                uploads: Vec::new(),
            }),
        ));
    }

    let reports = state.uploader.upload(documents).await?;
    let uploads: Vec<UploadedDocument> = reports
        .into_iter()
        .map(|r| UploadedDocument {
            title: r.title,
            path: r.path.display().to_string(),
            confirmed: r.confirmed,
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(UploadDocumentsRes {
            message: format!("Uploaded {} document(s) for '{file_name}'.", uploads.len()),
            uploads,
        }),
    ))
}
