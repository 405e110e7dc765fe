//! Route handlers: extract fields, call the orchestrator, map the outcome to
//! a status code and a plain-text body.

use axum::{
    body::Bytes,
    extract::{multipart::Multipart, rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};

use crate::error::ControlPlaneError;
use crate::http::server::AppState;
use crate::orchestrator::{CredentialsForm, DomainNameForm, ExternalRegistryForm, LocalApiKeyForm};
use crate::validator::ValidationError;

fn respond(result: Result<(), ControlPlaneError>, success: &'static str) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, success).into_response(),
        Err(e) => e.into_response(),
    }
}

fn form_or_error<T>(form: Result<Form<T>, FormRejection>) -> Result<T, Response> {
    form.map(|Form(inner)| inner).map_err(|rejection| {
        ControlPlaneError::from(ValidationError::MalformedRequest(rejection.body_text()))
            .into_response()
    })
}

/// Read the named file field of a multipart body.
async fn read_file_field(
    mut multipart: Multipart,
    field_name: &'static str,
) -> Result<(Option<String>, Bytes), Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        if field.name() == Some(field_name) {
            let filename = field.file_name().map(str::to_string);
            let contents = field.bytes().await.map_err(IntoResponse::into_response)?;
            return Ok((filename, contents));
        }
    }
    Err(ControlPlaneError::from(ValidationError::MissingParameter(field_name)).into_response())
}

/// Wrong method on a known path.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub async fn restart_services(State(state): State<AppState>) -> Response {
    respond(state.control_plane.restart_services().await, "OK")
}

pub async fn upload_enrichments(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (filename, contents) = match read_file_field(multipart, "enrichmentjson").await {
        Ok(field) => field,
        Err(response) => return response,
    };
    let filename = filename.unwrap_or_default();
    respond(
        state.control_plane.upload_enrichment(&filename, &contents).await,
        "uploaded successfully",
    )
}

pub async fn upload_iglu_config(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (_, contents) = match read_file_field(multipart, "igluserverhocon").await {
        Ok(field) => field,
        Err(response) => return response,
    };
    respond(
        state.control_plane.upload_registry_server_config(&contents).await,
        "uploaded successfully",
    )
}

pub async fn add_external_iglu(
    State(state): State<AppState>,
    form: Result<Form<ExternalRegistryForm>, FormRejection>,
) -> Response {
    let form = match form_or_error(form) {
        Ok(form) => form,
        Err(response) => return response,
    };
    respond(
        state.control_plane.add_external_registry(&form).await,
        "added successfully",
    )
}

pub async fn add_local_iglu_apikey(
    State(state): State<AppState>,
    form: Result<Form<LocalApiKeyForm>, FormRejection>,
) -> Response {
    let form = match form_or_error(form) {
        Ok(form) => form,
        Err(response) => return response,
    };
    respond(
        state.control_plane.set_local_registry_api_key(&form).await,
        "added successfully",
    )
}

pub async fn change_credentials(
    State(state): State<AppState>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Response {
    let form = match form_or_error(form) {
        Ok(form) => form,
        Err(response) => return response,
    };
    respond(
        state.control_plane.change_credentials(&form).await,
        "changed successfully",
    )
}

/// Everything that fails before the restart answers 405 here, except a
/// missing field.
pub async fn add_domain_name(
    State(state): State<AppState>,
    form: Result<Form<DomainNameForm>, FormRejection>,
) -> Response {
    let form = match form_or_error(form) {
        Ok(form) => form,
        Err(response) => return response,
    };
    match state.control_plane.change_domain_name(&form).await {
        Ok(()) => (StatusCode::OK, "added successfully").into_response(),
        Err(e @ ControlPlaneError::Validation(ValidationError::MissingParameter(_))) => {
            e.into_response()
        }
        Err(e) if e.is_restart_failure() => e.into_response(),
        Err(e) => (StatusCode::METHOD_NOT_ALLOWED, e.to_string()).into_response(),
    }
}

pub async fn get_version(State(state): State<AppState>) -> Response {
    match state.control_plane.version().await {
        Ok(version) => (StatusCode::OK, version).into_response(),
        Err(e) => e.into_response(),
    }
}
