use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::{
        export::ExportMode,
        image::UploadEnvelope,
        preferences::ViewPreferences,
        transformation::DisplayOptions,
    },
    errors::AppError,
    utils::valid_uuid::valid_uuid,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub record_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub mode: ExportMode,
}

#[instrument(skip(state))]
pub async fn create_session(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let view = state.studio.create_session()?;
    Ok(HttpResponse::Created().json(view))
}

#[instrument(skip(state))]
pub async fn get_session(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let view = state.studio.snapshot(&id)?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(skip(state))]
pub async fn close_session(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    state.studio.close_session(&id)?;
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(state))]
pub async fn clear_session(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let view = state.studio.clear_session(&id)?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(skip(state, data))]
pub async fn upload_images(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UploadEnvelope>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let response = state.studio.request_upload(&id, data.into_inner())?;
    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(state))]
pub async fn remove_record(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (session_id, record_id) = path.into_inner();
    let id = valid_uuid(&session_id)?;
    let view = state.studio.request_removal(&id, &record_id)?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(skip(state, data))]
pub async fn select_record(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<SelectionRequest>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let view = state.studio.select(&id, &data.record_id)?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(skip(state, data))]
pub async fn update_options(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<DisplayOptions>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let view = state.studio.update_options(&id, data.into_inner())?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(skip(state, data))]
pub async fn update_preferences(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<ViewPreferences>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let view = state.studio.update_preferences(&id, data.into_inner())?;
    Ok(HttpResponse::Ok().json(view))
}

#[instrument(skip(state, data))]
pub async fn request_export(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<ExportRequest>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let report = state.studio.request_export(&id, data.mode).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[instrument(skip(state))]
pub async fn export_status(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&session_id)?;
    let status = state.studio.export_status(&id)?;
    Ok(HttpResponse::Ok().json(status))
}
