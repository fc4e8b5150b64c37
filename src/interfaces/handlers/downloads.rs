use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpResponse, Responder,
};
use tracing::instrument;

use crate::{
    entities::export::DownloadTicket,
    errors::AppError,
    utils::valid_uuid::valid_uuid,
    AppState,
};

/// Streams a prepared export once; the slot is released afterwards.
#[instrument(skip(state))]
pub async fn download(
    ticket: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let ticket = DownloadTicket(valid_uuid(&ticket)?);
    let file = state.studio.take_download(&ticket)?;

    tracing::info!(file_name = %file.file_name, size = file.bytes.len(), "Serving download");

    Ok(HttpResponse::Ok()
        .content_type(file.content_type.as_str())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.file_name)],
        })
        .body(file.bytes))
}
