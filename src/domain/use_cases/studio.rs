use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    delivery::url_builder::DeliveryUrlBuilder,
    entities::{
        export::{DownloadTicket, ExportMode, ExportReport, ExportStatus, SavedFile},
        image::{ImageRecord, UploadEnvelope},
        preferences::ViewPreferences,
        transformation::{DisplayOptions, TransformationDescriptor},
    },
    errors::{AppError, ExportError},
    repositories::{
        downloads::SaveTarget,
        rendition::RenditionSource,
        session_store::{SessionStore, StudioSession},
    },
    use_cases::{
        export::{ExportCoordinator, ExportTracker},
        transformation::TransformationParameterBuilder,
    },
};

// ───── View models ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RecordCard {
    pub id: String,
    pub original_name: String,
    pub source_url: String,
    pub rendition_url: String,
    pub thumbnail_url: String,
    pub natural_width: Option<u32>,
    pub natural_height: Option<u32>,
    pub uploaded_at: DateTime<Utc>,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub records: Vec<RecordCard>,
    pub selected_id: Option<String>,
    pub options: DisplayOptions,
    pub descriptor: TransformationDescriptor,
    pub export: ExportStatus,
    pub preferences: ViewPreferences,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub added: usize,
    pub session: SessionView,
}

/// What an export needs, copied out of the session so no lock is held
/// while fetching.
struct ExportSnapshot {
    tracker: Arc<ExportTracker>,
    records: Vec<ImageRecord>,
    selected: Option<ImageRecord>,
    options: DisplayOptions,
    generation: u64,
}

// ───── Handler ──────────────────────────────────────────────────────

/// Boundary between the studio front end and the session and export core.
pub struct StudioHandler<R, T>
where
    R: RenditionSource,
    T: SaveTarget,
{
    pub sessions: SessionStore,
    pub export_coordinator: ExportCoordinator<R, T>,
    pub urls: DeliveryUrlBuilder,
}

impl<R, T> StudioHandler<R, T>
where
    R: RenditionSource,
    T: SaveTarget,
{
    pub fn new(sessions: SessionStore, export_coordinator: ExportCoordinator<R, T>, urls: DeliveryUrlBuilder) -> Self {
        StudioHandler {
            sessions,
            export_coordinator,
            urls,
        }
    }

    /// Opens a fresh, empty session
    pub fn create_session(&self) -> Result<SessionView, AppError> {
        let id = self.sessions.create();
        tracing::info!(session_id = %id, "Studio session created");
        self.snapshot(&id)
    }

    pub fn snapshot(&self, id: &Uuid) -> Result<SessionView, AppError> {
        let view = self.sessions.with_session(id, |session| self.build_view(id, session))??;
        Ok(view)
    }

    /// Tears the session down. In-flight exports for it are discarded.
    pub fn close_session(&self, id: &Uuid) -> Result<(), AppError> {
        if self.sessions.remove(id) {
            tracing::info!(session_id = %id, "Studio session closed");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Session not found: {}", id)))
        }
    }

    pub fn clear_session(&self, id: &Uuid) -> Result<SessionView, AppError> {
        self.sessions.with_session(id, |session| session.uploads.clear())?;
        self.snapshot(id)
    }

    /// Appends whatever the upload widget reported.
    pub fn request_upload(&self, id: &Uuid, envelope: UploadEnvelope) -> Result<UploadResponse, AppError> {
        let assets = envelope.into_assets()?;
        let now = Utc::now();
        let records: Vec<ImageRecord> = assets.into_iter().map(|a| a.into_record(now)).collect();

        let added = self.sessions.with_session(id, |session| session.uploads.append(records))?;
        tracing::info!(session_id = %id, added, "Uploads appended");

        Ok(UploadResponse {
            added,
            session: self.snapshot(id)?,
        })
    }

    /// Removing an id that is not present leaves the session unchanged.
    pub fn request_removal(&self, id: &Uuid, record_id: &str) -> Result<SessionView, AppError> {
        let removed = self.sessions.with_session(id, |session| session.uploads.remove(record_id))?;
        if removed {
            tracing::info!(session_id = %id, %record_id, "Record removed");
        }
        self.snapshot(id)
    }

    pub fn select(&self, id: &Uuid, record_id: &str) -> Result<SessionView, AppError> {
        self.sessions.with_session(id, |session| session.uploads.select(record_id))??;
        self.snapshot(id)
    }

    /// Validates the options first; invalid options never reach the session.
    pub fn update_options(&self, id: &Uuid, options: DisplayOptions) -> Result<SessionView, AppError> {
        options.validate()?;
        TransformationParameterBuilder::build(&options)?;

        self.sessions.with_session(id, |session| session.options = options)?;
        self.snapshot(id)
    }

    pub fn update_preferences(&self, id: &Uuid, preferences: ViewPreferences) -> Result<SessionView, AppError> {
        self.sessions.with_session(id, |session| session.preferences = preferences)?;
        self.snapshot(id)
    }

    pub fn export_status(&self, id: &Uuid) -> Result<ExportStatus, AppError> {
        Ok(self.sessions.with_session(id, |session| session.export.status())?)
    }

    pub async fn request_export(&self, id: &Uuid, mode: ExportMode) -> Result<ExportReport, AppError> {
        let snapshot = self.sessions.with_session(id, |session| ExportSnapshot {
            tracker: Arc::clone(&session.export),
            records: session.uploads.list().iter().cloned().collect(),
            selected: session.uploads.selected().cloned(),
            options: session.options.clone(),
            generation: session.uploads.generation(),
        })?;

        let descriptor = TransformationParameterBuilder::build(&snapshot.options)?;
        let store = self.sessions.clone();
        let session_id = *id;
        let generation = snapshot.generation;
        let is_live = move || store.is_live(&session_id, generation);

        let report = match mode {
            ExportMode::Single => {
                let record = snapshot.selected.ok_or(ExportError::NothingSelected)?;
                self.export_coordinator
                    .download_single(&snapshot.tracker, &record, &descriptor, is_live)
                    .await?
            }
            ExportMode::Batch => {
                self.export_coordinator
                    .export_batch(&snapshot.tracker, &snapshot.records, &descriptor, is_live)
                    .await?
            }
        };

        Ok(report)
    }

    /// Hands out a prepared download once.
    pub fn take_download(&self, ticket: &DownloadTicket) -> Result<SavedFile, AppError> {
        self.export_coordinator
            .save_target
            .take(ticket)
            .ok_or_else(|| AppError::NotFound("Download expired or already taken".to_string()))
    }

    fn build_view(&self, id: &Uuid, session: &StudioSession) -> Result<SessionView, AppError> {
        let descriptor = TransformationParameterBuilder::build(&session.options)?;
        let selected_id = session.uploads.selected_id().map(str::to_string);

        let records = session
            .uploads
            .list()
            .iter()
            .map(|record| {
                Ok(RecordCard {
                    id: record.id.clone(),
                    original_name: record.original_name.clone(),
                    source_url: record.source_url.clone(),
                    rendition_url: self.urls.rendition_url(&record.id, &descriptor)?.to_string(),
                    thumbnail_url: self.urls.thumbnail_url(&record.id)?.to_string(),
                    natural_width: record.natural_width,
                    natural_height: record.natural_height,
                    uploaded_at: record.uploaded_at,
                    selected: selected_id.as_deref() == Some(record.id.as_str()),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(SessionView {
            id: *id,
            records,
            selected_id,
            options: session.options.clone(),
            descriptor,
            export: session.export.status(),
            preferences: session.preferences.clone(),
        })
    }
}
