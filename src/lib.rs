mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{archive, delivery, utils};

use delivery::url_builder::DeliveryUrlBuilder;
use errors::AppError;
use repositories::{
    downloads::DownloadSlots,
    rendition::HttpRenditionSource,
    session_store::SessionStore,
};
use serde::Serialize;
use use_cases::{export::ExportCoordinator, studio::StudioHandler};

pub type AppStudioHandler = StudioHandler<HttpRenditionSource, DownloadSlots>;

/// Settings the hosted upload widget is opened with.
#[derive(Debug, Clone, Serialize)]
pub struct UploadWidgetSettings {
    pub cloud_name: String,
    pub upload_preset: String,
    pub folder: String,
    pub multiple: bool,
    pub sources: Vec<String>,
}

pub struct AppState {
    pub studio: AppStudioHandler,
    pub upload_widget: UploadWidgetSettings,
}

impl AppState {
    pub fn new(config: &settings::AppConfig) -> Result<Self, AppError> {
        let urls = DeliveryUrlBuilder::new(&config.delivery_base_url, &config.cloud_name, config.lossy_quality)?;

        let rendition_source = HttpRenditionSource::with_timeout(urls.clone(), config.fetch_timeout())
            .map_err(|e| AppError::InternalError(format!("HTTP client error: {}", e)))?;
        let downloads = DownloadSlots::new(config.max_pending_downloads);
        let coordinator = ExportCoordinator::new(rendition_source, downloads, config.archive_name.clone());

        let studio = StudioHandler::new(SessionStore::new(), coordinator, urls);

        let upload_widget = UploadWidgetSettings {
            cloud_name: config.cloud_name.clone(),
            upload_preset: config.upload_preset.clone(),
            folder: config.upload_folder.clone(),
            multiple: true,
            sources: constants::UPLOAD_SOURCES.iter().map(|s| s.to_string()).collect(),
        };

        Ok(AppState {
            studio,
            upload_widget,
        })
    }
}
