use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;

use crate::{
    constants::{COMMON_ASPECT_RATIOS, PRESET_BACKGROUND_COLORS, START_TIME},
    entities::transformation::{DisplayOptions, OutputFormat, MAX_DIMENSION},
    UploadWidgetSettings,
    AppState,
};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    version: &'static str,
    active_sessions: usize,
    pending_downloads: usize,
}

#[derive(Serialize)]
struct ColorPreset {
    value: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct PresetsResponse {
    background_colors: Vec<ColorPreset>,
    aspect_ratios: &'static [&'static str],
    output_formats: [OutputFormat; 3],
    max_dimension: u32,
    default_options: DisplayOptions,
    upload_widget: UploadWidgetSettings,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy",
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        active_sessions: state.studio.sessions.len(),
        pending_downloads: state.studio.export_coordinator.save_target.pending(),
    })
}

/// Choices the sidebar and the upload widget are populated with.
#[get("/presets")]
pub async fn presets(state: web::Data<AppState>) -> impl Responder {
    let background_colors = PRESET_BACKGROUND_COLORS
        .iter()
        .map(|&(value, label)| ColorPreset { value, label })
        .collect();

    HttpResponse::Ok().json(PresetsResponse {
        background_colors,
        aspect_ratios: &COMMON_ASPECT_RATIOS,
        output_formats: [OutputFormat::Png, OutputFormat::Jpg, OutputFormat::Webp],
        max_dimension: MAX_DIMENSION,
        default_options: DisplayOptions::default(),
        upload_widget: state.upload_widget.clone(),
    })
}
