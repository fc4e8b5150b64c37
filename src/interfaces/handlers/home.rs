use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Image Studio API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "sessions": "/api/v1/studio/sessions",
            "presets": "/api/v1/presets",
            "health": "/api/v1/health"
        }
    }))
}
