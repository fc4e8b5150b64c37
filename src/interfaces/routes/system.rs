use actix_web::web;

use crate::handlers::system::{health_check, presets};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check).service(presets);
}
