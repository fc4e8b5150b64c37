use actix_web::web;

use crate::handlers::downloads;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/downloads/{ticket}")
            .route(web::get().to(downloads::download))
    );
}
