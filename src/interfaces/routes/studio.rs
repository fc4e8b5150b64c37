use actix_web::web;

use crate::handlers::studio;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/studio/sessions")
            .service(
                web::resource("")
                    .route(web::post().to(studio::create_session))
            )
            .service(
                web::resource("/{session_id}")
                    .route(web::get().to(studio::get_session))
                    .route(web::delete().to(studio::close_session))
            )
            .service(
                web::resource("/{session_id}/clear")
                    .route(web::post().to(studio::clear_session))
            )
            .service(
                web::resource("/{session_id}/uploads")
                    .route(web::post().to(studio::upload_images))
            )
            // Record ids are folder-qualified, so the tail may contain slashes.
            .service(
                web::resource("/{session_id}/records/{record_id:.+}")
                    .route(web::delete().to(studio::remove_record))
            )
            .service(
                web::resource("/{session_id}/selection")
                    .route(web::put().to(studio::select_record))
            )
            .service(
                web::resource("/{session_id}/options")
                    .route(web::put().to(studio::update_options))
            )
            .service(
                web::resource("/{session_id}/preferences")
                    .route(web::put().to(studio::update_preferences))
            )
            .service(
                web::resource("/{session_id}/exports")
                    .route(web::post().to(studio::request_export))
            )
            .service(
                web::resource("/{session_id}/exports/status")
                    .route(web::get().to(studio::export_status))
            )
    );
}
