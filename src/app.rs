//! app.rs
use crate::handlers::{campaign_handler, contact_handler, smtp_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/campaigns")
                    .route(
                        "/send",
                        web::post().to(campaign_handler::send_campaign_endpoint),
                    )
                    .route("/quota", web::get().to(campaign_handler::quota_endpoint))
                    .route(
                        "",
                        web::get().to(campaign_handler::list_campaigns_endpoint),
                    ),
            )
            .service(
                web::scope("/smtp")
                    .route("/save", web::post().to(smtp_handler::save_smtp_endpoint))
                    .route("/check", web::get().to(smtp_handler::check_smtp_endpoint))
                    .route("", web::delete().to(smtp_handler::delete_smtp_endpoint)),
            )
            .service(
                web::scope("/contacts")
                    .route("", web::get().to(contact_handler::list_contacts_endpoint))
                    .route("", web::post().to(contact_handler::add_contact_endpoint))
                    .route(
                        "/{id}",
                        web::delete().to(contact_handler::delete_contact_endpoint),
                    ),
            ),
    );
}
