use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::{Pool, Sqlite};

use crate::config::campaign_config::CampaignGlobalConfig;
use crate::logger::init_logger;
use crate::services::auth_service::AuthService;
use crate::services::campaign_service::CampaignService;
use crate::services::contact_service::ContactService;
use crate::services::content_service::ContentService;
use crate::services::credential_service::CredentialService;
use crate::services::mail_service::MailService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

async fn setup_database() -> Pool<Sqlite> {
    // 1) Crear carpeta "data"
    std::fs::create_dir_all("data").expect("No se pudo crear directorio 'data'");

    // 2) Ruta final: ./data/crm.db (mode=rwc crea el archivo si falta)
    let db_path = std::env::current_dir()
        .expect("No se pudo obtener el current_dir")
        .join("data")
        .join("crm.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());

    log::info!("Conectando a SQLite en {}", db_url);

    // 3) Conectarnos con SQLx
    Pool::<Sqlite>::connect(&db_url)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    // Conectarnos a la DB
    let db_pool = setup_database().await;

    let config = CampaignGlobalConfig::default();

    // CredentialService
    let credential_service = CredentialService::new(db_pool.clone());
    if let Err(e) = credential_service.run_migrations().await {
        panic!("Fallo en migraciones de 'smtp_credentials': {:?}", e);
    }

    // Colaboradores externos
    let auth_service = AuthService::new();
    let content_service = ContentService::new();
    let mail_service = MailService::new(config.smtp_timeout_secs);

    // CampaignService (orquestador + ledger)
    let campaign_service = CampaignService::new(
        db_pool.clone(),
        content_service,
        mail_service,
        credential_service.clone(),
        config.clone(),
    );
    if let Err(e) = campaign_service.run_migrations().await {
        panic!("Fallo en migraciones de 'email_campaigns': {:?}", e);
    }

    // ContactService
    let contact_service = ContactService::new(db_pool.clone(), config.max_contacts);

    // Levantar servidor
    log::info!("Levantando servidor en 0.0.0.0:5030");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(credential_service.clone()))
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(contact_service.clone()))
            .configure(app::init_app)
    })
    .bind(("0.0.0.0", 5030))?
    .run()
    .await
}
