//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (campañas, SMTP, contactos).

pub mod campaign_handler;
pub mod contact_handler;
pub mod smtp_handler;

use actix_web::{HttpRequest, HttpResponse};
use serde_json::json;

use crate::models::auth_model::AuthUser;
use crate::services::auth_service::{self, AuthService};

/// Resuelve el usuario autenticado o corta con 401.
pub async fn require_user(
    req: &HttpRequest,
    auth: &AuthService,
) -> Result<AuthUser, HttpResponse> {
    let token = match auth_service::bearer_token(req) {
        Some(t) => t,
        None => {
            return Err(HttpResponse::Unauthorized().json(json!({
                "error": "No authorization header"
            })))
        }
    };

    match auth.get_user(&token).await {
        Ok(user) => Ok(user),
        Err(e) => {
            log::warn!("Token rechazado: {}", e);
            Err(HttpResponse::Unauthorized().json(json!({
                "error": "Unauthorized"
            })))
        }
    }
}
