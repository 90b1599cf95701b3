use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::{
    handlers::require_user,
    models::credential_model::{SaveSmtpRequest, SmtpCheckResponse},
    services::{auth_service::AuthService, credential_service::CredentialService},
};

/// POST /api/smtp/save
pub async fn save_smtp_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    credential_service: web::Data<CredentialService>,
    body: web::Json<SaveSmtpRequest>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let req_data = body.into_inner();
    if req_data.email.trim().is_empty() || req_data.app_password.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Email and app password are required"
        }));
    }

    match credential_service
        .save(&user.id, req_data.email.trim(), &req_data.app_password)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "SMTP credentials saved securely"
        })),
        Err(e) => {
            log::error!("Error guardando credenciales SMTP: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": e.to_string()
            }))
        }
    }
}

/// GET /api/smtp/check
pub async fn check_smtp_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    credential_service: web::Data<CredentialService>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match credential_service.get(&user.id).await {
        Ok(record) => HttpResponse::Ok().json(SmtpCheckResponse {
            configured: record.is_some(),
            email: record.map(|r| r.email),
        }),
        Err(e) => {
            log::error!("Error consultando credenciales SMTP: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": e.to_string(),
                "configured": false
            }))
        }
    }
}

/// DELETE /api/smtp
pub async fn delete_smtp_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    credential_service: web::Data<CredentialService>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match credential_service.delete(&user.id).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "SMTP credentials removed"
        })),
        Err(e) => {
            log::error!("Error borrando credenciales SMTP: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": e.to_string()
            }))
        }
    }
}
