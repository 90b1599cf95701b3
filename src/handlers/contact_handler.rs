use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::{
    handlers::require_user,
    models::contact_model::CreateContactRequest,
    services::{auth_service::AuthService, contact_service::ContactService},
};

/// GET /api/contacts
pub async fn list_contacts_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    contact_service: web::Data<ContactService>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match contact_service.list(&user.id).await {
        Ok(contacts) => HttpResponse::Ok().json(contacts),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": e.to_string()
        })),
    }
}

/// POST /api/contacts
pub async fn add_contact_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    contact_service: web::Data<ContactService>,
    body: web::Json<CreateContactRequest>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let req_data = body.into_inner();
    if req_data.name.trim().is_empty() || req_data.email.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Name and email are required"
        }));
    }

    match contact_service
        .add(&user.id, &req_data.name, &req_data.email)
        .await
    {
        Ok(contact) => HttpResponse::Ok().json(contact),
        Err(e) => {
            // El tope de contactos es un rechazo del request, no un 500
            let status = if e.to_string().contains("only add up to") {
                actix_web::http::StatusCode::BAD_REQUEST
            } else {
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            };

            HttpResponse::build(status).json(json!({
                "error": e.to_string()
            }))
        }
    }
}

/// DELETE /api/contacts/{id}
pub async fn delete_contact_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    contact_service: web::Data<ContactService>,
    path: web::Path<String>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let contact_id = path.into_inner();
    match contact_service.delete(&user.id, &contact_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Contact removed"
        })),
        Err(e) => {
            let status = if e.to_string().contains("not found") {
                actix_web::http::StatusCode::NOT_FOUND
            } else {
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            };

            HttpResponse::build(status).json(json!({
                "error": e.to_string()
            }))
        }
    }
}
