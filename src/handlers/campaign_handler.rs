use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    handlers::require_user,
    models::campaign_model::{CampaignError, CampaignResponse, SendCampaignRequest},
    services::{auth_service::AuthService, campaign_service::CampaignService},
};

#[derive(Deserialize)]
pub struct PaginationQuery {
    page: Option<u64>,
    page_size: Option<u64>,
}

/// POST /api/campaigns/send
pub async fn send_campaign_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    campaign_service: web::Data<CampaignService>,
    body: web::Json<SendCampaignRequest>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let req_data = body.into_inner();
    let total = req_data.recipients.len();

    match campaign_service.process_campaign(&user, req_data).await {
        Ok(results) => HttpResponse::Ok().json(CampaignResponse {
            success: true,
            message: format!("Campaign processed for {} recipients", total),
            results,
        }),
        Err(e) => {
            log::error!("Campaign dispatch error: {}", e);
            campaign_error_response(e)
        }
    }
}

/// GET /api/campaigns
pub async fn list_campaigns_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    campaign_service: web::Data<CampaignService>,
    query: web::Query<PaginationQuery>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10);

    match campaign_service
        .list_campaigns(&user.id, page, page_size)
        .await
    {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/campaigns/quota
pub async fn quota_endpoint(
    http_req: HttpRequest,
    auth_service: web::Data<AuthService>,
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    let user = match require_user(&http_req, &auth_service).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match campaign_service.quota(&user.id).await {
        Ok(quota) => HttpResponse::Ok().json(quota),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// Errores de batch -> status HTTP. Las fallas por destinatario nunca
/// llegan acá: viajan dentro del envelope 200.
fn campaign_error_response(e: CampaignError) -> HttpResponse {
    let status = match &e {
        CampaignError::Validation(_) | CampaignError::CredentialsMissing => {
            StatusCode::BAD_REQUEST
        }
        CampaignError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        CampaignError::Db(_) | CampaignError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    HttpResponse::build(status).json(json!({
        "error": e.to_string()
    }))
}
