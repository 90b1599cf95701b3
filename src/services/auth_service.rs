//! services/auth_service.rs
//! Resolución del bearer token contra el proveedor de identidad externo.

use actix_web::HttpRequest;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::env;

use crate::models::auth_model::AuthUser;

#[derive(Clone)]
pub struct AuthService {
    http_client: Client,
}

impl AuthService {
    pub fn new() -> Self {
        AuthService {
            http_client: Client::new(),
        }
    }

    /// Pregunta al proveedor de identidad quién es el dueño del token.
    /// Cualquier respuesta no-2xx se trata como token inválido.
    pub async fn get_user(&self, token: &str) -> Result<AuthUser> {
        let base_url =
            env::var("AUTH_API_URL").map_err(|_| anyhow!("No se definió AUTH_API_URL"))?;
        let service_key =
            env::var("AUTH_SERVICE_KEY").map_err(|_| anyhow!("No se definió AUTH_SERVICE_KEY"))?;

        let user_url = format!("{}/auth/v1/user", base_url.trim_end_matches('/'));
        let resp = self
            .http_client
            .get(&user_url)
            .bearer_auth(token)
            .header("apikey", service_key)
            .send()
            .await
            .context("Fallo al consultar el proveedor de identidad")?;

        if !resp.status().is_success() {
            return Err(anyhow!(
                "Token rechazado por el proveedor de identidad ({})",
                resp.status()
            ));
        }

        let json_val = resp.json::<serde_json::Value>().await?;
        let id = json_val
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Respuesta del proveedor sin campo id"))?
            .to_string();
        let email = json_val
            .get("email")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(AuthUser { id, email })
    }
}

/// Extrae el bearer token del header Authorization, si viene.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}
