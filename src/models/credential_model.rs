use serde::{Deserialize, Serialize};

/// Body de POST /api/smtp/save. El campo viene como `appPassword`
/// (app password de Gmail, no la contraseña de la cuenta).
#[derive(Debug, Clone, Deserialize)]
pub struct SaveSmtpRequest {
    pub email: String,
    #[serde(rename = "appPassword")]
    pub app_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmtpCheckResponse {
    pub configured: bool,
    pub email: Option<String>,
}

/// Fila de `smtp_credentials`. El secreto se guarda codificado y solo
/// se decodifica al momento de autenticar contra el SMTP.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    pub user_id: String,
    pub email: String,
    pub encrypted_password: String,
    pub updated_at: String,
}
