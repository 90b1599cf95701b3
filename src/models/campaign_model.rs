use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request del endpoint de campañas.
/// `recipients` acepta dos formatos (ver `RecipientEntry`).
#[derive(Debug, Clone, Deserialize)]
pub struct SendCampaignRequest {
    pub subject: String,
    pub prompt: String,
    pub recipients: Vec<RecipientEntry>,
}

/// Dos formatos de destinatario según el modo de campaña:
/// `"john@company.com"` o `{"email": "...", "name": "...", "company": "..."}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipientEntry {
    Plain(String),
    Detailed {
        email: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        company: Option<String>,
    },
}

/// Destinatario ya normalizado (name/company vacíos => None).
#[derive(Debug, Clone)]
pub struct Recipient {
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
}

impl From<RecipientEntry> for Recipient {
    fn from(entry: RecipientEntry) -> Self {
        match entry {
            RecipientEntry::Plain(email) => Recipient {
                email: email.trim().to_string(),
                name: None,
                company: None,
            },
            RecipientEntry::Detailed {
                email,
                name,
                company,
            } => Recipient {
                email: email.trim().to_string(),
                name: non_empty(name),
                company: non_empty(company),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Sent,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Sent => "sent",
            CampaignStatus::Failed => "failed",
        }
    }
}

/// Una entrada del arreglo `results`, en el mismo orden que el request.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientResult {
    pub email: String,
    pub status: CampaignStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<RecipientResult>,
}

/// Fila del ledger `email_campaigns`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignRecord {
    pub id: String,
    pub subject: String,
    pub content: String,
    pub recipient_email: String,
    pub status: String,
    pub sent_at: String,
}

/// Para listar el historial con paginación
#[derive(Debug, Clone, Serialize)]
pub struct ListCampaignsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<CampaignRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    pub sent: i64,
    pub limit: i64,
    pub remaining: i64,
}

/// Errores a nivel de batch: abortan antes de procesar destinatarios.
/// Las fallas de generación/entrega son por destinatario y viajan dentro
/// de `RecipientResult`, nunca por acá.
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("{0}")]
    Validation(String),

    #[error("SMTP credentials not configured")]
    CredentialsMissing,

    #[error("Email limit reached. You have {remaining} of {limit} remaining.")]
    QuotaExceeded { remaining: i64, limit: i64 },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
