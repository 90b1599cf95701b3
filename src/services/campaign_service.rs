//! services/campaign_service.rs
//! Orquestador de campañas: cuota, generación, entrega y ledger.

use anyhow::{Context, Result};
use chrono::Utc;
use lettre::Address;
use sqlx::{Pool, Sqlite};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    config::campaign_config::CampaignGlobalConfig,
    models::{
        auth_model::AuthUser,
        campaign_model::{
            CampaignError, CampaignRecord, CampaignStatus, ListCampaignsResponse, QuotaResponse,
            Recipient, RecipientResult, SendCampaignRequest,
        },
    },
    services::{
        content_service::ContentService,
        credential_service::CredentialService,
        mail_service::{self, MailService},
    },
};

#[derive(Clone)]
pub struct CampaignService {
    db_pool: Pool<Sqlite>,
    content_service: ContentService,
    mail_service: MailService,
    credential_service: CredentialService,
    config: CampaignGlobalConfig,
}

impl CampaignService {
    pub fn new(
        db_pool: Pool<Sqlite>,
        content_service: ContentService,
        mail_service: MailService,
        credential_service: CredentialService,
        config: CampaignGlobalConfig,
    ) -> Self {
        CampaignService {
            db_pool,
            content_service,
            mail_service,
            credential_service,
            config,
        }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo al correr migraciones")?;
        Ok(())
    }

    // ======================================================
    // Dispatch del batch completo
    // ======================================================

    /// Procesa una campaña. Validación, credenciales y cuota rechazan el
    /// batch completo sin escribir nada; las fallas de generación/entrega
    /// son por destinatario: quedan en el ledger y en `results`, y el
    /// batch sigue con el siguiente.
    pub async fn process_campaign(
        &self,
        user: &AuthUser,
        req: SendCampaignRequest,
    ) -> Result<Vec<RecipientResult>, CampaignError> {
        let subject = req.subject.trim().to_string();
        let prompt = req.prompt.trim().to_string();

        if subject.is_empty() {
            return Err(CampaignError::Validation("Subject is required".into()));
        }
        if prompt.is_empty() {
            return Err(CampaignError::Validation("Prompt is required".into()));
        }
        if req.recipients.is_empty() {
            return Err(CampaignError::Validation(
                "At least one recipient is required".into(),
            ));
        }

        let recipients: Vec<Recipient> = req.recipients.into_iter().map(Recipient::from).collect();
        for r in &recipients {
            if r.email.parse::<Address>().is_err() {
                return Err(CampaignError::Validation(format!(
                    "Invalid recipient email: {}",
                    r.email
                )));
            }
        }

        // Sin credenciales SMTP no sale nada: se rechaza el batch entero.
        let credential = self
            .credential_service
            .get(&user.id)
            .await
            .map_err(CampaignError::Internal)?
            .ok_or(CampaignError::CredentialsMissing)?;

        // La cuota se verifica contra el tamaño del batch, antes del
        // primer envío. Nunca se ejecuta un batch parcial.
        let already_sent = self.count_sent(&user.id).await?;
        let batch = recipients.len() as i64;
        if already_sent + batch > self.config.quota_ceiling {
            return Err(CampaignError::QuotaExceeded {
                remaining: (self.config.quota_ceiling - already_sent).max(0),
                limit: self.config.quota_ceiling,
            });
        }

        log::info!(
            "(process_campaign) Iniciando campaña de {} destinatarios para user_id={}",
            recipients.len(),
            user.id
        );

        let total = recipients.len();
        let mut results = Vec::with_capacity(total);

        for (i, recipient) in recipients.iter().enumerate() {
            let outcome = self
                .dispatch_one(
                    user,
                    &credential.email,
                    &credential.encrypted_password,
                    &subject,
                    &prompt,
                    recipient,
                )
                .await?;
            results.push(outcome);

            // Pausa fija entre destinatarios; el último no espera.
            // El sleep suspende solo esta request, no el runtime.
            if i + 1 < total {
                log::info!(
                    "(process_campaign) Esperando {}s antes del siguiente envío...",
                    self.config.pacing_secs
                );
                tokio::time::sleep(Duration::from_secs(self.config.pacing_secs)).await;
            }
        }

        log::info!(
            "(process_campaign) Campaña finalizada para user_id={}.",
            user.id
        );
        Ok(results)
    }

    /// Un destinatario: generar -> entregar -> registrar. Solo los errores
    /// del ledger escapan; todo lo demás termina en una fila failed.
    async fn dispatch_one(
        &self,
        user: &AuthUser,
        from_address: &str,
        from_secret: &str,
        subject: &str,
        prompt: &str,
        recipient: &Recipient,
    ) -> Result<RecipientResult, CampaignError> {
        let body = match self.content_service.generate(prompt, recipient).await {
            Ok(text) => text,
            Err(e) => {
                log::error!(
                    "(process_campaign) Falla de generación para {}: {:?}",
                    recipient.email,
                    e
                );
                self.insert_record(&user.id, subject, "", &recipient.email, CampaignStatus::Failed)
                    .await?;
                return Ok(RecipientResult {
                    email: recipient.email.clone(),
                    status: CampaignStatus::Failed,
                    error: Some(format!("Content generation failed: {e}")),
                });
            }
        };

        let content = append_connect_cta(&body, user.email.as_deref());
        let html_body = mail_service::render_html_body(&content);

        match self
            .mail_service
            .send(
                from_address,
                from_secret,
                &recipient.email,
                subject,
                &content,
                &html_body,
            )
            .await
        {
            Ok(()) => {
                self.insert_record(
                    &user.id,
                    subject,
                    &content,
                    &recipient.email,
                    CampaignStatus::Sent,
                )
                .await?;
                log::info!("(process_campaign) Enviado a {}", recipient.email);
                Ok(RecipientResult {
                    email: recipient.email.clone(),
                    status: CampaignStatus::Sent,
                    error: None,
                })
            }
            Err(e) => {
                log::error!(
                    "(process_campaign) Falla de entrega para {}: {:?}",
                    recipient.email,
                    e
                );
                // La fila conserva el contenido que sí se generó
                self.insert_record(
                    &user.id,
                    subject,
                    &content,
                    &recipient.email,
                    CampaignStatus::Failed,
                )
                .await?;
                Ok(RecipientResult {
                    email: recipient.email.clone(),
                    status: CampaignStatus::Failed,
                    error: Some(format!("Delivery failed: {e}")),
                })
            }
        }
    }

    // ======================================================
    // Ledger (email_campaigns): append-only
    // ======================================================

    async fn insert_record(
        &self,
        user_id: &str,
        subject: &str,
        content: &str,
        recipient_email: &str,
        status: CampaignStatus,
    ) -> Result<(), sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let sent_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO email_campaigns (
                id, user_id, subject, content, recipient_email, status, sent_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(subject)
        .bind(content)
        .bind(recipient_email)
        .bind(status.as_str())
        .bind(sent_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    /// Filas "sent" acumuladas del usuario: la base de la cuota.
    pub async fn count_sent(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM email_campaigns WHERE user_id = ?1 AND status = 'sent'"#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await
    }

    pub async fn quota(&self, user_id: &str) -> Result<QuotaResponse, sqlx::Error> {
        let sent = self.count_sent(user_id).await?;
        Ok(QuotaResponse {
            sent,
            limit: self.config.quota_ceiling,
            remaining: (self.config.quota_ceiling - sent).max(0),
        })
    }

    /// Historial del usuario con paginación, lo más nuevo primero.
    pub async fn list_campaigns(
        &self,
        user_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<ListCampaignsResponse> {
        let page = page.max(1);
        let offset = (page - 1) * page_size;

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM email_campaigns WHERE user_id = ?1"#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await? as u64;

        let items = sqlx::query_as::<_, CampaignRecord>(
            r#"
            SELECT id, subject, content, recipient_email, status, sent_at
            FROM email_campaigns
            WHERE user_id = ?1
            ORDER BY sent_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(user_id)
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ListCampaignsResponse {
            total,
            page,
            page_size,
            items,
        })
    }
}

/// Pie con el link de contacto del dueño. Solo si hay URL pública
/// configurada; con la variable vacía el link saldría roto.
fn append_connect_cta(body: &str, owner_email: Option<&str>) -> String {
    let base_url = std::env::var("APP_BASE_URL").unwrap_or_default();
    if base_url.is_empty() {
        return body.to_string();
    }

    let encoded = urlencoding::encode(owner_email.unwrap_or_default());
    format!("{body}\n\n---\n\nInterested? Click here to connect: {base_url}/add-contact?email={encoded}")
}
