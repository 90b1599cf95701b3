//! services/mail_service.rs
//! Entrega de un mensaje por sesión SMTP (perfil fijo de Gmail).

use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use crate::services::credential_service;

const SMTP_HOST: &str = "smtp.gmail.com";
/// 465: TLS implícito desde el primer byte
const SMTP_PORT: u16 = 465;

#[derive(Debug, Clone)]
pub struct MailService {
    smtp_host: String,
    smtp_port: u16,
    send_timeout: Duration,
}

impl MailService {
    pub fn new(smtp_timeout_secs: u64) -> Self {
        MailService {
            smtp_host: SMTP_HOST.to_string(),
            smtp_port: SMTP_PORT,
            send_timeout: Duration::from_secs(smtp_timeout_secs),
        }
    }

    /// Constructor de test: apunta el transporte a otro host/puerto.
    #[cfg(test)]
    pub fn new_test(smtp_host: String, smtp_port: u16) -> Self {
        MailService {
            smtp_host,
            smtp_port,
            send_timeout: Duration::from_secs(5),
        }
    }

    /// Envía un solo mensaje autenticado con la identidad del usuario.
    /// El secreto llega codificado y se decodifica recién acá, al armar
    /// la autenticación. Sin reintentos: la política de reintento, si la
    /// hubiera, es del orquestador. El transporte se libera al salir,
    /// haya error o no.
    pub async fn send(
        &self,
        from_address: &str,
        from_secret: &str,
        to_address: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<()> {
        let from: Mailbox = from_address.parse().context("Invalid from address")?;
        let to: Mailbox = to_address.parse().context("Invalid recipient address")?;
        let password = credential_service::decode_secret(from_secret)?;

        let tls_params = TlsParameters::new(self.smtp_host.clone())?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_host)?
            .port(self.smtp_port)
            .credentials(Credentials::new(from_address.to_string(), password))
            .tls(Tls::Wrapper(tls_params))
            .build();

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::parse("text/html; charset=utf-8")?)
                            .body(html_body.to_string()),
                    ),
            )?;

        tokio::time::timeout(self.send_timeout, mailer.send(message))
            .await
            .context("Timeout enviando por SMTP")??;

        Ok(())
    }
}

/// Render HTML mínimo del cuerpo: escapa `&`, `<`, `>`; línea en blanco
/// separa párrafos, salto simple pasa a `<br>`.
pub fn render_html_body(plain: &str) -> String {
    let escaped = plain
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    escaped
        .split("\n\n")
        .map(|p| format!("<p>{}</p>", p.trim_matches('\n').replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}
