//! services/content_service.rs
//! Generación del cuerpo del correo vía el chat de Cohere.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::env;

use crate::models::campaign_model::Recipient;

const COHERE_CHAT_URL: &str = "https://api.cohere.ai/v1/chat";
const COHERE_MODEL: &str = "command";
/// Temperatura alta para que cada correo salga distinto
const COHERE_TEMPERATURE: f64 = 0.8;

#[derive(Clone)]
pub struct ContentService {
    http_client: Client,
    api_url: String,
}

impl ContentService {
    pub fn new() -> Self {
        ContentService {
            http_client: Client::new(),
            api_url: COHERE_CHAT_URL.to_string(),
        }
    }

    /// Constructor de test: apunta el generador a otro endpoint.
    #[cfg(test)]
    pub fn new_test(api_url: String) -> Self {
        ContentService {
            http_client: Client::new(),
            api_url,
        }
    }

    /// Genera el cuerpo para un destinatario. Un solo intento: si falla,
    /// el error sube de inmediato al orquestador.
    pub async fn generate(&self, prompt: &str, recipient: &Recipient) -> Result<String> {
        let api_key =
            env::var("COHERE_API_KEY").map_err(|_| anyhow!("No se definió COHERE_API_KEY"))?;

        let payload = serde_json::json!({
            "model": COHERE_MODEL,
            "message": build_generation_message(prompt, recipient),
            "temperature": COHERE_TEMPERATURE,
        });

        let resp = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .context("Fallo al llamar al generador de contenido")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(anyhow!("El generador respondió {}: {}", status, body_txt));
        }

        let json_val = resp.json::<serde_json::Value>().await?;
        let text = json_val
            .get("text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(anyhow!("El generador devolvió contenido vacío"));
        }

        Ok(text)
    }
}

/// Instrucción fija + prompt del usuario + línea de personalización
/// si el destinatario trae nombre/empresa.
fn build_generation_message(prompt: &str, recipient: &Recipient) -> String {
    let mut message = format!(
        "Write a professional, friendly cold email based on this request: {prompt}\n\n\
         The email should:\n\
         - Sound natural and human-written\n\
         - Be concise and personalized\n\
         - Include a clear call-to-action\n\
         - Not be too salesy\n\
         - Be warm and approachable\n\n\
         Provide only the email content, no additional commentary."
    );

    match (&recipient.name, &recipient.company) {
        (Some(name), Some(company)) => {
            message.push_str(&format!("\n\nAddress the email to {name} from {company}."));
        }
        (Some(name), None) => {
            message.push_str(&format!("\n\nAddress the email to {name}."));
        }
        (None, Some(company)) => {
            message.push_str(&format!("\n\nThe recipient works at {company}."));
        }
        (None, None) => {}
    }

    message
}
