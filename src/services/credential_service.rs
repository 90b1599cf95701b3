//! services/credential_service.rs
//! Credenciales SMTP por usuario (una fila, upsert por user_id).

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::models::credential_model::CredentialRecord;

#[derive(Clone, Debug)]
pub struct CredentialService {
    db_pool: Pool<Sqlite>,
}

impl CredentialService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        CredentialService { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo al correr migraciones")?;
        Ok(())
    }

    /// Crea en el primer save, sobreescribe en los siguientes.
    pub async fn save(&self, user_id: &str, email: &str, app_password: &str) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let encrypted = encode_secret(app_password);

        sqlx::query(
            r#"
            INSERT INTO smtp_credentials (
                id, user_id, email, encrypted_password, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                email = excluded.email,
                encrypted_password = excluded.encrypted_password,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(email)
        .bind(&encrypted)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al guardar smtp_credentials")?;

        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<CredentialRecord>> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT user_id, email, encrypted_password, updated_at
            FROM smtp_credentials
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al leer smtp_credentials")?;

        Ok(record)
    }

    pub async fn delete(&self, user_id: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM smtp_credentials WHERE user_id = ?1"#)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar smtp_credentials")?;

        Ok(())
    }
}

// Codificación reversible del secreto (base64, no es cifrado).
// Se decodifica únicamente al autenticar contra el SMTP.

pub fn encode_secret(plain: &str) -> String {
    base64::encode(plain.as_bytes())
}

pub fn decode_secret(encoded: &str) -> Result<String> {
    let bytes = base64::decode(encoded).context("No se pudo decodificar el secreto SMTP")?;
    String::from_utf8(bytes).map_err(|_| anyhow!("El secreto SMTP no es UTF-8 válido"))
}
