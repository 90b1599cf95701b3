//! services/contact_service.rs
//! Contactos del CRM, acotados por usuario.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::models::contact_model::ContactRecord;

#[derive(Clone)]
pub struct ContactService {
    db_pool: Pool<Sqlite>,
    max_contacts: i64,
}

impl ContactService {
    pub fn new(db_pool: Pool<Sqlite>, max_contacts: i64) -> Self {
        ContactService {
            db_pool,
            max_contacts,
        }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<ContactRecord>> {
        let rows = sqlx::query_as::<_, ContactRecord>(
            r#"
            SELECT id, name, email, added_via, created_at
            FROM contacts
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar contactos")?;

        Ok(rows)
    }

    /// Alta manual, respetando el tope por usuario.
    pub async fn add(&self, user_id: &str, name: &str, email: &str) -> Result<ContactRecord> {
        let current = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM contacts WHERE user_id = ?1"#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        if current >= self.max_contacts {
            return Err(anyhow!(
                "You can only add up to {} contacts",
                self.max_contacts
            ));
        }

        let record = ContactRecord {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            added_via: "manual".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO contacts (id, user_id, name, email, added_via, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(user_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.added_via)
        .bind(&record.created_at)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar contacto")?;

        Ok(record)
    }

    pub async fn delete(&self, user_id: &str, contact_id: &str) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM contacts WHERE id = ?1 AND user_id = ?2"#)
            .bind(contact_id)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar contacto")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Contact not found"));
        }

        Ok(())
    }
}
