//! tests/campaign_tests.rs
//! Pruebas del pipeline de campañas sobre SQLite en memoria.
//! Los colaboradores externos se apuntan a puertos locales cerrados
//! (fallan rápido) o a un servidor actix de mentira cuando la
//! generación debe salir bien.

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Row, Sqlite};

    use crate::config::campaign_config::CampaignGlobalConfig;
    use crate::models::auth_model::AuthUser;
    use crate::models::campaign_model::{
        CampaignError, CampaignStatus, Recipient, RecipientEntry, SendCampaignRequest,
    };
    use crate::services::campaign_service::CampaignService;
    use crate::services::contact_service::ContactService;
    use crate::services::content_service::ContentService;
    use crate::services::credential_service::{self, CredentialService};
    use crate::services::mail_service::{self, MailService};

    // Helper: pool en memoria con las migraciones reales.
    // Una sola conexión: con más, cada una vería su propia DB en memoria.
    async fn setup_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("No se pudo abrir SQLite en memoria");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Fallo en migraciones de test");

        pool
    }

    fn test_user() -> AuthUser {
        AuthUser {
            id: "user-1".to_string(),
            email: Some("owner@example.com".to_string()),
        }
    }

    fn test_config(pacing_secs: u64) -> CampaignGlobalConfig {
        CampaignGlobalConfig {
            pacing_secs,
            ..CampaignGlobalConfig::default()
        }
    }

    // Helper: servicio con generador y SMTP inalcanzables (ambos fallan
    // con connection refused, sin tocar la red de verdad).
    fn unreachable_service(pool: Pool<Sqlite>, pacing_secs: u64) -> CampaignService {
        CampaignService::new(
            pool.clone(),
            ContentService::new_test("http://127.0.0.1:9".to_string()),
            MailService::new_test("127.0.0.1".to_string(), 9),
            CredentialService::new(pool),
            test_config(pacing_secs),
        )
    }

    // Helper: servidor local que responde como el chat de Cohere.
    async fn spawn_fake_generator() -> String {
        let server = HttpServer::new(|| {
            App::new().route(
                "/v1/chat",
                web::post().to(|| async {
                    HttpResponse::Ok().json(json!({
                        "text": "Hola equipo,\n\nEste es un correo de prueba.\n\nSaludos"
                    }))
                }),
            )
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("No se pudo bindear el generador de prueba");

        let addr = server.addrs()[0];
        actix_rt::spawn(server.run());

        format!("http://{}/v1/chat", addr)
    }

    async fn seed_sent_rows(pool: &Pool<Sqlite>, user_id: &str, n: usize) {
        for i in 0..n {
            sqlx::query(
                r#"
                INSERT INTO email_campaigns (id, user_id, subject, content, recipient_email, status, sent_at)
                VALUES (?1, ?2, 'seed', 'seed', ?3, 'sent', ?4)
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(format!("seed{}@x.com", i))
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(pool)
            .await
            .expect("Fallo sembrando filas sent");
        }
    }

    fn plain_recipients(emails: &[&str]) -> Vec<RecipientEntry> {
        emails
            .iter()
            .map(|e| RecipientEntry::Plain(e.to_string()))
            .collect()
    }

    fn campaign_request(recipients: Vec<RecipientEntry>) -> SendCampaignRequest {
        SendCampaignRequest {
            subject: "Hi".to_string(),
            prompt: "intro".to_string(),
            recipients,
        }
    }

    async fn ledger_rows(pool: &Pool<Sqlite>) -> Vec<(String, String, String)> {
        sqlx::query(
            r#"
            SELECT recipient_email, status, content
            FROM email_campaigns
            WHERE subject != 'seed'
            ORDER BY rowid
            "#,
        )
        .fetch_all(pool)
        .await
        .expect("Fallo leyendo el ledger")
        .iter()
        .map(|row| {
            (
                row.get("recipient_email"),
                row.get("status"),
                row.get("content"),
            )
        })
        .collect()
    }

    // ------------------------------------------------------------------
    // Validación y rechazos de batch completo
    // ------------------------------------------------------------------

    #[actix_rt::test]
    async fn test_validation_rejects_before_any_write() {
        let pool = setup_pool().await;
        let service = unreachable_service(pool.clone(), 0);
        let user = test_user();

        // Subject vacío (espacios no cuentan)
        let err = service
            .process_campaign(
                &user,
                SendCampaignRequest {
                    subject: "   ".to_string(),
                    prompt: "intro".to_string(),
                    recipients: plain_recipients(&["a@x.com"]),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));

        // Prompt vacío
        let err = service
            .process_campaign(
                &user,
                SendCampaignRequest {
                    subject: "Hi".to_string(),
                    prompt: "".to_string(),
                    recipients: plain_recipients(&["a@x.com"]),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));

        // Sin destinatarios
        let err = service
            .process_campaign(&user, campaign_request(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));

        // Email malformado
        let err = service
            .process_campaign(&user, campaign_request(plain_recipients(&["no-es-email"])))
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));

        assert!(ledger_rows(&pool).await.is_empty(), "Nada debió escribirse");
    }

    #[actix_rt::test]
    async fn test_missing_credentials_rejects_batch() {
        let pool = setup_pool().await;
        let service = unreachable_service(pool.clone(), 0);

        let err = service
            .process_campaign(
                &test_user(),
                campaign_request(plain_recipients(&["a@x.com", "b@x.com"])),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CampaignError::CredentialsMissing));
        assert!(ledger_rows(&pool).await.is_empty());
    }

    #[actix_rt::test]
    async fn test_quota_rejects_whole_batch() {
        let pool = setup_pool().await;
        let credentials = CredentialService::new(pool.clone());
        credentials
            .save("user-1", "owner@gmail.com", "app-pass")
            .await
            .unwrap();
        seed_sent_rows(&pool, "user-1", 19).await;

        let service = unreachable_service(pool.clone(), 0);
        let err = service
            .process_campaign(
                &test_user(),
                campaign_request(plain_recipients(&["a@x.com", "b@x.com"])),
            )
            .await
            .unwrap_err();

        match err {
            CampaignError::QuotaExceeded { remaining, limit } => {
                assert_eq!(remaining, 1);
                assert_eq!(limit, 20);
            }
            other => panic!("Se esperaba QuotaExceeded, llegó {:?}", other),
        }

        assert!(
            ledger_rows(&pool).await.is_empty(),
            "Un batch sobre cuota no debe escribir filas"
        );
    }

    #[actix_rt::test]
    async fn test_quota_counts_only_sent_rows() {
        std::env::set_var("COHERE_API_KEY", "test-key");

        let pool = setup_pool().await;
        let credentials = CredentialService::new(pool.clone());
        credentials
            .save("user-1", "owner@gmail.com", "app-pass")
            .await
            .unwrap();
        seed_sent_rows(&pool, "user-1", 19).await;

        let service = unreachable_service(pool.clone(), 0);

        // 19 sent + 1 = 20: justo en el tope, pasa. La generación falla
        // y deja una fila failed, que tampoco consume cuota.
        let results = service
            .process_campaign(&test_user(), campaign_request(plain_recipients(&["a@x.com"])))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CampaignStatus::Failed);

        assert_eq!(service.count_sent("user-1").await.unwrap(), 19);

        // Sigue quedando 1 slot: otro batch de 1 pasa el chequeo de cuota.
        let results = service
            .process_campaign(&test_user(), campaign_request(plain_recipients(&["b@x.com"])))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    // ------------------------------------------------------------------
    // Aislamiento de fallas por destinatario
    // ------------------------------------------------------------------

    #[actix_rt::test]
    async fn test_generation_failure_marks_failed_and_continues() {
        std::env::set_var("COHERE_API_KEY", "test-key");

        let pool = setup_pool().await;
        let credentials = CredentialService::new(pool.clone());
        credentials
            .save("user-1", "owner@gmail.com", "app-pass")
            .await
            .unwrap();

        let service = unreachable_service(pool.clone(), 0);
        let recipients = vec![
            RecipientEntry::Detailed {
                email: "a@x.com".to_string(),
                name: Some("Ana".to_string()),
                company: Some("Acme".to_string()),
            },
            RecipientEntry::Plain("b@x.com".to_string()),
        ];

        let results = service
            .process_campaign(&test_user(), campaign_request(recipients))
            .await
            .unwrap();

        // Resultados en el orden del request, todos failed, con detalle
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].email, "a@x.com");
        assert_eq!(results[1].email, "b@x.com");
        for r in &results {
            assert_eq!(r.status, CampaignStatus::Failed);
            assert!(r.error.is_some());
        }

        // Una fila por destinatario, mismo orden, contenido vacío
        // (la generación nunca produjo cuerpo)
        let rows = ledger_rows(&pool).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "a@x.com");
        assert_eq!(rows[1].0, "b@x.com");
        for (_, status, content) in &rows {
            assert_eq!(status, "failed");
            assert!(content.is_empty());
        }
    }

    #[actix_rt::test]
    async fn test_delivery_failure_preserves_content_and_continues() {
        std::env::set_var("COHERE_API_KEY", "test-key");

        let pool = setup_pool().await;
        let api_url = spawn_fake_generator().await;

        let credentials = CredentialService::new(pool.clone());
        credentials
            .save("user-1", "owner@gmail.com", "app-pass")
            .await
            .unwrap();

        // Generación OK, SMTP siempre falla
        let service = CampaignService::new(
            pool.clone(),
            ContentService::new_test(api_url),
            MailService::new_test("127.0.0.1".to_string(), 9),
            credentials,
            test_config(0),
        );

        let results = service
            .process_campaign(
                &test_user(),
                campaign_request(plain_recipients(&["a@x.com", "b@x.com"])),
            )
            .await
            .unwrap();

        // El batch completo se procesa y el envelope es de éxito aunque
        // todos los destinatarios hayan fallado
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == CampaignStatus::Failed));

        let rows = ledger_rows(&pool).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "a@x.com");
        assert_eq!(rows[1].0, "b@x.com");
        for (_, status, content) in &rows {
            assert_eq!(status, "failed");
            assert!(
                !content.is_empty(),
                "La falla de entrega conserva el contenido generado"
            );
        }
    }

    // ------------------------------------------------------------------
    // Pacing
    // ------------------------------------------------------------------

    #[actix_rt::test]
    async fn test_pacing_only_between_recipients() {
        std::env::set_var("COHERE_API_KEY", "test-key");

        let pool = setup_pool().await;
        let credentials = CredentialService::new(pool.clone());
        credentials
            .save("user-1", "owner@gmail.com", "app-pass")
            .await
            .unwrap();

        // Pacing de 1s; los colaboradores fallan en milisegundos, así
        // que el tiempo medido es básicamente el de las pausas.
        let service = unreachable_service(pool.clone(), 1);

        // 1 destinatario: ninguna pausa
        let start = Instant::now();
        service
            .process_campaign(&test_user(), campaign_request(plain_recipients(&["a@x.com"])))
            .await
            .unwrap();
        assert!(
            start.elapsed() < Duration::from_secs(1),
            "Un solo destinatario no debe esperar pacing"
        );

        // 3 destinatarios: exactamente dos pausas
        let start = Instant::now();
        service
            .process_campaign(
                &test_user(),
                campaign_request(plain_recipients(&["b@x.com", "c@x.com", "d@x.com"])),
            )
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(2),
            "Deben correr 2 pausas de 1s, tardó {:?}",
            elapsed
        );
        assert!(elapsed < Duration::from_secs(10), "Tardó demasiado: {:?}", elapsed);
    }

    // ------------------------------------------------------------------
    // Credenciales y contactos
    // ------------------------------------------------------------------

    #[actix_rt::test]
    async fn test_credential_roundtrip() {
        let pool = setup_pool().await;
        let service = CredentialService::new(pool.clone());

        assert!(service.get("user-1").await.unwrap().is_none());

        service
            .save("user-1", "a@gmail.com", "secret-1")
            .await
            .unwrap();
        let record = service.get("user-1").await.unwrap().unwrap();
        assert_eq!(record.email, "a@gmail.com");
        // Nunca en claro en la DB
        assert_ne!(record.encrypted_password, "secret-1");
        assert_eq!(
            credential_service::decode_secret(&record.encrypted_password).unwrap(),
            "secret-1"
        );

        // Upsert: sigue habiendo una sola fila por usuario
        service
            .save("user-1", "b@gmail.com", "secret-2")
            .await
            .unwrap();
        let record = service.get("user-1").await.unwrap().unwrap();
        assert_eq!(record.email, "b@gmail.com");
        assert_eq!(
            credential_service::decode_secret(&record.encrypted_password).unwrap(),
            "secret-2"
        );
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM smtp_credentials")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 1);

        service.delete("user-1").await.unwrap();
        assert!(service.get("user-1").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_contact_limit_per_user() {
        let pool = setup_pool().await;
        let service = ContactService::new(pool.clone(), 10);

        for i in 0..10 {
            service
                .add("user-1", &format!("Contacto {}", i), &format!("c{}@x.com", i))
                .await
                .unwrap();
        }

        let err = service.add("user-1", "Extra", "extra@x.com").await;
        assert!(err.is_err(), "El contacto 11 debe rechazarse");
        assert_eq!(service.list("user-1").await.unwrap().len(), 10);

        // El tope es por usuario, no global
        service.add("user-2", "Otro", "otro@x.com").await.unwrap();
        assert_eq!(service.list("user-2").await.unwrap().len(), 1);
    }

    // ------------------------------------------------------------------
    // Parsing y render (sin DB)
    // ------------------------------------------------------------------

    #[test]
    fn test_recipient_entry_accepts_both_shapes() {
        let plain: Vec<RecipientEntry> =
            serde_json::from_str(r#"["a@x.com", "b@x.com"]"#).unwrap();
        let normalized: Vec<Recipient> = plain.into_iter().map(Recipient::from).collect();
        assert_eq!(normalized[0].email, "a@x.com");
        assert!(normalized[0].name.is_none());

        let detailed: Vec<RecipientEntry> = serde_json::from_str(
            r#"[{"email": "a@x.com", "name": "Ana", "company": "Acme"},
                {"email": "b@x.com", "name": ""}]"#,
        )
        .unwrap();
        let normalized: Vec<Recipient> = detailed.into_iter().map(Recipient::from).collect();
        assert_eq!(normalized[0].name.as_deref(), Some("Ana"));
        assert_eq!(normalized[0].company.as_deref(), Some("Acme"));
        // name vacío queda como ausente
        assert!(normalized[1].name.is_none());
        assert!(normalized[1].company.is_none());
    }

    #[test]
    fn test_render_html_body() {
        let html = mail_service::render_html_body(
            "Hola <Ana> & equipo,\n\nSegunda línea\ncontinuación",
        );
        assert_eq!(
            html,
            "<p>Hola &lt;Ana&gt; &amp; equipo,</p>\n<p>Segunda línea<br>continuación</p>"
        );
    }
}
