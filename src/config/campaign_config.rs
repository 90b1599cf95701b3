//! config/campaign_config.rs
//! Límites y tiempos del pipeline de campañas (valores del MVP).

use serde::{Deserialize, Serialize};

/// Configuración global de campañas, con valores por defecto.
/// Los tests la construyen con otros tiempos; producción usa `Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignGlobalConfig {
    /// Máximo acumulado de filas "sent" por usuario
    pub quota_ceiling: i64,
    /// Pausa entre destinatarios consecutivos (segundos)
    pub pacing_secs: u64,
    /// Máximo de contactos por usuario
    pub max_contacts: i64,
    /// Timeout por envío SMTP (segundos)
    pub smtp_timeout_secs: u64,
}

impl Default for CampaignGlobalConfig {
    fn default() -> Self {
        CampaignGlobalConfig {
            quota_ceiling: 20,
            pacing_secs: 60,
            max_contacts: 10,
            smtp_timeout_secs: 30,
        }
    }
}
