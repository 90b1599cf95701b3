//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod auth_service;
pub mod campaign_service;
pub mod contact_service;
pub mod content_service;
pub mod credential_service;
pub mod mail_service;
