//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod auth_model;
pub mod campaign_model;
pub mod contact_model;
pub mod credential_model;
