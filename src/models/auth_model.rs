use serde::{Deserialize, Serialize};

/// Usuario resuelto por el proveedor de identidad a partir del bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}
