// src/models/auth.rs

use serde::{Deserialize, Serialize};

// Estrutura de dados ("claims") dentro do JWT emitido pela plataforma
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // ID do colaborador
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}
