use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fila de entrada. `processed` pasa a `true` cuando su salida se escribió.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInput {
    pub id: i64,
    pub name: String,
    pub data: String,
    pub status: i32,
    pub processed: bool,
}

/// Resultado de procesar una `BatchInput` contra la API externa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutput {
    pub input_id: i64,
    pub name: String,
    pub original_data: String,
    pub processed_data: String,
    pub api_response: String,
    pub processed_at: DateTime<Utc>,
}
