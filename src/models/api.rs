//! Envoltorio `{code, msg, data}` de todas las respuestas del API de permisos

use serde::Deserialize;
use serde_json::Value;

use super::lenient;

pub const CODE_OK: i64 = 200;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    #[serde(deserialize_with = "lenient::int")]
    pub code: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub msg: String,
    pub data: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }
}
