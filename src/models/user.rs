//! Identidad del titular
//!
//! `UserIdentity` viene de `applyRecordController/getJsrxx` y se copia al
//! formulario de solicitud. La misma llamada sirve para comprobar que un
//! token guardado sigue siendo válido.

use serde::Deserialize;

use super::lenient;
use crate::utils::errors::{data_absent_error, AppResult};

/// Nombre legal y número de documento del conductor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    #[serde(rename = "jsrxm", deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(rename = "jszh", deserialize_with = "lenient::string")]
    pub id_number: String,
}

impl UserIdentity {
    /// Parsear el campo `data` de `getJsrxx`; sin objeto no hay identidad
    pub fn from_api_data(data: serde_json::Value) -> AppResult<Self> {
        if !data.is_object() {
            return Err(data_absent_error("user identity"));
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Nombre y documento presentes; sin ellos no se puede enviar una solicitud
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.id_number.trim().is_empty()
    }

    /// Nombre enmascarado para logs: sólo el primer carácter
    pub fn masked_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => format!("{}{}", first, "*".repeat(chars.count())),
            None => String::new(),
        }
    }
}
