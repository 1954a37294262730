//! Respuestas del proveedor de identidad y estados del login
//!
//! Un intento se clasifica por `meta.code`; el bucle de intentos termina en
//! un [`LoginOutcome`].

use serde::Deserialize;

use super::lenient;

/// Código del proveedor: credenciales incorrectas
pub const CODE_WRONG_CREDENTIALS: &str = "5019";
/// Código del proveedor: cuenta bloqueada por demasiados intentos
pub const CODE_ACCOUNT_LOCKED: &str = "5016";

/// Número máximo de intentos de login por ejecución
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Bloque `meta` de la respuesta de `doUserLoginByPwd`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderMeta {
    #[serde(deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(deserialize_with = "lenient::string")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderLoginData {
    #[serde(deserialize_with = "lenient::string")]
    pub redirect_url: String,
}

/// Respuesta de login del proveedor de identidad
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderLoginResponse {
    pub meta: ProviderMeta,
    pub data: Option<ProviderLoginData>,
}

/// Resultado de un único intento de login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Redirect(String),
    WrongCredentials(String),
    Locked(String),
    /// Fallo de red, HTTP inesperado o respuesta sin redirección: consume un intento
    Transient(String),
}

impl ProviderLoginResponse {
    /// Clasificar la respuesta según `meta.code`
    pub fn classify(&self) -> AttemptResult {
        match self.meta.code.as_str() {
            CODE_WRONG_CREDENTIALS => AttemptResult::WrongCredentials(self.meta.message.clone()),
            CODE_ACCOUNT_LOCKED => AttemptResult::Locked(self.meta.message.clone()),
            _ => match self.data.as_ref().map(|d| d.redirect_url.as_str()) {
                Some(url) if !url.is_empty() => AttemptResult::Redirect(url.to_string()),
                _ => AttemptResult::Transient(format!(
                    "respuesta sin redirectUrl (code={}, message={})",
                    self.meta.code, self.meta.message
                )),
            },
        }
    }
}

/// Estado terminal de la máquina de login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success { redirect_url: String, attempts: u32 },
    Rejected { message: String, attempts: u32 },
    Locked { message: String, attempts: u32 },
    Exhausted { last_error: String, attempts: u32 },
}

impl LoginOutcome {
    /// Intentos consumidos hasta llegar al estado terminal
    pub fn attempts(&self) -> u32 {
        match self {
            LoginOutcome::Success { attempts, .. }
            | LoginOutcome::Rejected { attempts, .. }
            | LoginOutcome::Locked { attempts, .. }
            | LoginOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }
}
