//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema de renovación
//! y el código estable que se usa en los logs de cada usuario.

use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Faltan credenciales o la configuración es inválida; el usuario se omite
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rechazo definitivo del proveedor de identidad (credenciales incorrectas)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Cuenta bloqueada por demasiados intentos
    #[error("Account locked: {0}")]
    AccountLocked(String),

    #[error("Transient network error: {0}")]
    TransientNetwork(#[from] reqwest::Error),

    /// Respuesta con `code != 200` o estado HTTP inesperado del API upstream
    #[error("Upstream protocol error at {endpoint}: code={code}, message={message}")]
    UpstreamProtocol {
        endpoint: String,
        code: i64,
        message: String,
    },

    #[error("Data absent: {0}")]
    DataAbsent(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl AppError {
    /// Código estable para logs y notificaciones
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIG_ERROR",
            AppError::Authentication(_) => "AUTH_FAILED",
            AppError::AccountLocked(_) => "ACCOUNT_LOCKED",
            AppError::TransientNetwork(_) => "NETWORK_ERROR",
            AppError::UpstreamProtocol { .. } => "UPSTREAM_ERROR",
            AppError::DataAbsent(_) => "DATA_ABSENT",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Crypto(_) => "CRYPTO_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Usuario mal configurado: se omite sin contarlo como fallo
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::Configuration(_) | AppError::Validation(_))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de configuración
pub fn configuration_error(message: &str) -> AppError {
    AppError::Configuration(message.to_string())
}

/// Función helper para crear errores de protocolo upstream
pub fn upstream_error(endpoint: &str, code: i64, message: &str) -> AppError {
    AppError::UpstreamProtocol {
        endpoint: endpoint.to_string(),
        code,
        message: message.to_string(),
    }
}

/// Función helper para crear errores de datos ausentes
pub fn data_absent_error(resource: &str) -> AppError {
    AppError::DataAbsent(format!("no {} found", resource))
}

/// Función helper para crear errores de cifrado
pub fn crypto_error(message: impl std::fmt::Display) -> AppError {
    AppError::Crypto(message.to_string())
}
