//! Configuración de variables de entorno
//!
//! Este módulo maneja las URLs de los servicios externos y las opciones de
//! ejecución. `.env` se carga en `main` con dotenvy antes de leerla.

use std::env;

use crate::models::FormVersion;
use crate::utils::errors::{configuration_error, AppResult};

pub const DEFAULT_BJT_URL: &str = "https://bjt.beijing.gov.cn";
pub const DEFAULT_USERS_FILE: &str = "users.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// Base del API de permisos (jtgl)
    pub jtgl_url: String,
    /// Base del proveedor de identidad
    pub bjt_url: String,
    /// Endpoint del OCR de captchas; sin él no hay login automático
    pub ocr_url: Option<String>,
    pub users_file: String,
    pub form_version: FormVersion,
    pub log_level: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl EnvironmentConfig {
    pub fn from_env() -> AppResult<Self> {
        let jtgl_url = non_empty_var("JTGL_URL").ok_or_else(|| configuration_error("JTGL_URL must be set"))?;

        let form_version = match non_empty_var("APPLY_FORM_VERSION") {
            Some(value) => FormVersion::from_name(&value).ok_or_else(|| {
                configuration_error(&format!("APPLY_FORM_VERSION must be v1 or v2, got '{}'", value))
            })?,
            None => FormVersion::default(),
        };

        Ok(Self {
            jtgl_url,
            bjt_url: non_empty_var("BJT_URL").unwrap_or_else(|| DEFAULT_BJT_URL.to_string()),
            ocr_url: non_empty_var("OCR_URL"),
            users_file: non_empty_var("USERS_FILE").unwrap_or_else(|| DEFAULT_USERS_FILE.to_string()),
            form_version,
            log_level: non_empty_var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Verificar si el login automático está disponible
    pub fn can_login(&self) -> bool {
        self.ocr_url.is_some()
    }
}
