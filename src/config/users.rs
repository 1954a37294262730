//! Configuración por usuario
//!
//! Lista JSON de usuarios (`USERS_FILE`). Si el fichero no existe se arma un
//! único usuario desde `AUTH`, `BJT_PHONE`, `BJT_PWD`, `BARK_KEY`,
//! `NOTIFY_URLS` y `PERMIT_TYPE`. Los tokens obtenidos por login se escriben
//! de vuelta en el fichero.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

use crate::models::apply::{PermitType, DEFAULT_DESTINATION};
use crate::utils::errors::{configuration_error, AppResult};
use crate::utils::validation::{validate_not_empty, validate_permit_type, validate_phone};

pub const DEFAULT_PERMIT_TYPE: &str = "within-six-ring-road";
pub const ENV_USER_NAME: &str = "default";

fn default_permit_type() -> String {
    DEFAULT_PERMIT_TYPE.to_string()
}

/// Configuración de un usuario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_credential_pair"))]
pub struct UserConfig {
    #[validate(custom = "validate_not_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Token del API de permisos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default)]
    pub notify_urls: Vec<String>,
    #[serde(default = "default_permit_type")]
    #[validate(custom = "validate_permit_type")]
    pub permit_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Teléfono y contraseña van juntos
fn validate_credential_pair(config: &UserConfig) -> Result<(), ValidationError> {
    if config.phone.is_some() != config.password.is_some() {
        return Err(ValidationError::new("phone_and_password_required_together"));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl UserConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            phone: None,
            password: None,
            auth: None,
            notify_urls: Vec::new(),
            permit_type: default_permit_type(),
            destination: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(&self.auth)
    }

    /// Teléfono y contraseña, si ambos están configurados
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.phone)?, non_empty(&self.password)?))
    }

    pub fn permit_type(&self) -> PermitType {
        PermitType::from_selector(&self.permit_type)
    }

    pub fn destination(&self) -> &str {
        non_empty(&self.destination).unwrap_or(DEFAULT_DESTINATION)
    }

    /// Validación completa; un usuario sin token ni credenciales no es ejecutable
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.token().is_none() && self.credentials().is_none() {
            return Err(configuration_error(&format!(
                "user '{}' has neither a token nor phone/password",
                self.name
            )));
        }
        Ok(())
    }
}

/// Usuario único a partir de variables sueltas; `None` si no hay token ni credenciales
pub fn user_from_vars<F>(get: F) -> Option<UserConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let mut user = UserConfig::new(ENV_USER_NAME);
    user.auth = get("AUTH");
    user.phone = get("BJT_PHONE");
    user.password = get("BJT_PWD");

    if user.auth.is_none() && user.phone.is_none() && user.password.is_none() {
        return None;
    }

    user.notify_urls.extend(get("BARK_KEY"));
    if let Some(urls) = get("NOTIFY_URLS") {
        user.notify_urls
            .extend(urls.split(',').map(str::trim).filter(|u| !u.is_empty()).map(str::to_string));
    }
    if let Some(permit_type) = get("PERMIT_TYPE") {
        user.permit_type = permit_type;
    }

    Some(user)
}

/// Almacén de configuración de usuarios
#[derive(Debug, Clone)]
pub struct UserConfigStore {
    path: PathBuf,
}

impl UserConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cargar usuarios del fichero o, si no existe, del entorno
    pub async fn load(&self) -> AppResult<Vec<UserConfig>> {
        if tokio::fs::try_exists(&self.path).await? {
            let data = tokio::fs::read_to_string(&self.path).await?;
            let users: Vec<UserConfig> = serde_json::from_str(&data)?;
            tracing::info!("📋 {} usuarios cargados de {}", users.len(), self.path.display());
            return Ok(users);
        }

        match user_from_vars(|key| env::var(key).ok()) {
            Some(user) => {
                tracing::info!("📋 {} no existe, usando usuario del entorno", self.path.display());
                Ok(vec![user])
            }
            None => Err(configuration_error(&format!(
                "{} not found and no AUTH/BJT_PHONE in environment",
                self.path.display()
            ))),
        }
    }

    /// Guardar el token nuevo de un usuario conservando el resto del fichero
    pub async fn save_token(&self, name: &str, token: &str) -> AppResult<bool> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::debug!("💾 Sin fichero de usuarios, el token de [{}] no se persiste", name);
            return Ok(false);
        }

        let data = tokio::fs::read_to_string(&self.path).await?;
        let mut users: Vec<Value> = serde_json::from_str(&data)?;

        let entry = users
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|user| user.get("name").and_then(Value::as_str) == Some(name));

        match entry {
            Some(user) => {
                user.insert("auth".to_string(), Value::String(token.to_string()));
                let data = serde_json::to_string_pretty(&users)?;
                tokio::fs::write(&self.path, data).await?;
                tracing::info!("💾 Token de [{}] guardado en {}", name, self.path.display());
                Ok(true)
            }
            None => {
                tracing::warn!("⚠️ Usuario [{}] no encontrado en {}", name, self.path.display());
                Ok(false)
            }
        }
    }
}
