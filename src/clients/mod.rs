//! Clients - HTTP Clients for External APIs
//!
//! Este módulo contiene los clientes HTTP del API de permisos y del
//! proveedor de identidad, junto con los traits que usa el orquestador para
//! poder sustituirlos en tests.

use async_trait::async_trait;

use crate::models::{AccountStatus, ApiResponse, ApplicationRequest, AttemptResult, UserIdentity, VehicleRecord};
use crate::utils::errors::AppResult;

pub mod captcha_client;
pub mod identity_client;
pub mod permit_client;

pub use captcha_client::HttpCaptchaSolver;
pub use identity_client::IdentityProviderClient;
pub use permit_client::PermitApiClient;

/// API de permisos; todas las llamadas van autenticadas con el token del usuario
#[async_trait]
pub trait PermitApi: Send + Sync {
    async fn fetch_state(&self, token: &str) -> AppResult<AccountStatus>;
    async fn list_vehicles(&self, token: &str) -> AppResult<Vec<VehicleRecord>>;
    async fn get_user_identity(&self, token: &str) -> AppResult<UserIdentity>;
    async fn submit(&self, token: &str, request: &ApplicationRequest) -> AppResult<ApiResponse>;
    async fn add_vehicle(&self, token: &str, vehicle: &VehicleRecord) -> AppResult<ApiResponse>;
    async fn delete_vehicle(&self, token: &str, vehicle_id: &str) -> AppResult<ApiResponse>;
}

/// Proveedor de identidad
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Un único intento de login con una sesión nueva (cookies y captcha nuevos)
    async fn attempt_login(&self, phone: &str, password: &str) -> AttemptResult;

    /// Canjea la URL de redirección por el token del API de permisos
    async fn exchange_token(&self, redirect_url: &str) -> AppResult<String>;
}

/// Resolución de captchas numéricos
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    async fn solve(&self, image: &[u8]) -> AppResult<String>;
}
