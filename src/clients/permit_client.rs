//! Cliente HTTP del API de permisos (jtgl)
//!
//! Todas las respuestas vienen envueltas en `{code, msg, data}`; cualquier
//! estado HTTP no exitoso o `code != 200` se convierte en
//! [`AppError::UpstreamProtocol`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use super::PermitApi;
use crate::models::{AccountStatus, ApiResponse, ApplicationRequest, UserIdentity, VehicleRecord};
use crate::utils::errors::{upstream_error, AppResult};

pub const STATE_LIST_PATH: &str = "/pro/applyRecordController/stateList";
pub const APPLY_PATH: &str = "/pro/applyRecordController/insertApplyRecord";
pub const USER_IDENTITY_PATH: &str = "/pro/applyRecordController/getJsrxx";
pub const VEHICLE_LIST_PATH: &str = "/pro//vehicleController/getUserIdInfo";
pub const VEHICLE_ADD_PATH: &str = "/pro//relationController/add";
pub const VEHICLE_DELETE_PATH: &str = "/pro//relationController/deleteRelation";

/// Cliente HTTP del API de permisos; se crea uno por usuario y ejecución
pub struct PermitApiClient {
    client: Client,
    base_url: String,
}

impl PermitApiClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Crear con un [`Client`] propio (timeouts, proxies, etc.)
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call_api<B: Serialize + ?Sized>(&self, token: &str, path: &str, body: &B) -> AppResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("📤 POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ {} respondió HTTP {}: {}", path, status, error_text);
            return Err(upstream_error(path, i64::from(status.as_u16()), &error_text));
        }

        let api_response: ApiResponse = response.json().await?;
        if !api_response.is_success() {
            log::error!("❌ {} respondió code={} msg={}", path, api_response.code, api_response.msg);
            return Err(upstream_error(path, api_response.code, &api_response.msg));
        }

        log::debug!("📥 {} OK", path);
        Ok(api_response)
    }
}

#[async_trait]
impl PermitApi for PermitApiClient {
    async fn fetch_state(&self, token: &str) -> AppResult<AccountStatus> {
        let response = self.call_api(token, STATE_LIST_PATH, &json!({})).await?;
        AccountStatus::from_api_data(response.data)
    }

    async fn list_vehicles(&self, token: &str) -> AppResult<Vec<VehicleRecord>> {
        let response = self.call_api(token, VEHICLE_LIST_PATH, &json!({})).await?;
        let vehicles = match response.data {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<VehicleRecord>(item).ok())
                .collect(),
            _ => Vec::new(),
        };
        Ok(vehicles)
    }

    async fn get_user_identity(&self, token: &str) -> AppResult<UserIdentity> {
        let response = self.call_api(token, USER_IDENTITY_PATH, &json!({})).await?;
        UserIdentity::from_api_data(response.data)
    }

    async fn submit(&self, token: &str, request: &ApplicationRequest) -> AppResult<ApiResponse> {
        log::info!(
            "📝 Enviando solicitud {:?} para {} (jjrq={})",
            request.version(),
            request.plate_number(),
            request.target_date()
        );
        self.call_api(token, APPLY_PATH, request).await
    }

    async fn add_vehicle(&self, token: &str, vehicle: &VehicleRecord) -> AppResult<ApiResponse> {
        let payload = json!({ "relation": {}, "vehicle": vehicle.to_payload() });
        self.call_api(token, VEHICLE_ADD_PATH, &payload).await
    }

    async fn delete_vehicle(&self, token: &str, vehicle_id: &str) -> AppResult<ApiResponse> {
        self.call_api(token, VEHICLE_DELETE_PATH, &json!({ "vId": vehicle_id })).await
    }
}
