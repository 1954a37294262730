//! Orquestador de renovación por usuario
//!
//! ENSURE_TOKEN -> FETCH_STATE -> DECIDE -> (SKIP | BUILD_AND_SUBMIT)
//! -> REFRESH_STATE -> NOTIFY. Los usuarios se procesan en secuencia y el
//! fallo de uno nunca aborta el lote.

use chrono::{NaiveDate, NaiveDateTime};
use std::future::Future;

use crate::clients::{IdentityProvider, PermitApi};
use crate::config::{UserConfig, UserConfigStore};
use crate::models::{AccountStatus, ApiResponse, FormVersion, VehicleRecord};
use crate::services::apply_builder::ApplyRequestBuilder;
use crate::services::auth_service::AuthService;
use crate::services::decision_service::{self, Decision};
use crate::services::notification_service::Notifier;
use crate::services::status_report::{format_notification, StatusSummary};
use crate::utils::errors::{configuration_error, data_absent_error, AppError, AppResult};

pub const OUTCOME_NOT_NEEDED: &str = "无需续签";
pub const OUTCOME_SUBMITTED: &str = "续签成功";
pub const OUTCOME_DRY_RUN: &str = "待续签";
pub const TITLE_SUBMIT_FAILED: &str = "进京证续签失败";
pub const TITLE_STATE_FAILED: &str = "进京证状态获取失败";
pub const TITLE_TOKEN_INVALID: &str = "进京证Token失效";

#[derive(Debug, Clone, Copy)]
pub struct RenewalOptions {
    pub form_version: FormVersion,
    /// Decidir sin enviar la solicitud
    pub dry_run: bool,
    pub notify: bool,
}

impl Default for RenewalOptions {
    fn default() -> Self {
        Self {
            form_version: FormVersion::default(),
            dry_run: false,
            notify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenewalOutcome {
    NotNeeded,
    Submitted { target_date: NaiveDate, message: String },
    /// Hacía falta solicitar pero la ejecución era de sólo lectura
    DryRun { target_date: NaiveDate },
}

impl RenewalOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RenewalOutcome::NotNeeded => OUTCOME_NOT_NEEDED,
            RenewalOutcome::Submitted { .. } => OUTCOME_SUBMITTED,
            RenewalOutcome::DryRun { .. } => OUTCOME_DRY_RUN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenewalReport {
    pub user: String,
    pub decision: Decision,
    pub outcome: RenewalOutcome,
    pub summary: Option<StatusSummary>,
    /// Token nuevo si hubo que hacer login
    pub refreshed_token: Option<String>,
}

pub struct RenewalService<'a> {
    api: &'a dyn PermitApi,
    identity: Option<&'a dyn IdentityProvider>,
    notifier: &'a dyn Notifier,
    store: Option<&'a UserConfigStore>,
    options: RenewalOptions,
}

impl<'a> RenewalService<'a> {
    pub fn new(api: &'a dyn PermitApi, notifier: &'a dyn Notifier, options: RenewalOptions) -> Self {
        Self {
            api,
            identity: None,
            notifier,
            store: None,
            options,
        }
    }

    /// Habilitar el login automático cuando el token falta o caduca
    pub fn with_identity_provider(mut self, identity: &'a dyn IdentityProvider) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Persistir los tokens obtenidos por login
    pub fn with_store(mut self, store: &'a UserConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    async fn notify(&self, title: &str, body: &str) {
        if self.options.notify {
            self.notifier.send(title, body).await;
        }
    }

    async fn login(&self, user: &UserConfig) -> AppResult<String> {
        let (phone, password) = user
            .credentials()
            .ok_or_else(|| configuration_error(&format!("user '{}' has no phone/password for login", user.name)))?;
        let provider = self
            .identity
            .ok_or_else(|| configuration_error("automatic login unavailable: OCR_URL not set"))?;

        let token = AuthService::new(provider, self.notifier)
            .with_notifications(self.options.notify)
            .authenticate(&user.name, phone, password)
            .await?;

        if let Some(store) = self.store {
            if let Err(e) = store.save_token(&user.name, &token).await {
                tracing::warn!("⚠️ [{}] No se pudo guardar el token: {}", user.name, e);
            }
        }
        Ok(token)
    }

    /// Devuelve el token a usar y si es nuevo
    pub async fn ensure_token(&self, user: &UserConfig) -> AppResult<(String, bool)> {
        user.check()?;

        if let Some(token) = user.token() {
            match self.api.get_user_identity(token).await {
                Ok(identity) => {
                    tracing::info!("🎫 [{}] Token válido para {}", user.name, identity.masked_name());
                    return Ok((token.to_string(), false));
                }
                Err(e @ AppError::UpstreamProtocol { .. }) => {
                    tracing::warn!("⚠️ [{}] Token rechazado: {}", user.name, e);
                    if user.credentials().is_none() {
                        self.notify(TITLE_TOKEN_INVALID, &format!("用户 {} 的Token已失效: {}", user.name, e))
                            .await;
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::info!("🔑 [{}] Sin token, iniciando login", user.name);
        }

        let token = self.login(user).await?;
        Ok((token, true))
    }

    async fn fetch_state(&self, user: &UserConfig, token: &str) -> AppResult<AccountStatus> {
        match self.api.fetch_state(token).await {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::error!("❌ [{}] Error obteniendo el estado ({}): {}", user.name, e.error_code(), e);
                self.notify(TITLE_STATE_FAILED, &format!("获取状态失败: {}", e)).await;
                Err(e)
            }
        }
    }

    /// Vehículo del formulario: el que coincide con el vehículo canónico del estado, o el primero
    fn select_vehicle<'v>(vehicles: &'v [VehicleRecord], state: &AccountStatus) -> Option<&'v VehicleRecord> {
        let canonical = state.first_vehicle().map(|v| v.v_id.as_str()).filter(|id| !id.is_empty());
        canonical
            .and_then(|id| vehicles.iter().find(|v| v.vehicle_id_or_empty() == id))
            .or_else(|| vehicles.first())
    }

    async fn build_and_submit(
        &self,
        user: &UserConfig,
        token: &str,
        state: &AccountStatus,
        target_date: NaiveDate,
    ) -> AppResult<ApiResponse> {
        let vehicles = self.api.list_vehicles(token).await?;
        let vehicle = Self::select_vehicle(&vehicles, state).ok_or_else(|| data_absent_error("vehicle"))?;
        let identity = self.api.get_user_identity(token).await?;
        if !identity.is_complete() {
            return Err(data_absent_error("user identity"));
        }

        let request = ApplyRequestBuilder::new(vehicle, &identity, target_date)
            .destination(user.destination())
            .permit_type(user.permit_type())
            .previous_record(state.latest_record_for_first_vehicle())
            .version(self.options.form_version)
            .build();

        self.api.submit(token, &request).await
    }

    /// Pipeline completo de un usuario
    pub async fn run(&self, user: &UserConfig, today: NaiveDate, now: NaiveDateTime) -> AppResult<RenewalReport> {
        let (token, refreshed) = self.ensure_token(user).await?;
        let state = self.fetch_state(user, &token).await?;

        let decision = decision_service::evaluate(&state, today);
        tracing::info!("🧭 [{}] Decisión: {:?}", user.name, decision);

        let (outcome, final_state) = match decision.target_date() {
            None => (RenewalOutcome::NotNeeded, state),
            Some(target_date) if self.options.dry_run => (RenewalOutcome::DryRun { target_date }, state),
            Some(target_date) => {
                let response = match self.build_and_submit(user, &token, &state, target_date).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::error!("❌ [{}] Error en la solicitud ({}): {}", user.name, e.error_code(), e);
                        self.notify(TITLE_SUBMIT_FAILED, &format!("续签执行失败: {}", e)).await;
                        return Err(e);
                    }
                };
                tracing::info!(
                    "✅ [{}] Solicitud {} enviada para {}: {}",
                    user.name,
                    user.permit_type().label(),
                    target_date,
                    response.msg
                );

                let refreshed_state = match self.api.fetch_state(&token).await {
                    Ok(fresh) => fresh,
                    Err(e) => {
                        tracing::warn!("⚠️ [{}] No se pudo refrescar el estado: {}", user.name, e);
                        state
                    }
                };
                (
                    RenewalOutcome::Submitted {
                        target_date,
                        message: response.msg,
                    },
                    refreshed_state,
                )
            }
        };

        let summary = StatusSummary::from_state(&final_state, today);
        match &summary {
            Some(summary) => {
                let (title, body) = format_notification(outcome.label(), summary, now);
                tracing::info!("[{}] {}\n{}", user.name, title, body);
                self.notify(&title, &body).await;
            }
            None => tracing::error!("❌ [{}] No hay registro para informar del estado", user.name),
        }

        Ok(RenewalReport {
            user: user.name.clone(),
            decision,
            outcome,
            summary,
            refreshed_token: refreshed.then_some(token),
        })
    }
}

/// Resultado agregado del lote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    /// Usuarios omitidos por configuración inválida
    pub skipped: Vec<String>,
    /// (usuario, código de error)
    pub failed: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    pub fn all_failed(&self) -> bool {
        !self.failed.is_empty() && self.failed.len() == self.total()
    }
}

/// Ejecutar el pipeline de cada usuario en secuencia
pub async fn run_batch<F, Fut>(users: Vec<UserConfig>, mut run_one: F) -> BatchSummary
where
    F: FnMut(UserConfig) -> Fut,
    Fut: Future<Output = AppResult<RenewalReport>>,
{
    let mut summary = BatchSummary::default();

    for user in users {
        let name = user.name.clone();
        tracing::info!("🚗 [{}] Inicio de la renovación", name);

        match run_one(user).await {
            Ok(report) => {
                tracing::info!("✅ [{}] {}", name, report.outcome.label());
                summary.succeeded.push(name);
            }
            Err(e) if e.is_configuration() => {
                tracing::warn!("⏭️ [{}] Usuario omitido: {}", name, e);
                summary.skipped.push(name);
            }
            Err(e) => {
                tracing::error!("❌ [{}] Renovación fallida ({}): {}", name, e.error_code(), e);
                summary.failed.push((name, e.error_code().to_string()));
            }
        }
    }

    tracing::info!(
        "🏁 Lote terminado: {} correctos, {} omitidos, {} fallidos",
        summary.succeeded.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    summary
}
