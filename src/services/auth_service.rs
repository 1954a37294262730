//! Servicio de autenticación contra el proveedor de identidad
//!
//! Máquina de estados de intentos acotados: cada intento usa una sesión
//! nueva; "5019" y "5016" terminan de inmediato, el resto de fallos consume
//! un intento hasta agotar [`MAX_LOGIN_ATTEMPTS`].

use crate::clients::IdentityProvider;
use crate::models::auth::MAX_LOGIN_ATTEMPTS;
use crate::models::{AttemptResult, LoginOutcome};
use crate::services::notification_service::Notifier;
use crate::utils::errors::{AppError, AppResult};

pub struct AuthService<'a> {
    provider: &'a dyn IdentityProvider,
    notifier: &'a dyn Notifier,
    notify: bool,
    max_attempts: u32,
}

impl<'a> AuthService<'a> {
    pub fn new(provider: &'a dyn IdentityProvider, notifier: &'a dyn Notifier) -> Self {
        Self {
            provider,
            notifier,
            notify: true,
            max_attempts: MAX_LOGIN_ATTEMPTS,
        }
    }

    /// Con `false` los rechazos y bloqueos sólo se registran en el log
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify = enabled;
        self
    }

    async fn notify(&self, title: &str, body: &str) {
        if self.notify {
            self.notifier.send(title, body).await;
        }
    }

    /// Ejecutar el bucle de login hasta un estado terminal
    pub async fn login(&self, user: &str, phone: &str, password: &str) -> LoginOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            tracing::info!("🔐 [{}] Intento de login {}/{}", user, attempt, self.max_attempts);

            match self.provider.attempt_login(phone, password).await {
                AttemptResult::Redirect(redirect_url) => {
                    tracing::info!("✅ [{}] Login correcto en el intento {}", user, attempt);
                    return LoginOutcome::Success {
                        redirect_url,
                        attempts: attempt,
                    };
                }
                AttemptResult::WrongCredentials(message) => {
                    tracing::error!("❌ [{}] Credenciales incorrectas: {}", user, message);
                    self.notify("进京证登录失败", &format!("用户 {} 账号或密码错误: {}", user, message))
                        .await;
                    return LoginOutcome::Rejected {
                        message,
                        attempts: attempt,
                    };
                }
                AttemptResult::Locked(message) => {
                    tracing::error!("🔒 [{}] Cuenta bloqueada: {}", user, message);
                    self.notify("进京证账号已锁定", &format!("用户 {} 账号已锁定: {}", user, message))
                        .await;
                    return LoginOutcome::Locked {
                        message,
                        attempts: attempt,
                    };
                }
                AttemptResult::Transient(error) => {
                    tracing::warn!("⚠️ [{}] Intento {} fallido: {}", user, attempt, error);
                    last_error = error;
                }
            }
        }

        tracing::error!("❌ [{}] Login agotado tras {} intentos", user, self.max_attempts);
        LoginOutcome::Exhausted {
            last_error,
            attempts: self.max_attempts,
        }
    }

    /// Login completo: bucle de intentos más canje de la redirección por el token
    pub async fn authenticate(&self, user: &str, phone: &str, password: &str) -> AppResult<String> {
        let outcome = self.login(user, phone, password).await;
        tracing::debug!("[{}] Login terminado tras {} intento(s)", user, outcome.attempts());

        match outcome {
            LoginOutcome::Success { redirect_url, .. } => {
                let token = self.provider.exchange_token(&redirect_url).await?;
                tracing::info!("🎫 [{}] Token obtenido", user);
                Ok(token)
            }
            LoginOutcome::Rejected { message, .. } => Err(AppError::Authentication(message)),
            LoginOutcome::Locked { message, .. } => Err(AppError::AccountLocked(message)),
            LoginOutcome::Exhausted { last_error, attempts } => Err(AppError::Authentication(format!(
                "login agotado tras {} intentos: {}",
                attempts, last_error
            ))),
        }
    }
}
