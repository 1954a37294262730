//! Cliente HTTP del proveedor de identidad (北京通)
//!
//! Cada intento de login abre una sesión nueva con su propio cookie store:
//! clave pública -> cifrado de credenciales -> captcha -> login por contraseña.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use super::{CaptchaSolver, IdentityProvider};
use crate::models::auth::ProviderLoginResponse;
use crate::models::AttemptResult;
use crate::utils::crypto::{encrypt_credentials, CredentialCipher};
use crate::utils::errors::{upstream_error, AppResult};
use crate::utils::url::get_url_param;

pub const PUBKEY_PATH: &str = "/renzheng/open/m/login/goUserLogin?client_id=100100000343&redirect_uri=https://bjjj.jtgl.beijing.gov.cn/uc/ucfront/userauth&response_type=code&scope=user_info&state=100100004153";
pub const CAPTCHA_PATH: &str = "/renzheng/common/generateCaptcha";
pub const LOGIN_PATH: &str = "/renzheng/inner/m/login/doUserLoginByPwd";

pub struct IdentityProviderClient {
    base_url: String,
    captcha_solver: Arc<dyn CaptchaSolver>,
    cipher: Arc<dyn CredentialCipher>,
}

/// Sesión de un único intento; se descarta al terminar
struct LoginSession {
    client: Client,
}

/// Las redirecciones no se siguen: `pubKey` y `token` viajan en el `Location` del 302
fn build_client() -> AppResult<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Valor de un parámetro en el header `Location` de una respuesta 302
fn location_param(response: &reqwest::Response, key: &str) -> Option<String> {
    if response.status() != StatusCode::FOUND {
        return None;
    }
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|location| get_url_param(location, key))
}

impl IdentityProviderClient {
    pub fn new(base_url: &str, captcha_solver: Arc<dyn CaptchaSolver>, cipher: Arc<dyn CredentialCipher>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            captcha_solver,
            cipher,
        }
    }

    async fn get_pubkey(&self, session: &LoginSession) -> AppResult<String> {
        let response = session
            .client
            .get(format!("{}{}", self.base_url, PUBKEY_PATH))
            .send()
            .await?;

        let status = response.status();
        location_param(&response, "pubKey")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| upstream_error(PUBKEY_PATH, i64::from(status.as_u16()), "pubKey no encontrada"))
    }

    async fn get_captcha(&self, session: &LoginSession) -> AppResult<String> {
        let url = format!("{}{}?{}", self.base_url, CAPTCHA_PATH, Utc::now().timestamp_millis());
        let response = session.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream_error(CAPTCHA_PATH, i64::from(status.as_u16()), "captcha no disponible"));
        }

        let image = response.bytes().await?;
        self.captcha_solver.solve(&image).await
    }

    async fn do_login(&self, phone: &str, password: &str) -> AppResult<AttemptResult> {
        let session = LoginSession {
            client: build_client()?,
        };

        let pubkey = self.get_pubkey(&session).await?;
        let encrypted = encrypt_credentials(self.cipher.as_ref(), &pubkey, phone, password)?;
        let captcha = self.get_captcha(&session).await?;

        let response = session
            .client
            .post(format!("{}{}", self.base_url, LOGIN_PATH))
            .form(&[("encryptData", encrypted.as_str()), ("captcha", captcha.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Ok(AttemptResult::Transient(format!("HTTP {}: {}", status, error_text)));
        }

        let body: ProviderLoginResponse = response.json().await?;
        Ok(body.classify())
    }
}

#[async_trait]
impl IdentityProvider for IdentityProviderClient {
    async fn attempt_login(&self, phone: &str, password: &str) -> AttemptResult {
        match self.do_login(phone, password).await {
            Ok(result) => result,
            Err(e) => AttemptResult::Transient(e.to_string()),
        }
    }

    async fn exchange_token(&self, redirect_url: &str) -> AppResult<String> {
        let client = build_client()?;
        let response = client.get(redirect_url).send().await?;

        let status = response.status();
        location_param(&response, "token")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| upstream_error(redirect_url, i64::from(status.as_u16()), "token no encontrado en la redirección"))
    }
}
