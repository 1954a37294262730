//! Resolución de captchas mediante un servicio OCR externo
//!
//! El servicio recibe la imagen en base64 y responde con el texto reconocido,
//! ya sea como texto plano o como JSON con un campo `result` o `data`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::CaptchaSolver;
use crate::utils::errors::{upstream_error, AppResult};

pub struct HttpCaptchaSolver {
    client: Client,
    endpoint: String,
}

impl HttpCaptchaSolver {
    pub fn new(endpoint: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

/// Extraer el texto del captcha de la respuesta del OCR; sólo se conservan dígitos
pub fn extract_captcha_text(body: &str) -> String {
    let raw = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map
            .get("result")
            .or_else(|| map.get("data"))
            .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string())))
            .unwrap_or_default(),
        _ => body.to_string(),
    };

    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[async_trait]
impl CaptchaSolver for HttpCaptchaSolver {
    async fn solve(&self, image: &[u8]) -> AppResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "image": STANDARD.encode(image) }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(&self.endpoint, i64::from(status.as_u16()), &body));
        }

        let text = extract_captcha_text(&body);
        log::debug!("🔢 Captcha reconocido: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_json() {
        assert_eq!(extract_captcha_text(r#"{"status":200,"result":"1234","msg":""}"#), "1234");
        assert_eq!(extract_captcha_text(r#"{"data":5678}"#), "5678");
        assert_eq!(extract_captcha_text(r#"{"other":"x"}"#), "");
    }

    #[test]
    fn test_extract_from_plain_text() {
        assert_eq!(extract_captcha_text("12 34\n"), "1234");
        assert_eq!(extract_captcha_text("a1b2"), "12");
        assert_eq!(extract_captcha_text("0042"), "0042");
    }
}
