//! Servicio de notificaciones
//!
//! Cada usuario configura cero o más destinos:
//! - clave Bark a secas (`AbCdEf123`)
//! - `bark://[host/]clave` o `barks://[host/]clave`
//! - `https://api.day.app/clave`
//! - cualquier otra URL http(s), tratada como webhook JSON
//!
//! El envío es fire-and-forget: los errores se registran y nunca se propagan.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const BARK_DEFAULT_SERVER: &str = "https://api.day.app";
pub const NOTIFICATION_GROUP: &str = "进京证";

/// Destino de notificaciones del pipeline
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, body: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyTarget {
    Bark { server: String, key: String },
    Webhook { url: String },
}

fn is_bark_key(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `host/clave` o `clave`
fn parse_bark_location(rest: &str, scheme: &str) -> Option<NotifyTarget> {
    let rest = rest.trim_end_matches('/');
    let (server, key) = match rest.rsplit_once('/') {
        Some((host, key)) => (format!("{}://{}", scheme, host), key),
        None => (BARK_DEFAULT_SERVER.to_string(), rest),
    };

    is_bark_key(key).then(|| NotifyTarget::Bark {
        server,
        key: key.to_string(),
    })
}

impl NotifyTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let target = if let Some(rest) = raw.strip_prefix("bark://") {
            parse_bark_location(rest, "http")
        } else if let Some(rest) = raw.strip_prefix("barks://") {
            parse_bark_location(rest, "https")
        } else if let Some(rest) = raw.strip_prefix(BARK_DEFAULT_SERVER).and_then(|r| r.strip_prefix('/')) {
            let key = rest.split('/').next().unwrap_or_default();
            is_bark_key(key).then(|| NotifyTarget::Bark {
                server: BARK_DEFAULT_SERVER.to_string(),
                key: key.to_string(),
            })
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(NotifyTarget::Webhook { url: raw.to_string() })
        } else if is_bark_key(raw) {
            Some(NotifyTarget::Bark {
                server: BARK_DEFAULT_SERVER.to_string(),
                key: raw.to_string(),
            })
        } else {
            None
        };

        if target.is_none() {
            tracing::warn!("⚠️ Destino de notificación no válido, se ignora: {}", raw);
        }
        target
    }

    /// URL de envío; para Bark el título y el cuerpo van en el path
    pub fn endpoint(&self, title: &str, body: &str) -> String {
        match self {
            NotifyTarget::Bark { server, key } => format!(
                "{}/{}/{}/{}?isArchive=1&group={}",
                server.trim_end_matches('/'),
                key,
                urlencoding::encode(title),
                urlencoding::encode(body),
                urlencoding::encode(NOTIFICATION_GROUP)
            ),
            NotifyTarget::Webhook { url } => url.clone(),
        }
    }
}

/// Notificador HTTP hacia los destinos de un usuario
pub struct NotificationService {
    client: Client,
    targets: Vec<NotifyTarget>,
}

impl NotificationService {
    pub fn new(urls: &[String]) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            targets: urls.iter().filter_map(|url| NotifyTarget::parse(url)).collect(),
        }
    }

    pub fn targets(&self) -> &[NotifyTarget] {
        &self.targets
    }

    async fn deliver(&self, target: &NotifyTarget, title: &str, body: &str) -> Result<(), reqwest::Error> {
        let url = target.endpoint(title, body);
        let request = match target {
            NotifyTarget::Bark { .. } => self.client.post(&url),
            NotifyTarget::Webhook { .. } => self.client.post(&url).json(&json!({
                "title": title,
                "body": body,
                "group": NOTIFICATION_GROUP,
            })),
        };

        request.send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn send(&self, title: &str, body: &str) {
        if self.targets.is_empty() {
            tracing::warn!("🔕 Sin destinos de notificación configurados: {}", title);
            return;
        }

        for target in &self.targets {
            match self.deliver(target, title, body).await {
                Ok(()) => tracing::debug!("📨 Notificación enviada: {}", title),
                Err(e) => tracing::error!("❌ Error enviando notificación '{}': {}", title, e),
            }
        }
    }
}
