//! Servidor HTTP guionizado para los tests de clientes
//!
//! Un `Router` de axum responde cada petición con la siguiente respuesta del
//! guion y guarda la petición recibida (línea, cabeceras y cuerpo) como texto.
//! El servidor se apaga al agotar el guion.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderName, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct CannedResponse {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, String)>,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: vec![(CONTENT_TYPE, "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    pub fn bytes(status: StatusCode, body: &[u8]) -> Self {
        Self {
            status,
            headers: vec![(CONTENT_TYPE, "application/octet-stream".to_string())],
            body: body.to_vec(),
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: StatusCode::FOUND,
            headers: vec![(LOCATION, location.to_string())],
            body: Vec::new(),
        }
    }
}

struct Script {
    responses: Mutex<VecDeque<CannedResponse>>,
    requests: Mutex<Vec<String>>,
    exhausted: Notify,
}

async fn describe(request: Request) -> String {
    let (parts, body) = request.into_parts();
    let target = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let mut text = format!("{} {} HTTP/1.1\r\n", parts.method, target);
    for (name, value) in &parts.headers {
        text.push_str(&format!("{}: {}\r\n", name, value.to_str().unwrap_or("")));
    }
    text.push_str("\r\n");

    let body = to_bytes(body, usize::MAX).await.unwrap();
    text.push_str(&String::from_utf8_lossy(&body));
    text
}

async fn respond(State(script): State<Arc<Script>>, request: Request) -> Response {
    let description = describe(request).await;
    script.requests.lock().unwrap().push(description);

    let next = {
        let mut responses = script.responses.lock().unwrap();
        let next = responses.pop_front();
        if responses.is_empty() {
            script.exhausted.notify_one();
        }
        next
    };

    let Some(canned) = next else {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from("script exhausted"))
            .unwrap();
    };

    let mut builder = Response::builder().status(canned.status);
    for (name, value) in canned.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(canned.body)).unwrap()
}

/// Arrancar el servidor; el handle devuelve las peticiones recibidas en orden
pub async fn serve(responses: Vec<CannedResponse>) -> (String, JoinHandle<Vec<String>>) {
    let script = Arc::new(Script {
        responses: Mutex::new(responses.into()),
        requests: Mutex::new(Vec::new()),
        exhausted: Notify::new(),
    });

    let app = Router::new().fallback(respond).with_state(script.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let shutdown = script.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.exhausted.notified().await })
            .await
            .unwrap();
        let requests = script.requests.lock().unwrap().clone();
        requests
    });

    (base_url, handle)
}

pub fn request_body(request: &str) -> &str {
    request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}
