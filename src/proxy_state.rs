use crate::auth::BearerAuth;
use crate::error::ProxyError;
use crate::io_struct::{ChatRequest, ChatResponse};
use crate::peer::PeerSocket;
use actix_web::http::header::{ContentType, HeaderMap};
use actix_web::{HttpResponse, web};
use bytes::BytesMut;
use futures_util::StreamExt;
use log::{info, warn};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub backend_url: String,
    pub timeout: Duration,
    pub max_payload_size: usize,
}

impl ProxyConfig {
    pub fn new(host: String, port: u16, api_key: String) -> Self {
        ProxyConfig {
            host,
            port,
            api_key,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

/// Everything one `/api/chat` exchange needs. Nothing in here changes
/// between requests; the client is shared only for its connection pool.
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub auth: BearerAuth,
    pub client: reqwest::Client,
    pub backend_url: String,
    pub timeout: Duration,
    pub max_payload_size: usize,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> anyhow::Result<Self> {
        // The forwarder owns the deadline, so the client itself has no timeout.
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            auth: BearerAuth::new(&config.api_key),
            client,
            backend_url: config.backend_url,
            timeout: config.timeout,
            max_payload_size: config.max_payload_size,
        })
    }

    /// Runs authenticate -> validate -> forward for one request. When the
    /// caller's connection is known, the backend call is dropped as soon as
    /// the caller hangs up.
    pub async fn handle_chat(
        &self,
        headers: &HeaderMap,
        payload: web::Payload,
        client_ip: &str,
        peer: Option<&PeerSocket>,
    ) -> Result<HttpResponse, ProxyError> {
        self.auth.authorize(headers)?;

        let body = self.read_body(payload).await?;
        let chat_req = ChatRequest::from_body(&body)?;
        chat_req.validate()?;
        info!(
            "Request sent: Model: {}, Messages: {:?}",
            chat_req.model, chat_req.messages
        );

        let chat_resp = match peer {
            Some(peer) => tokio::select! {
                res = self.forward(&chat_req) => res?,
                _ = peer.closed() => return Err(ProxyError::ClientDisconnected),
            },
            None => self.forward(&chat_req).await?,
        };
        info!(
            "Response received from {}: Model: {}, Message: {:?}, Done: {}",
            client_ip, chat_resp.model, chat_resp.message, chat_resp.done
        );

        let mut out = serde_json::to_vec(&chat_resp)
            .map_err(|e| ProxyError::ReadResponse(e.to_string()))?;
        out.push(b'\n');
        Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(out))
    }

    async fn read_body(&self, mut payload: web::Payload) -> Result<BytesMut, ProxyError> {
        let mut body = BytesMut::new();
        while let Some(chunk) = payload.next().await {
            let chunk = chunk.map_err(|e| ProxyError::InvalidPayload(e.to_string()))?;
            if body.len() + chunk.len() > self.max_payload_size {
                return Err(ProxyError::PayloadTooLarge {
                    limit: self.max_payload_size,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Sends `chat_req` to the backend once. The whole exchange, including
    /// reading the response body, must finish before `self.timeout` elapses.
    pub async fn forward(&self, chat_req: &ChatRequest) -> Result<ChatResponse, ProxyError> {
        let deadline = Instant::now() + self.timeout;
        let body = serde_json::to_vec(chat_req).map_err(ProxyError::CreateRequest)?;

        let task = self
            .client
            .post(&self.backend_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send();
        // Dropping the send future on expiry aborts the in-flight call.
        let resp = match timeout_at(deadline, task).await {
            Err(_) => return Err(ProxyError::Timeout),
            Ok(Err(e)) if e.is_timeout() => return Err(ProxyError::Timeout),
            Ok(Err(e)) => return Err(ProxyError::BackendUnreachable(e)),
            Ok(Ok(resp)) => resp,
        };

        let status = resp.status();
        if !status.is_success() {
            warn!("Ollama API answered {} for model {}", status, chat_req.model);
        }

        let bytes = match timeout_at(deadline, resp.bytes()).await {
            Err(_) => {
                return Err(ProxyError::ReadResponse(
                    "deadline elapsed while reading body".to_string(),
                ));
            }
            Ok(Err(e)) => return Err(ProxyError::ReadResponse(e.to_string())),
            Ok(Ok(bytes)) => bytes,
        };
        ChatResponse::from_body(&bytes)
    }
}
