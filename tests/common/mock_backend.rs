use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

/// How the mock answers `POST /api/chat`.
#[derive(Clone)]
#[allow(dead_code)]
pub enum BackendMode {
    Reply(Value),
    Raw(&'static str),
    Status(u16, Value),
    Stall(Duration),
}

struct MockShared {
    mode: BackendMode,
    received: Mutex<Vec<(Option<String>, Value)>>,
}

/// Stand-in for the local inference service, served by a real listener.
pub struct MockBackend {
    pub url: String,
    shared: web::Data<MockShared>,
    handle: ServerHandle,
}

async fn mock_chat(
    req: actix_web::HttpRequest,
    body: web::Bytes,
    shared: web::Data<MockShared>,
) -> HttpResponse {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let parsed = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    shared.received.lock().unwrap().push((content_type, parsed));

    match &shared.mode {
        BackendMode::Reply(value) => HttpResponse::Ok().json(value),
        BackendMode::Raw(text) => HttpResponse::Ok()
            .content_type("application/json")
            .body(*text),
        BackendMode::Status(code, value) => {
            HttpResponse::build(StatusCode::from_u16(*code).unwrap()).json(value)
        }
        BackendMode::Stall(delay) => {
            actix_web::rt::time::sleep(*delay).await;
            HttpResponse::Ok().json(serde_json::json!({}))
        }
    }
}

impl MockBackend {
    pub async fn start(mode: BackendMode) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let shared = web::Data::new(MockShared {
            mode,
            received: Mutex::new(Vec::new()),
        });

        let app_shared = shared.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_shared.clone())
                .route("/api/chat", web::post().to(mock_chat))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            url: format!("http://127.0.0.1:{}/api/chat", port),
            shared,
            handle,
        }
    }

    /// Bodies received so far, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.shared
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    #[allow(dead_code)]
    pub fn content_types(&self) -> Vec<Option<String>> {
        self.shared
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|(ct, _)| ct.clone())
            .collect()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}
