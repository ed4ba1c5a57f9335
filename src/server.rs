use crate::error::ProxyError;
use crate::peer::{self, PeerSocket};
use crate::proxy_state::{ProxyConfig, ProxyState};
use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::{Method, header};
use actix_web::{HttpRequest, HttpResponse, HttpServer, web};
use log::{debug, info, warn};
use std::io::Write;
use std::net::TcpListener;

pub const CHAT_PATH: &str = "/api/chat";

/// Caller's network origin as reported by the connection.
pub fn client_addr(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn chat(
    req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<ProxyState>,
) -> Result<HttpResponse, ProxyError> {
    let client_ip = client_addr(&req);
    info!("Received request from {} on {}", client_ip, CHAT_PATH);

    let peer = req.conn_data::<PeerSocket>().cloned();
    app_state
        .handle_chat(req.headers(), payload, &client_ip, peer.as_ref())
        .await
        .inspect_err(|e| {
            warn!("{} from {}", e.log_message(), client_ip);
            if let Some(detail) = e.detail() {
                debug!("{}: {}", e.log_message(), detail);
            }
        })
}

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(CHAT_PATH).route(web::post().to(chat)));
}

/// Installs the process-wide logger. `RUST_LOG`, when set, wins over `level`.
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .init();
}

/// Builds the gateway server on an already bound listener.
pub fn serve(listener: TcpListener, app_state: web::Data<ProxyState>) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(cors())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .on_connect(peer::on_connect)
    .listen(listener)?
    .run();
    Ok(server)
}

pub async fn startup(config: ProxyConfig, state: ProxyState) -> std::io::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))?;
    info!("FlowNLP server running on {}:{}", config.host, config.port);
    serve(listener, web::Data::new(state))?.await
}
