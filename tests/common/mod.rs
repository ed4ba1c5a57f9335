pub mod mock_backend;

use flownlp_gateway::{ProxyConfig, ProxyState};
use std::time::Duration;

pub const TEST_SECRET: &str = "test-secret";

pub fn test_state(backend_url: &str, timeout: Duration) -> ProxyState {
    let mut config = ProxyConfig::new("127.0.0.1".to_string(), 0, TEST_SECRET.to_string());
    config.backend_url = backend_url.to_string();
    config.timeout = timeout;
    ProxyState::new(config).unwrap()
}

/// URL on a port nothing is listening on.
pub fn dead_backend_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/chat", port)
}
