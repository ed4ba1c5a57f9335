pub mod auth;
pub mod config;
pub mod error;
pub mod io_struct;
pub mod peer;
pub mod proxy_state;
pub mod server;

pub use error::{ErrorKind, ProxyError};
pub use io_struct::{ChatRequest, ChatResponse, Message};
pub use proxy_state::{ProxyConfig, ProxyState};
