use actix_web::dev::Extensions;
use actix_web::rt::net::TcpStream;
use log::{debug, warn};
use std::any::Any;
use std::io;
use std::sync::Arc;

/// Duplicate handle on an inbound connection's socket.
///
/// actix keeps polling a handler after its caller hangs up, so the handler
/// watches the socket itself to know when to abandon the backend call.
#[derive(Debug, Clone)]
pub struct PeerSocket(Arc<std::net::TcpStream>);

/// `HttpServer::on_connect` hook storing a [`PeerSocket`] in the connection data.
pub fn on_connect(conn: &dyn Any, ext: &mut Extensions) {
    let Some(sock) = conn.downcast_ref::<TcpStream>() else {
        return;
    };
    match dup_socket(sock) {
        Ok(dup) => {
            ext.insert(PeerSocket(Arc::new(dup)));
        }
        Err(e) => warn!("Cannot watch connection for disconnects: {}", e),
    }
}

#[cfg(unix)]
fn dup_socket(sock: &TcpStream) -> io::Result<std::net::TcpStream> {
    use std::os::fd::AsFd;
    Ok(sock.as_fd().try_clone_to_owned()?.into())
}

#[cfg(windows)]
fn dup_socket(sock: &TcpStream) -> io::Result<std::net::TcpStream> {
    use std::os::windows::io::AsSocket;
    Ok(sock.as_socket().try_clone_to_owned()?.into())
}

#[cfg(not(any(unix, windows)))]
fn dup_socket(_sock: &TcpStream) -> io::Result<std::net::TcpStream> {
    Err(io::ErrorKind::Unsupported.into())
}

impl PeerSocket {
    /// Resolves once the caller has closed (or reset) its end of the
    /// connection. Never resolves when that cannot be observed, e.g. when
    /// the caller has already pipelined its next request.
    pub async fn closed(&self) {
        let stream = match self.register() {
            Ok(stream) => stream,
            Err(e) => {
                debug!("Cannot register connection watcher: {}", e);
                return std::future::pending().await;
            }
        };
        let mut buf = [0u8; 1];
        match stream.peek(&mut buf).await {
            Ok(0) | Err(_) => {}
            Ok(_) => std::future::pending().await,
        }
    }

    fn register(&self) -> io::Result<TcpStream> {
        let dup = self.0.try_clone()?;
        dup.set_nonblocking(true)?;
        TcpStream::from_std(dup)
    }
}
