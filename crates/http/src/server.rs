use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::codec::body::BodyDecodingStrategy;
use crate::codec::header::HeadReader;
use crate::config::ServerConfig;
use crate::connection::{ConnectionSettings, HttpConnection};
use crate::handler::Handler;
use crate::protocol::DefaultResponseHeaders;

pub struct ServerBuilder {
    config: ServerConfig,
    handler: Option<Arc<dyn Handler>>,
    head_reader: Option<Arc<dyn HeadReader>>,
    body_decoding: Option<Arc<dyn BodyDecodingStrategy>>,
    default_headers: Option<Arc<dyn DefaultResponseHeaders>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { config: ServerConfig::default(), handler: None, head_reader: None, body_decoding: None, default_headers: None }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address<S: Into<String>>(mut self, address: S) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = read_timeout;
        self
    }

    pub fn keep_alive_timeout(mut self, keep_alive_timeout: Duration) -> Self {
        self.config.keep_alive_timeout = keep_alive_timeout;
        self
    }

    pub fn max_method_name_size(mut self, max_method_name_size: usize) -> Self {
        self.config.max_method_name_size = max_method_name_size;
        self
    }

    pub fn max_request_uri_size(mut self, max_request_uri_size: usize) -> Self {
        self.config.max_request_uri_size = max_request_uri_size;
        self
    }

    pub fn max_headers_size(mut self, max_headers_size: Option<usize>) -> Self {
        self.config.max_headers_size = max_headers_size;
        self
    }

    pub fn max_input_stream_cleaning(mut self, max_input_stream_cleaning: Option<u64>) -> Self {
        self.config.max_input_stream_cleaning = max_input_stream_cleaning;
        self
    }

    pub fn server_name<S: Into<String>>(mut self, server_name: S) -> Self {
        self.config.server_name = server_name.into();
        self
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Replaces the request head reader, which otherwise follows the size limits of the
    /// configuration.
    pub fn head_reader(mut self, head_reader: impl HeadReader + 'static) -> Self {
        self.head_reader = Some(Arc::new(head_reader));
        self
    }

    pub fn body_decoding(mut self, body_decoding: impl BodyDecodingStrategy + 'static) -> Self {
        self.body_decoding = Some(Arc::new(body_decoding));
        self
    }

    /// Replaces the headers set on every response, `Date` and `Server` by default.
    pub fn default_headers(mut self, default_headers: impl DefaultResponseHeaders + 'static) -> Self {
        self.default_headers = Some(Arc::new(default_headers));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let handler = self.handler.ok_or(ServerBuildError::MissingHandler)?;

        let mut settings = ConnectionSettings::from_config(&self.config);
        if let Some(head_reader) = self.head_reader {
            settings.head_reader = head_reader;
        }
        if let Some(body_decoding) = self.body_decoding {
            settings.body_decoding = body_decoding;
        }
        if let Some(default_headers) = self.default_headers {
            settings.default_headers = default_headers;
        }

        Ok(Server {
            address: self.config.address,
            handler,
            settings: Arc::new(settings),
            state: Arc::new(ServerState::default()),
        })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("handler must be set")]
    MissingHandler,
}

/// Serves each accepted connection on its own blocking worker.
pub struct Server {
    address: String,
    handler: Arc<dyn Handler>,
    settings: Arc<ConnectionSettings>,
    state: Arc<ServerState>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("address", &self.address)
            .field("settings", &self.settings)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ServerState {
    stopping: AtomicBool,
    stop: Notify,
    active_connections: AtomicUsize,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle { state: Arc::clone(&self.state) }
    }

    /// Binds the configured address and serves until stopped.
    pub async fn start(&self) -> io::Result<()> {
        let tcp_listener = match TcpListener::bind(self.address.as_str()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, address = self.address.as_str(), "bind server error");
                return Err(e);
            }
        };
        info!(address = %tcp_listener.local_addr()?, "start listening");
        self.serve(tcp_listener).await
    }

    /// Serves the connections of `tcp_listener` until stopped. The listener is closed on
    /// return, the connections being served finish their current request.
    pub async fn serve(&self, tcp_listener: TcpListener) -> io::Result<()> {
        while !self.state.stopping.load(Ordering::Acquire) {
            let (tcp_stream, remote_addr) = select! {
                () = self.state.stop.notified() => break,
                accepted = tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            if let Err(e) = self.spawn_connection(tcp_stream, remote_addr) {
                warn!(cause = %e, %remote_addr, "failed to set up connection");
            }
        }

        info!("server stopped");
        Ok(())
    }

    fn spawn_connection(&self, tcp_stream: TcpStream, remote_addr: SocketAddr) -> io::Result<()> {
        let writer = tcp_stream.into_std()?;
        writer.set_nonblocking(false)?;
        let reader = writer.try_clone()?;

        let handler = Arc::clone(&self.handler);
        let settings = Arc::clone(&self.settings);
        let guard = ConnectionGuard::new(Arc::clone(&self.state));

        tokio::task::spawn_blocking(move || {
            let connection = HttpConnection::new(reader, writer, settings);
            match connection.process(handler.as_ref(), &guard.state.stopping) {
                Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => error!(cause = %e, %remote_addr, "service has error, connection shutdown"),
            }
        });
        Ok(())
    }
}

/// Stops a running [`Server`] from another task or thread.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    state: Arc<ServerState>,
}

impl ServerHandle {
    pub fn stop(&self) {
        self.state.stopping.store(true, Ordering::Release);
        self.state.stop.notify_one();
    }

    pub fn is_stopping(&self) -> bool {
        self.state.stopping.load(Ordering::Acquire)
    }

    /// Number of connections being served.
    pub fn active_connections(&self) -> usize {
        self.state.active_connections.load(Ordering::Acquire)
    }
}

/// Counts a connection as active while it lives.
struct ConnectionGuard {
    state: Arc<ServerState>,
}

impl ConnectionGuard {
    fn new(state: Arc<ServerState>) -> Self {
        state.active_connections.fetch_add(1, Ordering::AcqRel);
        Self { state }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.state.active_connections.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::handler::make_handler;
    use crate::protocol::{Request, Response};

    fn hello(request: &mut Request<'_>) -> Result<(), crate::handler::HandlerError> {
        let path = request.uri().path().to_string();
        request.send_response(Response::text(StatusCode::OK, path))?;
        Ok(())
    }

    #[test]
    fn test_missing_handler() {
        let e = Server::builder().build().err().unwrap();
        assert!(matches!(e, ServerBuildError::MissingHandler));
    }

    #[tokio::test]
    async fn test_serve_and_stop() {
        let server = Server::builder().server_name("test").handler(make_handler(hello)).build().unwrap();
        let handle = server.handle();
        let tcp_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = tcp_listener.local_addr().unwrap();
        let serving = tokio::spawn(async move { server.serve(tcp_listener).await });

        let mut stream = TcpStream::connect(address).await.unwrap();
        stream.write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("\r\nServer: test\r\n"));
        assert!(response.ends_with("\r\n\r\n/hello"));

        handle.stop();
        assert!(handle.is_stopping());
        serving.await.unwrap().unwrap();
    }
}
