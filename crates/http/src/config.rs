use std::time::Duration;

/// Settings of a [`Server`](crate::server::Server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on, `host:port`.
    pub address: String,
    /// Read timeout once a request started.
    pub read_timeout: Duration,
    /// How long an idle connection waits for its next request.
    pub keep_alive_timeout: Duration,
    pub max_method_name_size: usize,
    pub max_request_uri_size: usize,
    /// Maximum size of the header block, `None` for no limit.
    pub max_headers_size: Option<usize>,
    /// Maximum number of unread body bytes discarded before a response, `None` for no
    /// limit. `Some(0)` closes the connection whenever a body was left unread.
    pub max_input_stream_cleaning: Option<u64>,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            read_timeout: Duration::from_millis(2000),
            keep_alive_timeout: Duration::from_millis(30000),
            max_method_name_size: 30,
            max_request_uri_size: 4 * 1024,
            max_headers_size: Some(8 * 1024),
            max_input_stream_cleaning: Some(4 * 1024 * 1024),
            server_name: "verbatim".to_string(),
        }
    }
}
