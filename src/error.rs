/// Error kinds raised by the proxy pipeline, one per spec-level failure mode.
///
/// `CacheFull` has no variant here on purpose: eviction resolves it inside
/// [`crate::cache::ProxyCache::insert`], so it never reaches the surface as
/// a `Result::Err`.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("usage: rustysquid <port> (1024-65535)")]
    BadArgs,

    #[error("failed to accept connection: {0}")]
    AcceptFailed(#[source] std::io::Error),

    #[error("method {0:?} not implemented (only GET is forwarded)")]
    NotImplemented(String),

    #[error("unsupported scheme in request URL: {0}")]
    BadScheme(String),

    #[error("malformed request line or headers")]
    MalformedRequest,

    #[error("failed to connect to origin {host}:{port}: {source}")]
    DialFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("peer closed the connection mid-transfer")]
    PeerClosed,

    #[error("broken pipe writing to peer")]
    BrokenPipe,

    #[error("response body exceeded MAX_OBJECT_SIZE with no Content-Length declared")]
    OversizeUndeclared,
}

pub type Result<T> = std::result::Result<T, ProxyError>;
