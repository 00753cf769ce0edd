/// Full proxy server example - runs the real proxy pipeline standalone
///
/// Run with: cargo run --example full_proxy -- 8888
/// Test with: curl -x localhost:8888 http://example.com/
use std::sync::Arc;

use rustysquid::cache::ProxyCache;
use rustysquid::{signal, worker};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("rustysquid=info,full_proxy=info")
        .init();

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(8888);

    signal::ignore_sigpipe();

    let cache = Arc::new(ProxyCache::new());
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("failed to bind port");

    println!("Proxy server running on localhost:{port}");
    println!("  curl -x localhost:{port} http://example.com/");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                eprintln!("failed to accept connection: {e}");
                continue;
            }
        };

        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            worker::handle_connection(stream, peer, cache).await;
        });
    }
}
