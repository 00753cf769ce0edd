use std::sync::Arc;

use rustysquid::cache::ProxyCache;
use rustysquid::{signal, worker};
use tokio::net::TcpListener;

/// Parse the single CLI argument: a port in `[1024, 65536)` (spec.md §6).
fn parse_port(args: &[String]) -> Option<u16> {
    if args.len() != 2 {
        return None;
    }
    let port: u32 = args[1].parse().ok()?;
    if (1024..65536).contains(&port) {
        Some(port as u16)
    } else {
        None
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let port = match parse_port(&args) {
        Some(port) => port,
        None => {
            eprintln!("{}", rustysquid::error::ProxyError::BadArgs);
            std::process::exit(1);
        }
    };

    signal::ignore_sigpipe();

    let cache = Arc::new(ProxyCache::new());
    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port, "failed to bind listening socket");
            std::process::exit(1);
        }
    };

    tracing::info!(port, "rustysquid listening");

    loop {
        match listener.accept().await {
            Ok((client, peer)) => {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    worker::handle_connection(client, peer, cache).await;
                });
            }
            Err(e) => {
                let err = rustysquid::error::ProxyError::AcceptFailed(e);
                tracing::warn!(error = %err, "failed to accept connection");
            }
        }
    }
}
