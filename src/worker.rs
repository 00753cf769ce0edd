//! Per-connection worker (spec.md §4.6 / §6): parse, cache lookup, and
//! either serve the cached artifact or fetch, serve, and offer to cache.
//!
//! One call to [`handle_connection`] per accepted socket, spawned as its
//! own task by `main`'s accept loop — no worker pool, no admission
//! control, matching the source's one-thread-per-connection model.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::net::TcpStream;

use crate::cache::ProxyCache;
use crate::error::{ProxyError, Result};
use crate::fetcher;
use crate::headers;
use crate::io_util::{self, MAX_HEADER_SIZE};
use crate::request;

pub async fn handle_connection(mut client: TcpStream, peer: SocketAddr, cache: Arc<ProxyCache>) {
    match serve(&mut client, peer, &cache).await {
        Ok(()) => {}
        Err(ProxyError::BadScheme(scheme)) => {
            // Normative policy (spec.md §7), not an Open Question: an
            // unsupported scheme terminates the process, matching the
            // source's behavior.
            tracing::error!(%peer, %scheme, "unsupported scheme in request URL, terminating");
            std::process::exit(1);
        }
        Err(ProxyError::PeerClosed) | Err(ProxyError::BrokenPipe) => {
            tracing::debug!(%peer, "client disconnected mid-transfer");
        }
        Err(e) => {
            tracing::warn!(%peer, error = %e, "request failed");
        }
    }
}

async fn serve(client: &mut TcpStream, peer: SocketAddr, cache: &ProxyCache) -> Result<()> {
    let mut buf = BytesMut::new();
    let got_request =
        io_util::read_headers_until_blank_line(client, &mut buf, MAX_HEADER_SIZE).await?;
    if !got_request {
        return Ok(());
    }

    let (req, raw_headers) = request::parse_client_request(&buf)?;

    if let Some(artifact) = cache.lookup(&req.url).await {
        tracing::info!(%peer, url = %req.url, "HIT");
        io_util::write_all_robust(client, &artifact.bytes).await?;
        return Ok(());
    }
    tracing::info!(%peer, url = %req.url, "MISS");

    let outbound = headers::rewrite(&req.abs_path, &req.host, &raw_headers);
    let artifact = fetcher::fetch(&req.host, req.port, &outbound).await?;

    io_util::write_all_robust(client, &artifact.bytes).await?;

    cache.insert(req.url, artifact).await;
    Ok(())
}
