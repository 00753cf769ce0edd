//! Origin fetch: dial, send the rewritten request, and assemble a
//! byte-exact response artifact (spec.md §4.4).
//!
//! Response headers are tokenized with `httparse::Response` purely to find
//! the byte offset between headers and body (`header_len`). The header
//! bytes themselves are copied verbatim rather than reconstructed, so the
//! artifact handed to the client and the one offered to the cache are
//! bit-for-bit what the origin sent — unlike the teacher's `String`-based
//! `status_line`/`headers` reassembly.

use bytes::BytesMut;
use tokio::net::TcpStream;

use crate::cache::{Artifact, MAX_OBJECT_SIZE};
use crate::error::{ProxyError, Result};
use crate::io_util::{self, MAX_HEADER_SIZE};

/// Dial `host:port`, write `request` over a freshly opened connection, then
/// read and assemble the full response. One TCP connection per request, no
/// persistent connections (spec.md §1).
pub async fn fetch(host: &str, port: u16, request: &[u8]) -> Result<Artifact> {
    let mut stream =
        TcpStream::connect((host, port))
            .await
            .map_err(|source| ProxyError::DialFailed {
                host: host.to_string(),
                port,
                source,
            })?;

    io_util::write_all_robust(&mut stream, request).await?;
    assemble_response(&mut stream).await
}

/// Read headers, determine the declared body length if any, and read the
/// body to completion.
///
/// A body with no `Content-Length` that grows past `MAX_OBJECT_SIZE` aborts
/// with [`ProxyError::OversizeUndeclared`] (spec.md §7) rather than
/// buffering without bound. A body *with* a declared length is always read
/// to completion — the client is still owed the bytes — and relies on
/// `ProxyCache::insert`'s own size guard to keep it out of the cache when
/// that declared length exceeds the budget.
async fn assemble_response<R>(reader: &mut R) -> Result<Artifact>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = BytesMut::new();
    let got_headers =
        io_util::read_headers_until_blank_line(reader, &mut buf, MAX_HEADER_SIZE).await?;
    if !got_headers {
        return Err(ProxyError::PeerClosed);
    }

    let header_len = parse_header_len(&buf)?;
    let declared_len = content_length(&buf[..header_len]);

    match declared_len {
        Some(len) => {
            let want = header_len + len;
            read_body_to(reader, &mut buf, want).await?;
        }
        None => loop {
            if buf.len() - header_len > MAX_OBJECT_SIZE {
                return Err(ProxyError::OversizeUndeclared);
            }
            if !read_more(reader, &mut buf).await? {
                break;
            }
        },
    }

    Ok(Artifact::new(buf.freeze(), header_len))
}

fn parse_header_len(buf: &[u8]) -> Result<usize> {
    let mut header_space = [httparse::EMPTY_HEADER; 64];
    let mut resp = httparse::Response::new(&mut header_space);
    match resp.parse(buf) {
        Ok(httparse::Status::Complete(n)) => Ok(n),
        _ => Err(ProxyError::PeerClosed),
    }
}

async fn read_body_to<R>(reader: &mut R, buf: &mut BytesMut, want: usize) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    while buf.len() < want {
        if !read_more(reader, buf).await? {
            break;
        }
    }
    Ok(())
}

/// Read another chunk, folding a peer reset into clean EOF the same way
/// `io_util::read_headers_until_blank_line` does for the header phase.
async fn read_more<R>(reader: &mut R, buf: &mut BytesMut) -> Result<bool>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;
    match reader.read_buf(buf).await {
        Ok(0) => Ok(false),
        Ok(_) => Ok(true),
        Err(e) if is_peer_reset(&e) => Ok(false),
        Err(_) => Err(ProxyError::PeerClosed),
    }
}

fn content_length(header_bytes: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(header_bytes).ok()?;
    for line in text.split("\r\n") {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            return value.trim().parse().ok();
        }
    }
    None
}

fn is_peer_reset(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_is_case_insensitive() {
        let headers = b"HTTP/1.0 200 OK\r\ncontent-LENGTH: 42\r\n\r\n";
        assert_eq!(content_length(headers), Some(42));
    }

    #[test]
    fn missing_content_length_is_none() {
        let headers = b"HTTP/1.0 200 OK\r\nServer: x\r\n\r\n";
        assert_eq!(content_length(headers), None);
    }

    #[tokio::test]
    async fn assembles_declared_length_body() {
        let raw = b"HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhello".to_vec();
        let mut reader = std::io::Cursor::new(raw.clone());
        let artifact = assemble_response(&mut reader).await.unwrap();
        assert_eq!(artifact.bytes.as_ref(), &raw[..]);
        assert_eq!(artifact.body_len, 5);
    }

    #[tokio::test]
    async fn assembles_undeclared_length_body_to_eof() {
        let raw = b"HTTP/1.0 200 OK\r\n\r\nhello world".to_vec();
        let mut reader = std::io::Cursor::new(raw.clone());
        let artifact = assemble_response(&mut reader).await.unwrap();
        assert_eq!(artifact.bytes.as_ref(), &raw[..]);
    }

    #[tokio::test]
    async fn undeclared_oversize_body_errors() {
        let mut raw = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
        raw.extend(std::iter::repeat(b'x').take(MAX_OBJECT_SIZE + 1));
        let mut reader = std::io::Cursor::new(raw);
        let err = assemble_response(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProxyError::OversizeUndeclared));
    }
}
