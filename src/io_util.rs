//! Robust I/O wrappers, the Rust-async analogue of `io_wrappers.c`'s
//! `rio_readlineb_w`/`rio_readnb_w`/`rio_writen_w`.
//!
//! Tokio already retries `EINTR` internally, so the one thing left for this
//! module to do is classify the two cases the C wrappers special-cased:
//! a peer reset on read looks like clean EOF, and `EPIPE` on write is a
//! recoverable error the caller must propagate rather than crash on.

use bytes::BytesMut;
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::ProxyError;

/// Cap on a single request or response header block (spec.md §2), shared by
/// both the client-facing reader and the origin-facing one.
pub const MAX_HEADER_SIZE: usize = 8192;

/// Read into `buf` until `\r\n\r\n` appears or `max_bytes` is exceeded.
///
/// Returns `Ok(true)` once the terminator is present, `Ok(false)` on clean
/// EOF before any terminator was seen (including a reset, which we fold
/// into EOF the same way the source's `rio_read_w` does for `ECONNRESET`).
pub async fn read_headers_until_blank_line<R>(
    reader: &mut R,
    buf: &mut BytesMut,
    max_bytes: usize,
) -> crate::error::Result<bool>
where
    R: tokio::io::AsyncRead + Unpin,
{
    loop {
        if has_header_terminator(buf) {
            return Ok(true);
        }
        if buf.len() >= max_bytes {
            return Err(ProxyError::MalformedRequest);
        }
        match reader.read_buf(buf).await {
            Ok(0) => return Ok(false),
            Ok(_) => continue,
            Err(e) if is_reset(&e) => return Ok(false),
            Err(e) => return Err(io_err_to_proxy(e)),
        }
    }
}

pub fn has_header_terminator(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n")
}

/// Robustly write the entire buffer, distinguishing a broken pipe from any
/// other write failure so the caller can treat it as a recoverable,
/// mid-transfer disconnect rather than propagate a generic I/O error.
pub async fn write_all_robust<W>(writer: &mut W, bytes: &[u8]) -> crate::error::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    match writer.write_all(bytes).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(ProxyError::BrokenPipe),
        Err(e) if is_reset(&e) => Err(ProxyError::PeerClosed),
        Err(e) => Err(io_err_to_proxy(e)),
    }
}

fn is_reset(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::UnexpectedEof
    )
}

fn io_err_to_proxy(e: std::io::Error) -> ProxyError {
    if e.kind() == ErrorKind::BrokenPipe {
        ProxyError::BrokenPipe
    } else {
        ProxyError::PeerClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_header_terminator() {
        assert!(has_header_terminator(b"GET / HTTP/1.0\r\n\r\n"));
        assert!(!has_header_terminator(b"GET / HTTP/1.0\r\nHost: x\r\n"));
    }

    #[tokio::test]
    async fn reads_until_blank_line() {
        let data = b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n".to_vec();
        let mut reader = std::io::Cursor::new(data.clone());
        let mut buf = BytesMut::new();
        let got = read_headers_until_blank_line(&mut reader, &mut buf, 8192)
            .await
            .unwrap();
        assert!(got);
        assert_eq!(&buf[..], &data[..]);
    }

    #[tokio::test]
    async fn clean_eof_before_terminator_is_not_an_error() {
        let data = b"GET / HTTP/1.0\r\nHost: example.com".to_vec();
        let mut reader = std::io::Cursor::new(data);
        let mut buf = BytesMut::new();
        let got = read_headers_until_blank_line(&mut reader, &mut buf, 8192)
            .await
            .unwrap();
        assert!(!got);
    }

    #[tokio::test]
    async fn oversize_request_is_malformed() {
        let data = vec![b'x'; 100];
        let mut reader = std::io::Cursor::new(data);
        let mut buf = BytesMut::new();
        let err = read_headers_until_blank_line(&mut reader, &mut buf, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::MalformedRequest));
    }
}
