//! Request descriptor and request-line/URL parsing (spec.md §4.2).
//!
//! Mirrors `readparse_request`/`parse_url` in
//! `examples/original_source/proxy.c`: only `GET` is forwarded, only an
//! `http` scheme is accepted (`https` is rejected explicitly, not merely
//! "anything that isn't http"), and a missing `abs_path` defaults to `/`.

use crate::error::{ProxyError, Result};

/// One header line as received from the client, kept byte-exact for
/// pass-through (see `headers::rewrite`).
#[derive(Debug, Clone)]
pub struct RawHeader {
    pub name: String,
    pub value: Vec<u8>,
}

/// A parsed client request. `url` is preserved byte-identical to what the
/// client sent on the request line — it is the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub host: String,
    pub port: u16,
    pub abs_path: String,
}

/// Parse a complete client request (request line + headers) out of `buf`.
///
/// Returns the request descriptor together with the raw header lines still
/// to be rewritten, or a `ProxyError` identifying exactly why the request
/// was rejected (non-GET, bad scheme, or malformed).
pub fn parse_client_request(buf: &[u8]) -> Result<(Request, Vec<RawHeader>)> {
    let mut header_space = [httparse::EMPTY_HEADER; 64];
    let mut req = httparse::Request::new(&mut header_space);

    let status = req.parse(buf).map_err(|_| ProxyError::MalformedRequest)?;
    if status.is_partial() {
        return Err(ProxyError::MalformedRequest);
    }

    let method = req.method.ok_or(ProxyError::MalformedRequest)?;
    if method != "GET" {
        return Err(ProxyError::NotImplemented(method.to_string()));
    }

    let url = req.path.ok_or(ProxyError::MalformedRequest)?.to_string();
    let (host, port, abs_path) = parse_absolute_url(&url)?;

    let headers = req
        .headers
        .iter()
        .map(|h| RawHeader {
            name: h.name.to_string(),
            value: h.value.to_vec(),
        })
        .collect();

    Ok((
        Request {
            url,
            host,
            port,
            abs_path,
        },
        headers,
    ))
}

/// Split `scheme://host[:port][abs_path]` per spec.md §4.2.
///
/// Default port is 80; an empty or missing `abs_path` becomes `/`.
fn parse_absolute_url(url: &str) -> Result<(String, u16, String)> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| ProxyError::BadScheme(url.to_string()))?;

    let scheme_lower = scheme.to_ascii_lowercase();
    if scheme_lower == "https" || !scheme_lower.starts_with("http") {
        return Err(ProxyError::BadScheme(scheme.to_string()));
    }

    let (authority, suffix) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port_str)) => {
            let port: u16 = port_str.parse().unwrap_or(80);
            (host.to_string(), port)
        }
        None => (authority.to_string(), 80),
    };

    let abs_path = if suffix.is_empty() {
        "/".to_string()
    } else {
        suffix.to_string()
    };

    Ok((host, port, abs_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_get() {
        let buf = b"GET http://example.com/a HTTP/1.0\r\nHost: example.com\r\n\r\n";
        let (req, headers) = parse_client_request(buf).unwrap();
        assert_eq!(req.url, "http://example.com/a");
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, 80);
        assert_eq!(req.abs_path, "/a");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn defaults_empty_path_to_slash() {
        let buf = b"GET http://example.com HTTP/1.0\r\n\r\n";
        let (req, _) = parse_client_request(buf).unwrap();
        assert_eq!(req.abs_path, "/");
        assert_eq!(req.url, "http://example.com");
    }

    #[test]
    fn parses_explicit_port() {
        let buf = b"GET http://example.com:8080/x HTTP/1.0\r\n\r\n";
        let (req, _) = parse_client_request(buf).unwrap();
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, 8080);
        assert_eq!(req.abs_path, "/x");
    }

    #[test]
    fn rejects_non_get() {
        let buf = b"POST http://example.com/ HTTP/1.0\r\n\r\n";
        let err = parse_client_request(buf).unwrap_err();
        assert!(matches!(err, ProxyError::NotImplemented(m) if m == "POST"));
    }

    #[test]
    fn rejects_https_scheme() {
        let buf = b"GET https://example.com/ HTTP/1.0\r\n\r\n";
        let err = parse_client_request(buf).unwrap_err();
        assert!(matches!(err, ProxyError::BadScheme(_)));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let buf = b"GET ftp://example.com/ HTTP/1.0\r\n\r\n";
        let err = parse_client_request(buf).unwrap_err();
        assert!(matches!(err, ProxyError::BadScheme(_)));
    }

    #[test]
    fn url_is_byte_identical_to_request_line() {
        let buf = b"GET http://Example.COM:81/Weird/Path?q=1 HTTP/1.0\r\n\r\n";
        let (req, _) = parse_client_request(buf).unwrap();
        assert_eq!(req.url, "http://Example.COM:81/Weird/Path?q=1");
    }
}
