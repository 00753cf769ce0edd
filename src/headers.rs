//! Header rewriter (spec.md §4.3) — mirrors `send_request` in
//! `examples/original_source/proxy.c`: a client `Host:` line overrides the
//! text of the emitted `Host:` header (not the dial target, which is fixed
//! by the URL before this runs — see `worker::handle_connection`),
//! `Connection`/`Proxy-Connection`/`Accept`/`Accept-Encoding` are dropped,
//! everything else is forwarded byte-for-byte.

use bytes::{BytesMut, Bytes};

use crate::request::RawHeader;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:84.0) Gecko/20100101 Firefox/84.0";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_ENCODING: &str = "gzip, deflate";

const DROPPED: [&str; 4] = ["connection", "proxy-connection", "accept", "accept-encoding"];

/// Build the full request the proxy sends to the origin: rewritten request
/// line, the fixed proxy header block, the forwarded client headers, then
/// the blank-line terminator.
pub fn rewrite(abs_path: &str, url_host: &str, headers: &[RawHeader]) -> Bytes {
    let mut host_override: Option<String> = None;
    let mut forwarded = BytesMut::new();

    for h in headers {
        let lname = h.name.to_ascii_lowercase();
        if lname == "host" {
            host_override = Some(String::from_utf8_lossy(&h.value).trim().to_string());
            continue;
        }
        if DROPPED.contains(&lname.as_str()) {
            continue;
        }
        forwarded.extend_from_slice(h.name.as_bytes());
        forwarded.extend_from_slice(b": ");
        forwarded.extend_from_slice(&h.value);
        forwarded.extend_from_slice(b"\r\n");
    }

    let effective_host = host_override.unwrap_or_else(|| url_host.to_string());

    let mut out = BytesMut::new();
    out.extend_from_slice(format!("GET {abs_path} HTTP/1.0\r\n").as_bytes());
    out.extend_from_slice(format!("Host: {effective_host}\r\n").as_bytes());
    out.extend_from_slice(format!("User-Agent: {USER_AGENT}\r\n").as_bytes());
    out.extend_from_slice(format!("Accept: {ACCEPT}\r\n").as_bytes());
    out.extend_from_slice(format!("Accept-Encoding: {ACCEPT_ENCODING}\r\n").as_bytes());
    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(b"Proxy-Connection: close\r\n");
    out.extend_from_slice(&forwarded);
    out.extend_from_slice(b"\r\n");
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> RawHeader {
        RawHeader {
            name: name.to_string(),
            value: value.as_bytes().to_vec(),
        }
    }

    #[test]
    fn emits_fixed_proxy_block_and_forwards_others() {
        let headers = vec![header("User-Agent", "curl/8.0"), header("X-Custom", "yes")];
        let out = rewrite("/a", "example.com", &headers);
        let text = String::from_utf8(out.to_vec()).unwrap();

        assert!(text.starts_with("GET /a HTTP/1.0\r\n"));
        assert!(text.contains("Host: example.com\r\n"));
        assert!(text.contains("User-Agent: Mozilla/5.0"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains("Proxy-Connection: close\r\n"));
        assert!(text.contains("User-Agent: curl/8.0\r\n"));
        assert!(text.contains("X-Custom: yes\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn drops_connection_and_accept_headers() {
        let headers = vec![
            header("Connection", "keep-alive"),
            header("Proxy-Connection", "keep-alive"),
            header("Accept", "*/*"),
            header("Accept-Encoding", "br"),
            header("X-Keep", "me"),
        ];
        let out = rewrite("/", "example.com", &headers);
        let text = String::from_utf8(out.to_vec()).unwrap();

        assert_eq!(text.matches("Connection: close").count(), 1);
        assert_eq!(text.matches("Proxy-Connection: close").count(), 1);
        assert_eq!(text.matches("Accept:").count(), 1);
        assert_eq!(text.matches("Accept-Encoding:").count(), 1);
        assert!(!text.contains("keep-alive"));
        assert!(!text.contains("*/*"));
        assert!(!text.contains("br\r\n"));
        assert!(text.contains("X-Keep: me\r\n"));
    }

    #[test]
    fn host_header_overrides_emitted_host_line_only() {
        let headers = vec![header("Host", "virtual.example.com:9090")];
        let out = rewrite("/a", "example.com", &headers);
        let text = String::from_utf8(out.to_vec()).unwrap();

        assert!(text.contains("Host: virtual.example.com:9090\r\n"));
        assert_eq!(text.matches("Host:").count(), 1);
    }

    #[test]
    fn falls_back_to_url_host_without_override() {
        let out = rewrite("/", "example.com", &[]);
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.contains("Host: example.com\r\n"));
    }
}
