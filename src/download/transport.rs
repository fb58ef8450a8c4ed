//! HTTP 传输层：按块流式写入响应体，非 2xx 视为失败。

use std::io::{self, Write};
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Streams the body at `url` into `sink`, returning the number of bytes written.
///
/// Implementations must fail on non-2xx responses without writing the body.
pub trait Transport {
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// Blocking HTTP transport with a fixed whole-request timeout.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        // copy_to reads the body in chunks; memory stays flat regardless of size.
        let written = resp.copy_to(&mut *sink)?;
        sink.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serves `response` to a single connection and returns its URL.
    fn serve_once(response: Vec<u8>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(&response).unwrap();
            stream.flush().unwrap();
        });
        (format!("http://{addr}/audio/001.mp3"), handle)
    }

    /// Loopback requests must not be sent through an HTTP(S)_PROXY from the environment.
    fn local_transport() -> HttpTransport {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpTransport { client }
    }

    fn http_response(status_line: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn non_success_status_writes_nothing() {
        let (url, server) = serve_once(http_response("404 Not Found", b"<html>not here</html>"));
        let transport = local_transport();
        let mut sink = Vec::new();

        let err = transport.fetch_into(&url, &mut sink).unwrap_err();

        assert!(matches!(err, FetchError::Status(404)), "got {err:?}");
        assert!(sink.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn success_body_is_streamed_byte_for_byte() {
        let body: Vec<u8> = (0..1500u32).map(|i| (i % 256) as u8).collect();
        let (url, server) = serve_once(http_response("200 OK", &body));
        let transport = local_transport();
        let mut sink = Vec::new();

        let written = transport.fetch_into(&url, &mut sink).unwrap();

        assert_eq!(written, 1500);
        assert_eq!(sink, body);
        server.join().unwrap();
    }

    #[test]
    fn builds_with_default_settings() {
        assert!(HttpTransport::new(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn unreachable_host_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let transport = local_transport();
        let mut sink = Vec::new();

        let err = transport
            .fetch_into(&format!("http://{addr}/001.mp3"), &mut sink)
            .unwrap_err();

        assert!(matches!(err, FetchError::Request(_)), "got {err:?}");
        assert!(sink.is_empty());
    }
}
