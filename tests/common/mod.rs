//! Shared helpers for transport integration tests.

#![allow(dead_code)]

use integrations_ipfs::IpfsConfig;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::MockServer;

/// A mock daemon together with the runtime used to configure it.
///
/// Tests call the blocking transport from the test thread, so the mock server
/// is driven from its own runtime rather than `#[tokio::test]`.
pub struct MockDaemon {
    pub runtime: Runtime,
    pub server: MockServer,
}

impl MockDaemon {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("failed to build test runtime");
        let server = runtime.block_on(MockServer::start());
        Self { runtime, server }
    }

    /// Mounts a mock on the server.
    pub fn mount(&self, mock: wiremock::Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Client configuration pointing at the mock daemon.
    pub fn config(&self) -> IpfsConfig {
        let address = self.server.address();
        IpfsConfig::builder()
            .host(address.ip().to_string())
            .port(address.port())
            .build()
            .expect("valid config")
    }

    /// Full URL for an API path on the mock daemon.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.server.uri(), path)
    }
}

/// A listener that accepts connections into its backlog but never answers.
pub fn silent_endpoint() -> (TcpListener, IpfsConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let config = IpfsConfig::builder()
        .host("127.0.0.1")
        .port(port)
        .timeout("10m")
        .poll_interval(Duration::from_millis(20))
        .build()
        .expect("valid config");
    (listener, config)
}

/// Serves one request: sends the headers of a large reply and `prefix` of its
/// body, then stalls. The open connection is handed back through the receiver
/// so the test decides when it closes.
pub fn stalled_body_endpoint(prefix: &'static [u8]) -> (IpfsConfig, Receiver<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).expect("read request");
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/octet-stream\r\n\
                  Content-Length: 1000000\r\n\r\n",
            )
            .expect("write headers");
        stream.write_all(prefix).expect("write prefix");
        stream.flush().expect("flush");
        let _ = tx.send(stream);
    });

    let config = IpfsConfig::builder()
        .host("127.0.0.1")
        .port(port)
        .poll_interval(Duration::from_millis(20))
        .build()
        .expect("valid config");
    (config, rx)
}

/// A sink whose contents the test thread can watch while a fetch writes to it.
#[derive(Clone, Default)]
pub struct SharedSink(pub Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
