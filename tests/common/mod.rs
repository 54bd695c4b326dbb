//! Shared helpers for integration tests: a started server and a raw HTTP/1.1 client.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use lightweight_actuator::actuator::{
    EnvironmentSnapshot, EnvironmentSource, PropertySource, Providers, SimpleMetricsRegistry,
};
use lightweight_actuator::{ActuatorServer, Config, ProviderError};

pub struct FixedEnvironment;

impl EnvironmentSource for FixedEnvironment {
    fn snapshot(&self) -> Result<EnvironmentSnapshot, ProviderError> {
        Ok(EnvironmentSnapshot {
            active_profiles: vec!["it".to_string()],
            property_sources: vec![PropertySource::new("fixed").with_property("app.name", "demo")],
        })
    }
}

/// Config bound to an ephemeral loopback port with a short grace period
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.workers = Some(2);
    config.actuator.enabled = true;
    config.shutdown.grace_period_secs = 1;
    config
}

pub fn test_providers() -> Providers {
    Providers::new(
        Arc::new(SimpleMetricsRegistry::with_names(["a.first", "b.second", "c.third"])),
        Arc::new(FixedEnvironment),
    )
}

pub fn start(providers: Providers) -> ActuatorServer {
    ActuatorServer::start(&test_config(), providers).expect("server should start")
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body should be JSON")
    }
}

/// Send one request with `Connection: close` and read the whole answer
pub fn send(addr: SocketAddr, method: &str, path: &str) -> std::io::Result<RawResponse> {
    send_raw(addr, method, path).map(|raw| parse_response(&raw))
}

/// Same as [`send`] but returns the bytes as received
pub fn send_raw(addr: SocketAddr, method: &str, path: &str) -> std::io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect_timeout(&addr, Duration::from_secs(2))?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    )?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;
    Ok(raw)
}

/// Write a keep-alive GET on an open connection
pub fn write_keep_alive_get(stream: &mut TcpStream, path: &str) -> std::io::Result<()> {
    let addr = stream.peer_addr()?;
    write!(stream, "GET {path} HTTP/1.1\r\nHost: {addr}\r\n\r\n")
}

/// Read exactly one response from a connection that stays open
pub fn read_one_response(stream: &mut TcpStream) -> std::io::Result<RawResponse> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(split) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = parse_response(&raw[..split + 4]);
            let length: usize = head
                .header("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            if raw.len() >= split + 4 + length {
                return Ok(parse_response(&raw[..split + 4 + length]));
            }
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        raw.extend_from_slice(&chunk[..n]);
    }
}

pub fn get(addr: SocketAddr, path: &str) -> RawResponse {
    send(addr, "GET", path).expect("request should succeed")
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response should contain a header terminator");
    let head = String::from_utf8_lossy(&raw[..split]);
    let mut lines = head.split("\r\n");

    let status_line = lines.next().expect("status line");
    let status = status_line
        .split(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}
