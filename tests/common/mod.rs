#![allow(dead_code)]

use async_trait::async_trait;
use matchbox_api_utils::{Config, ProcessOutput, ProcessRunner, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn api_config(url: &str) -> Config {
    Config::from_iter([
        ("url", url),
        ("username", "mbuser"),
        ("password", "mbpass"),
        ("client_name", "MATCH-Production"),
        ("client_id", "abc123"),
    ])
}

pub fn mongo_config() -> Config {
    Config::from_iter([("mongo_user", "reader"), ("mongo_pass", "s3cret")])
}

/// Token endpoint that answers 500 for the first `failures` requests and a
/// token afterwards. Needed because httpmock cannot sequence responses.
pub struct FlakyTokenEndpoint {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl FlakyTokenEndpoint {
    pub async fn start(failures: usize, token: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let ok_body = format!(r#"{{"id_token": "{}"}}"#, token);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                read_request(&mut stream).await;
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;

                let (status, body) = if n <= failures {
                    ("500 Internal Server Error", r#"{"error": "unavailable"}"#.to_string())
                } else {
                    ("200 OK", ok_body.clone())
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            url: format!("http://{}/oauth/ro", addr),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

/// Stand-in for `mongoexport`: fails `failures` times, then writes
/// `payload` verbatim to the `--out` path.
pub struct StubExport {
    failures: usize,
    payload: String,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubExport {
    pub fn new(failures: usize, payload: &str) -> Arc<Self> {
        Arc::new(Self {
            failures,
            payload: payload.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always_failing() -> Arc<Self> {
        Self::new(usize::MAX, "[]")
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ProcessRunner for StubExport {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        assert_eq!(program, "mongoexport");
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(args.to_vec());
            calls.len()
        };

        if attempt <= self.failures {
            return Ok(ProcessOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: format!("Failed: could not connect to server (attempt {})", attempt),
            });
        }

        let out = args
            .iter()
            .position(|a| a == "--out")
            .map(|i| args[i + 1].clone())
            .expect("--out argument");
        std::fs::write(&out, &self.payload)?;

        Ok(ProcessOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }
}
