//! In-process HTTP backend for adapter tests.
//!
//! [`MockServer`] answers each accepted connection with the next canned
//! [`MockResponse`] and records what the client sent. A response built with
//! [`MockResponse::held_sse`] keeps its connection open after the last event
//! so tests can observe when the client lets go of it.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request target, e.g. `/v1/chat/completions`.
    pub fn path(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    content_type: &'static str,
    body: String,
    held_events: Option<Vec<String>>,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            held_events: None,
        }
    }

    /// An event stream made of one `data:` line per payload.
    pub fn sse<S: AsRef<str>>(payloads: &[S]) -> Self {
        let body = payloads
            .iter()
            .map(|payload| format!("data: {}\n\n", payload.as_ref()))
            .collect();
        Self {
            status: 200,
            content_type: "text/event-stream",
            body,
            held_events: None,
        }
    }

    /// A chunked event stream that never ends on its own: the server sends
    /// every payload and then waits for the client to close the connection.
    pub fn held_sse<S: AsRef<str>>(payloads: &[S]) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            body: String::new(),
            held_events: Some(
                payloads
                    .iter()
                    .map(|payload| format!("data: {}\n\n", payload.as_ref()))
                    .collect(),
            ),
        }
    }

    /// An event stream with a raw, pre-formatted body.
    pub fn raw_sse(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            body: body.into(),
            held_events: None,
        }
    }
}

pub struct MockServer {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    disconnected: Arc<Notify>,
}

impl MockServer {
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured_for_server = Arc::clone(&captured);
        let disconnected = Arc::new(Notify::new());
        let disconnected_for_server = Arc::clone(&disconnected);

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Ok(request) = read_http_request(&mut stream).await else {
                    return;
                };
                captured_for_server.lock().await.push(request);

                if let Some(events) = &response.held_events {
                    hold_event_stream(&mut stream, events).await;
                    disconnected_for_server.notify_one();
                    continue;
                }

                let reason = if response.status < 400 { "OK" } else { "Error" };
                let payload = format!(
                    "HTTP/1.1 {} {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    response.status,
                    reason,
                    response.content_type,
                    response.body.len(),
                    response.body
                );
                let _ = stream.write_all(payload.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            captured,
            disconnected,
        }
    }

    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }

    /// Resolves once the client has closed a held event stream.
    pub async fn client_disconnected(&self) {
        self.disconnected.notified().await;
    }

    pub async fn single_request(&self) -> CapturedRequest {
        let requests = self.requests().await;
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().expect("one request")
    }
}

/// Writes `events` as chunks, then blocks until the peer closes the socket.
async fn hold_event_stream(stream: &mut TcpStream, events: &[String]) {
    let mut payload = String::from(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n",
    );
    for event in events {
        payload.push_str(&format!("{:x}\r\n{}\r\n", event.len(), event));
    }
    if stream.write_all(payload.as_bytes()).await.is_err() {
        return;
    }
    let _ = stream.flush().await;

    let mut scratch = [0_u8; 256];
    loop {
        match stream.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

/// Client that ignores proxy settings from the environment.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client should build")
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}
