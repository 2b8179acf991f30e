//! Minimal threaded HTTP/1.1 upstream for integration tests.
//!
//! Serves canned responses keyed by request path and records every request so
//! tests can assert on outbound traffic. Connections are kept alive until the
//! client closes them; each client-side close is counted.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::status(status).header("Location", location)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    accepted: AtomicUsize,
    closed: AtomicUsize,
}

pub struct UpstreamServer {
    base: String,
    port: u16,
    shared: Arc<Shared>,
}

impl UpstreamServer {
    /// Base URL with a trailing slash, e.g. `http://127.0.0.1:12345/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.shared.requests.lock().unwrap().len()
    }

    pub fn hits_for(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    /// Client connections accepted so far.
    pub fn connections(&self) -> usize {
        self.shared.accepted.load(Ordering::SeqCst)
    }

    pub fn closed_connections(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` client connections were closed.
    pub fn wait_for_closed(&self, n: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.closed_connections() >= n {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }
}

/// Start serving `routes` in background threads until the process exits.
/// Unknown paths answer 404.
pub fn start(routes: Vec<(&str, Canned)>) -> UpstreamServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Canned>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, canned)| (path.to_string(), canned))
            .collect(),
    );
    let shared = Arc::new(Shared::default());
    let accept_shared = Arc::clone(&shared);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let shared = Arc::clone(&accept_shared);
            shared.accepted.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || serve(stream, &routes, &shared));
        }
    });
    UpstreamServer {
        base: format!("http://127.0.0.1:{}/", port),
        port,
        shared,
    }
}

/// Accept connections and never answer; each one is held until the client
/// hangs up. Returns the base URL with a trailing slash.
pub fn start_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            thread::spawn(move || {
                let mut buf = [0u8; 1024];
                while matches!(stream.read(&mut buf), Ok(n) if n > 0) {}
            });
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn serve(mut stream: TcpStream, routes: &HashMap<String, Canned>, shared: &Shared) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let head_end = loop {
            if let Some(pos) = find_head_end(&pending) {
                break pos;
            }
            match stream.read(&mut buf) {
                Ok(0) => {
                    shared.closed.fetch_add(1, Ordering::SeqCst);
                    return;
                }
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(_) => return,
            }
        };
        let head: Vec<u8> = pending.drain(..head_end + 4).collect();
        let Some(request) = parse_request(&String::from_utf8_lossy(&head)) else {
            return;
        };
        let canned = routes
            .get(&request.path)
            .cloned()
            .unwrap_or_else(|| Canned::status(404));
        let head_only = request.method.eq_ignore_ascii_case("HEAD");
        shared.requests.lock().unwrap().push(request);

        let mut response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n",
            canned.status,
            reason(canned.status),
            canned.body.len()
        );
        for (name, value) in &canned.headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str("\r\n");
        if stream.write_all(response.as_bytes()).is_err() {
            return;
        }
        if !head_only && stream.write_all(&canned.body).is_err() {
            return;
        }
    }
}

fn find_head_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_request(head: &str) -> Option<RecordedRequest> {
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let target = first.next()?;
    let path = target.split('?').next().unwrap_or(target).to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Some(RecordedRequest {
        method,
        path,
        headers,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
