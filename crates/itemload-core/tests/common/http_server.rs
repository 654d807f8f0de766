//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves canned replies keyed by request path. Unknown paths get 404.
//! Every response closes the connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct Reply {
    /// Status line tail, e.g. "200 OK".
    pub status: &'static str,
    pub content_type: Option<&'static str>,
    /// Extra raw header lines, without CRLF.
    pub headers: Vec<String>,
    pub body: Vec<u8>,
    /// If set, advertise this Content-Length instead of the real one; a larger
    /// value makes the client see the body stream end early.
    pub declared_len: Option<usize>,
}

impl Reply {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            content_type: Some(content_type),
            headers: Vec::new(),
            body: body.into(),
            declared_len: None,
        }
    }

    pub fn status(status: &'static str) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            headers: Vec::new(),
            body: b"not here".to_vec(),
            declared_len: None,
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: "302 Found",
            content_type: Some("text/html"),
            headers: vec![format!("Location: {}", location)],
            body: b"<a>moved</a>".to_vec(),
            declared_len: None,
        }
    }

    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    pub fn truncated(mut self, declared_len: usize) -> Self {
        self.declared_len = Some(declared_len);
        self
    }
}

/// Starts a server in a background thread serving `routes`. Returns the base
/// URL without a trailing slash (e.g. "http://127.0.0.1:12345"). The server
/// runs until the process exits.
pub fn start(routes: Vec<(&'static str, Reply)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<&'static str, Reply>> = Arc::new(routes.into_iter().collect());
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

/// Serves one reply at "/" and returns its full URL.
pub fn serve(reply: Reply) -> String {
    format!("{}/", start(vec![("/", reply)]))
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<&'static str, Reply>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = request
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/");

    let not_found = Reply::status("404 Not Found");
    let reply = routes.get(path).unwrap_or(&not_found);

    let mut head = format!("HTTP/1.1 {}\r\n", reply.status);
    if let Some(ct) = reply.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    for h in &reply.headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    let len = reply.declared_len.unwrap_or(reply.body.len());
    head.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", len));

    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
}
