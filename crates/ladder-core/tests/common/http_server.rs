//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves one static body on every path. Paths under `/missing` answer 404.
//! HEAD reports `Content-Length` and, when advertised, `Accept-Ranges: bytes`;
//! GET with `Range` answers 206 when ranges are supported. A stalling server
//! accepts connections and never replies.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How long a stalled connection is held before the server drops it.
const STALL_FOR: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// If false, GET ignores `Range` and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes`. Advertising without supporting
    /// simulates a server that lies about ranges.
    pub advertise_ranges: bool,
    /// If true, read each request and never answer, holding the connection open.
    pub stall: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            advertise_ranges: true,
            stall: false,
        }
    }
}

/// Starts a server in a background thread serving `body`. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: ServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let req = parse_request(request);

    if opts.stall {
        thread::sleep(STALL_FOR);
        return;
    }

    if req.path.starts_with("/missing") {
        let not_found = b"not found";
        let head = format!(
            "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            not_found.len()
        );
        let _ = stream.write_all(head.as_bytes());
        if !req.method.eq_ignore_ascii_case("HEAD") {
            let _ = stream.write_all(not_found);
        }
        return;
    }

    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if req.method.eq_ignore_ascii_case("HEAD") {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            total, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !req.method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let (status, slice) = match req.range.filter(|_| opts.support_ranges) {
        Some((start, end_incl)) => {
            let end_excl = end_incl.saturating_add(1).min(total);
            if start >= end_excl {
                ("416 Range Not Satisfiable", &body[0..0])
            } else {
                ("206 Partial Content", &body[start as usize..end_excl as usize])
            }
        }
        None => ("200 OK", body),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        slice.len(),
        accept_ranges
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

struct Request<'a> {
    method: &'a str,
    path: &'a str,
    /// `(start, end_inclusive)` from `Range: bytes=X-Y`.
    range: Option<(u64, u64)>,
}

fn parse_request(request: &str) -> Request<'_> {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        if let Some(spec) = value.trim().strip_prefix("bytes=") {
            if let Some((a, b)) = spec.split_once('-') {
                let start = a.trim().parse::<u64>().unwrap_or(0);
                let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                range = Some((start, end));
            }
        }
    }
    Request {
        method,
        path,
        range,
    }
}
