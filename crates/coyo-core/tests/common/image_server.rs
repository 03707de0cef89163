//! Minimal HTTP/1.1 server with canned image and error routes for integration tests.
//!
//! Routes:
//! - `/img/{n}`: 200, `image/jpeg`, body from [`image_body`]
//! - `/upper/{n}`: 200, `IMAGE/PNG`, body from [`image_body`]
//! - `/empty`: 200, `image/png`, empty body
//! - `/html`: 200, `text/html`
//! - `/missing-image`: 404, `image/png`
//! - `/redirect/{n}`: 302 to `/img/{n}`
//! - `/slow`: waits before answering (for timeout tests)
//! - `/trickle`: 200, `image/jpeg`, body sent one byte at a time (see [`TRICKLE_BODY`])
//! - `/truncated`: 200, `image/jpeg`, closes before the advertised length is sent
//! - anything else: 404, `text/plain`

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// How long `/slow` stalls before sending headers.
pub const SLOW_DELAY: Duration = Duration::from_secs(4);

/// Body of `/trickle`, written one byte every [`TRICKLE_INTERVAL`].
pub const TRICKLE_BODY: &[u8] = b"\xFF\xD8\xFF\xE0tric";
pub const TRICKLE_INTERVAL: Duration = Duration::from_millis(400);

/// Deterministic body for `/img/{n}`.
pub fn image_body(n: u64) -> Vec<u8> {
    let mut body = vec![0xFF, 0xD8, 0xFF, 0xE0];
    body.extend((0..(n % 7 + 1) * 1024).map(|i| ((i + n) % 251) as u8));
    body
}

/// Starts a server in a background thread. Returns the base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handle(stream));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

/// URL on a port nothing listens on (connection refused).
pub fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/img/1", port)
}

fn handle(mut stream: TcpStream) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf);
    let path = request
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let n = segments.get(1).and_then(|s| s.parse::<u64>().ok());
    match (segments[0], n) {
        ("img", Some(n)) => respond(&mut stream, "200 OK", "image/jpeg", &image_body(n), None),
        ("upper", Some(n)) => respond(&mut stream, "200 OK", "IMAGE/PNG", &image_body(n), None),
        ("empty", _) => respond(&mut stream, "200 OK", "image/png", b"", None),
        ("html", _) => respond(&mut stream, "200 OK", "text/html", b"<html></html>", None),
        ("missing-image", _) => respond(&mut stream, "404 Not Found", "image/png", b"", None),
        ("redirect", Some(n)) => {
            let location = format!("/img/{}", n);
            respond(&mut stream, "302 Found", "text/plain", b"", Some(&location))
        }
        ("slow", _) => {
            thread::sleep(SLOW_DELAY);
            respond(&mut stream, "200 OK", "image/jpeg", &image_body(1), None)
        }
        ("trickle", _) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                TRICKLE_BODY.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.flush();
            for byte in TRICKLE_BODY {
                thread::sleep(TRICKLE_INTERVAL);
                if stream.write_all(&[*byte]).and_then(|_| stream.flush()).is_err() {
                    return;
                }
            }
        }
        ("truncated", _) => {
            let body = image_body(1);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len() * 2
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        }
        _ => respond(&mut stream, "404 Not Found", "text/plain", b"not found", None),
    }
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8], location: Option<&str>) {
    let location = location
        .map(|l| format!("Location: {}\r\n", l))
        .unwrap_or_default();
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        content_type,
        body.len(),
        location
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
