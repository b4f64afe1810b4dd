//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use postern::http::HttpServer;
use postern::lifecycle::ServerState;

/// Start a mock origin that captures each request's raw bytes and answers
/// with a fixed 200 response. The captured request (head and body) arrives
/// on the returned channel.
pub async fn start_capture_backend(
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            tokio::spawn(async move {
                let captured = read_request(&mut socket).await;
                let _ = tx.send(captured);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Start a mock origin that reads each request, stalls for `delay`, then
/// answers 200. Used to hold proxied requests in flight across a shutdown.
#[allow(dead_code)]
pub async fn start_stalling_backend(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nslow",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Read one fixed-length request (head plus Content-Length body) from the
/// socket. Requests here never use chunked bodies: the proxy either streams
/// fixed-length bodies through or has already aggregated them.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            return String::from_utf8_lossy(&data).into_owned();
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = find_head_end(&data) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
    let body_len = content_length(&head);
    while data.len() < head_end + 4 + body_len {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn find_head_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Serve the proxy on an ephemeral port, returning its address. The server
/// runs until the state's shutdown handle fires.
#[allow(dead_code)]
pub fn start_proxy(state: Arc<ServerState>) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let router = HttpServer::router(state.clone());
    let handle = state.shutdown.server_handle();

    tokio::spawn(async move {
        let service = router.into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum_server::from_tcp(listener)
            .handle(handle)
            .serve(service)
            .await;
        state.shutdown.mark_finished();
    });

    addr
}
