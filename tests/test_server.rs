use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use liteserve::cache::ContentCache;
use liteserve::config::Config;
use liteserve::error::ServerError;
use liteserve::http::responder::Responder;
use liteserve::server::listener;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Starts a server on an ephemeral port serving a small site.
async fn start() -> (SocketAddr, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("a.txt"), "alpha").unwrap();

    let mut cfg = Config::default();
    cfg.static_files.root = dir.path().to_path_buf();
    cfg.server.min_workers = 2;
    cfg.server.max_workers = 2;
    cfg.server.read_timeout_ms = 2_000;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let cache = Arc::new(ContentCache::new(cfg.static_files.cache_capacity));
    let responder = Arc::new(Responder::from_config(&cfg, cache));
    tokio::spawn(async move {
        let pool = listener::connection_pool(&cfg, responder);
        let _ = listener::serve(listener, &pool).await;
    });

    (addr, dir)
}

async fn exchange(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn test_get_file_over_the_wire() {
    let (addr, _dir) = start().await;

    let reply = exchange(addr, b"GET /index.html HTTP/1.0\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
    assert!(reply.contains("Server: liteserve\r\n"));
    assert!(reply.contains("Content-Type: text/html\r\n"));
    assert!(reply.ends_with("\r\n\r\n<h1>home</h1>\r\n"));
}

#[tokio::test]
async fn test_missing_file_over_the_wire() {
    let (addr, _dir) = start().await;

    let reply = exchange(addr, b"GET /missing HTTP/1.0\r\n\r\n").await;

    assert_eq!(
        reply,
        "HTTP/1.0 404 Not Found\r\n\
         Connection: close\r\n\
         Server: liteserve\r\n\
         \r\n\
         404 Not Found\r\n"
    );
}

#[tokio::test]
async fn test_head_over_the_wire() {
    let (addr, _dir) = start().await;

    let reply = exchange(addr, b"HEAD /index.html HTTP/1.0\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(!reply.contains("<h1>"));
}

#[tokio::test]
async fn test_malformed_request_gets_400() {
    let (addr, _dir) = start().await;

    let reply = exchange(addr, b"NONSENSE\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.0 400 Bad Request\r\n"));

    let reply = exchange(addr, b"\xff\xfe\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.0 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_client_closing_early_still_gets_400() {
    let (addr, _dir) = start().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert!(buf.starts_with(b"HTTP/1.0 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_directory_listing_over_the_wire() {
    let (addr, _dir) = start().await;

    let reply = exchange(addr, b"GET /docs HTTP/1.0\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(reply.contains("<a href=\"/docs/a.txt\">"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients_all_served() {
    let (addr, _dir) = start().await;

    let clients: Vec<_> = (0..50)
        .map(|i| {
            tokio::spawn(async move {
                let path = if i % 2 == 0 { "/index.html" } else { "/docs/a.txt" };
                let raw = format!("GET {path} HTTP/1.0\r\n\r\n");
                exchange(addr, raw.as_bytes()).await
            })
        })
        .collect();

    for client in clients {
        let reply = client.await.unwrap();
        assert!(reply.starts_with("HTTP/1.0 200 OK\r\n"), "{reply}");
    }
}

#[tokio::test]
async fn test_server_keeps_serving_after_bad_clients() {
    let (addr, _dir) = start().await;

    for _ in 0..5 {
        // Connect and vanish without sending anything readable.
        let stream = TcpStream::connect(addr).await.unwrap();
        drop(stream);
    }

    let reply = exchange(addr, b"GET /docs/a.txt HTTP/1.0\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(reply.ends_with("alpha\r\n"));
}

#[tokio::test]
async fn test_bind_rejects_out_of_range_port() {
    let mut cfg = Config::default();
    cfg.server.port = 65535;

    let err = listener::bind(&cfg).await.unwrap_err();
    assert!(matches!(err, ServerError::InvalidPort(65535)));
}

#[tokio::test]
async fn test_bind_reports_port_in_use() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = taken.local_addr().unwrap().port();

    let err = listener::bind(&cfg).await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
}
