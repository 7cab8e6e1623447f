//! End-to-end tests: the real accept loop on an ephemeral port, spoken to
//! over raw HTTP/1.1.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use cidrgate::connection::ConnectionTracker;
use cidrgate::{EnvVarConfig, ManualClock, RequestHistory, server};

struct TestServer {
    addr: SocketAddr,
    clock: ManualClock,
    history: RequestHistory,
    tracker: ConnectionTracker,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    async fn start(vars: &[(&'static str, &'static str)]) -> Self {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        let config = EnvVarConfig::from_env_with(|key| {
            vars.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        })
        .expect("valid test configuration");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let clock = ManualClock::new();
        let history = RequestHistory::new();
        let tracker = ConnectionTracker::new();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(server::serve(
            listener,
            history.clone(),
            Arc::new(config),
            Arc::new(clock.clone()),
            tracker.clone(),
            async move {
                let _ = rx.await;
            },
        ));

        Self {
            addr,
            clock,
            history,
            tracker,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// Sends one request and returns the status code and body.
    async fn request(&self, method: &str, path: &str, headers: &[(&str, &str)]) -> (u16, String) {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();

        let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        for (name, value) in headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        raw.push_str("\r\n");
        stream.write_all(raw.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        parse_response(&String::from_utf8(response).unwrap())
    }

    async fn get_from(&self, xff: &str) -> (u16, String) {
        self.request("GET", "/", &[("X-Forwarded-For", xff)]).await
    }

    async fn get(&self, path: &str) -> (u16, String) {
        self.request("GET", path, &[]).await
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn parse_response(raw: &str) -> (u16, String) {
    let (head, body) = raw.split_once("\r\n\r\n").expect("complete response");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line");
    assert!(
        head.to_ascii_lowercase().contains("content-type: text/plain"),
        "missing text/plain content type in {head:?}"
    );
    (status, body.to_string())
}

// ===========================================
// Routing
// ===========================================

#[tokio::test]
async fn test_root_without_forwarded_header() {
    let server = TestServer::start(&[("NUMBER_OF_REQUESTS", "1")]).await;

    for _ in 0..3 {
        assert_eq!(server.get("/").await, (200, "OK!\n".to_string()));
    }
    assert!(server.history.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_path() {
    let server = TestServer::start(&[]).await;

    assert_eq!(server.get("/metrics").await, (404, "Status Not Found\n".to_string()));

    server.stop().await;
}

#[tokio::test]
async fn test_any_method_is_routed() {
    let server = TestServer::start(&[("NUMBER_OF_REQUESTS", "2")]).await;

    let xff = [("X-Forwarded-For", "10.1.1.1")];
    assert_eq!(server.request("POST", "/", &xff).await.0, 200);
    assert_eq!(server.request("DELETE", "/", &xff).await.0, 200);
    assert_eq!(server.request("PUT", "/", &xff).await.0, 429);

    server.stop().await;
}

// ===========================================
// Rate limiting
// ===========================================

#[tokio::test]
async fn test_scenario_threshold_window_and_cooldown() {
    let server = TestServer::start(&[
        ("NUMBER_OF_REQUESTS", "2"),
        ("UNIT_TIME", "Minute"),
        ("LIMIT_TIME", "1"),
        ("WAIT_TIME", "2"),
    ])
    .await;

    assert_eq!(server.get_from("192.168.1.15").await, (200, "OK!\n".to_string()));
    server.clock.advance(Duration::from_secs(10));
    assert_eq!(server.get_from("192.168.1.99").await.0, 200);

    server.clock.advance(Duration::from_secs(10));
    assert_eq!(
        server.get_from("192.168.1.200").await,
        (429, "Too Many Requests\n".to_string())
    );

    // Another block is unaffected
    assert_eq!(server.get_from("192.168.2.1").await.0, 200);

    // Cooldown: 2 minutes from the second request (t0 + 10s), which
    // reached the threshold. The rejected third request does not extend it.
    server.clock.advance(Duration::from_secs(109));
    assert_eq!(server.get_from("192.168.1.15").await.0, 429);

    server.clock.advance(Duration::from_secs(1));
    assert_eq!(server.get_from("192.168.1.15").await.0, 200);

    server.stop().await;
}

#[tokio::test]
async fn test_first_forwarded_entry_is_the_client() {
    let server = TestServer::start(&[("NUMBER_OF_REQUESTS", "1")]).await;

    assert_eq!(server.get_from("  10.0.0.1 , 10.9.9.9").await.0, 200);
    assert_eq!(server.get_from("10.0.0.2").await.0, 429);
    assert_eq!(server.get_from("10.9.9.9").await.0, 200);

    server.stop().await;
}

#[tokio::test]
async fn test_custom_prefix_groups_wider_block() {
    let server = TestServer::start(&[("NUMBER_OF_REQUESTS", "1"), ("NETWORK_PREFIX", "16")]).await;

    assert_eq!(server.get_from("172.16.1.1").await.0, 200);
    assert_eq!(server.get_from("172.16.200.7").await.0, 429);
    assert_eq!(server.get_from("172.17.0.1").await.0, 200);

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_forwarded_address() {
    let server = TestServer::start(&[]).await;

    assert_eq!(
        server.get_from("not-an-ip").await,
        (500, "Internal Server Error\n".to_string())
    );

    server.stop().await;
}

// ===========================================
// Reset
// ===========================================

#[tokio::test]
async fn test_reset_unblocks_network() {
    let server = TestServer::start(&[("NUMBER_OF_REQUESTS", "1")]).await;

    assert_eq!(server.get_from("192.168.1.15").await.0, 200);
    assert_eq!(server.get_from("192.168.1.15").await.0, 429);

    assert_eq!(server.get("/reset?ip=192.168.1.1").await, (200, "OK!\n".to_string()));
    assert_eq!(server.get_from("192.168.1.15").await.0, 200);

    server.stop().await;
}

#[tokio::test]
async fn test_reset_errors() {
    let server = TestServer::start(&[]).await;

    assert_eq!(server.get("/reset").await, (400, "Bad Request\n".to_string()));
    assert_eq!(
        server.get("/reset?ip=999.1.1.1").await,
        (500, "Internal Server Error\n".to_string())
    );

    server.stop().await;
}

// ===========================================
// Concurrency and shutdown
// ===========================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_respect_threshold() {
    let server = Arc::new(TestServer::start(&[("NUMBER_OF_REQUESTS", "10")]).await);

    let tasks: Vec<_> = (0..40)
        .map(|i| {
            let server = server.clone();
            tokio::spawn(async move {
                let xff = format!("10.20.30.{}", i % 250);
                server.get_from(&xff).await.0
            })
        })
        .collect();

    let mut allowed = 0;
    for task in tasks {
        match task.await.unwrap() {
            200 => allowed += 1,
            429 => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(allowed, 10);
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = TestServer::start(&[]).await;
    let addr = server.addr;
    let tracker = server.tracker.clone();

    assert_eq!(server.get("/").await.0, 200);
    server.stop().await;

    assert!(tracker.wait_for_shutdown(Duration::from_secs(5)).await);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_closes_idle_keep_alive_connection() {
    let server = TestServer::start(&[]).await;
    let tracker = server.tracker.clone();

    // No `Connection: close`: the server keeps the connection open.
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let mut response = Vec::new();
    let mut buf = [0u8; 1024];
    while !response.ends_with(b"OK!\n") {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before the response completed");
        response.extend_from_slice(&buf[..n]);
    }
    assert_eq!(tracker.count(), 1);

    server.stop().await;

    assert!(tracker.wait_for_shutdown(Duration::from_secs(3)).await);
    assert_eq!(tracker.count(), 0);
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
}
