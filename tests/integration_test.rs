//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta un servidor real en un puerto efímero, le habla por
//! `TcpStream` crudo y lo detiene con su `ShutdownHandle`.

use rawhttp::commands;
use rawhttp::config::Config;
use rawhttp::error::{HandlerError, ServerError};
use rawhttp::http::{Request, Response};
use rawhttp::metrics::ServerStats;
use rawhttp::router::Router;
use rawhttp::server::{Server, ServerState, ShutdownHandle};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Servidor corriendo en un thread aparte
struct TestServer {
    addr: SocketAddr,
    handle: ShutdownHandle,
    stats: Arc<ServerStats>,
    join: Option<thread::JoinHandle<Result<(), ServerError>>>,
    data_dir: TempDir,
}

impl TestServer {
    /// Servidor con todos los comandos, más `/fail` y `/panic`
    fn start() -> Self {
        let data_dir = TempDir::new().unwrap();
        let stats = Arc::new(ServerStats::new());

        let mut router = Router::new();
        commands::register(&mut router, data_dir.path(), Arc::clone(&stats));
        router.get("/fail", |_req: &Request| -> Result<Response, HandlerError> {
            Err(HandlerError::Internal("disk on fire".to_string()))
        });
        router.get("/panic", |_req: &Request| -> Result<Response, HandlerError> {
            panic!("handler exploded")
        });

        let config = Config {
            port: 0,
            data_dir: data_dir.path().to_path_buf(),
            read_timeout_ms: 2_000,
            write_timeout_ms: 2_000,
            ..Config::default()
        };

        let mut server = Server::with_stats(config, router, Arc::clone(&stats));
        let addr = server.bind().unwrap();
        let handle = server.shutdown_handle();
        let join = thread::spawn(move || server.serve());

        Self {
            addr,
            handle,
            stats,
            join: Some(join),
            data_dir,
        }
    }

    fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Envía bytes crudos y lee la respuesta completa
    fn send(&self, raw: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        stream.flush().unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn get(&self, target: &str) -> String {
        self.send(&format!("GET {} HTTP/1.0\r\n\r\n", target))
    }

    fn stop(mut self) -> Result<(), ServerError> {
        self.handle.shutdown();
        self.join.take().unwrap().join().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            self.handle.shutdown();
            let _ = join.join();
        }
    }
}

/// Helper: status code de la status line
fn status_of(response: &str) -> u16 {
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let head = &response[..response.find("\r\n\r\n")?];
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(": "))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

// ==================== Casos de referencia ====================

#[test]
fn test_fibonacci_endpoint() {
    let server = TestServer::start();
    let response = server.get("/fibonacci?num=10");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "got: {}", response);
    assert_eq!(extract_body(&response), "55");
    assert_eq!(header(&response, "Content-Length"), Some("2"));
    assert_eq!(header(&response, "Content-Type"), Some("text/plain"));
}

#[test]
fn test_unknown_path_is_404() {
    let server = TestServer::start();
    let response = server.get("/nope");

    assert_eq!(status_of(&response), 404);
    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
}

#[test]
fn test_wrong_method_is_400() {
    let server = TestServer::start();
    let response = server.send("POST /fibonacci?num=10 HTTP/1.0\r\nContent-Length: 0\r\n\r\n");

    assert_eq!(status_of(&response), 400);
    assert_eq!(extract_body(&response), "method not allowed");
}

#[test]
fn test_post_without_content_length_is_400() {
    let server = TestServer::start();
    let response = server.send("POST /fibonacci?num=10 HTTP/1.0\r\n\r\n");

    assert_eq!(status_of(&response), 400);
    assert_eq!(extract_body(&response), "post request without content length");
}

#[test]
fn test_bad_method_is_400() {
    let server = TestServer::start();
    let response = server.send("BAD / HTTP/1.0\r\n\r\n");

    assert_eq!(status_of(&response), 400);
    assert!(extract_body(&response).contains("bad method: BAD"));
}

// ==================== Errores del parser ====================

#[test]
fn test_parser_errors_reach_the_client() {
    let server = TestServer::start();

    let cases = [
        ("GET /fibonacci HTTP/2.0\r\n\r\n", "bad version: HTTP/2.0"),
        ("GET\r\n\r\n", "no method or target"),
        ("GET /x HTTP/1.0\r\nContent-Length: abc\r\n\r\n", "bad content length format"),
        (
            "POST /createfile HTTP/1.0\r\nContent-Length: 10\r\n\r\nabc",
            "can't read body",
        ),
    ];

    for (raw, expected) in cases {
        // El cliente cierra su lado para que el body corto llegue a EOF
        let mut stream = TcpStream::connect(server.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();

        assert_eq!(status_of(&response), 400, "{:?}", raw);
        assert!(
            extract_body(&response).starts_with(expected),
            "{:?} -> {:?}",
            raw,
            extract_body(&response)
        );
    }
}

#[test]
fn test_empty_connection_does_not_break_server() {
    let server = TestServer::start();

    let stream = TcpStream::connect(server.addr).unwrap();
    drop(stream);

    assert_eq!(extract_body(&server.get("/fibonacci?num=5")), "5");
}

// ==================== Fallas de handlers ====================

#[test]
fn test_handler_failure_is_generic_500() {
    let server = TestServer::start();
    let response = server.get("/fail");

    assert!(response.starts_with("HTTP/1.0 500 Internal Server Error\r\n"));
    assert_eq!(extract_body(&response), "500 Internal Server Error");
    assert!(!response.contains("disk on fire"));
}

#[test]
fn test_handler_panic_is_generic_500() {
    let server = TestServer::start();
    let response = server.get("/panic");

    assert_eq!(status_of(&response), 500);
    assert!(!response.contains("exploded"));

    // El servidor sigue atendiendo
    assert_eq!(status_of(&server.get("/fibonacci?num=1")), 200);
}

// ==================== Comandos ====================

#[test]
fn test_createfile_and_deletefile() {
    let server = TestServer::start();

    let response = server.send(
        "POST /createfile?name=out.txt&content=ab&repeat=3 HTTP/1.0\r\nContent-Length: 0\r\n\r\n",
    );
    assert_eq!(extract_body(&response), "File created successfully");
    let written = std::fs::read_to_string(server.data_path().join("out.txt")).unwrap();
    assert_eq!(written, "ababab");

    let response = server.send("DELETE /deletefile?name=out.txt HTTP/1.0\r\n\r\n");
    assert_eq!(extract_body(&response), "File deleted successfully");
    assert!(!server.data_path().join("out.txt").exists());
}

#[test]
fn test_json_endpoints() {
    let server = TestServer::start();

    let response = server.get("/help");
    assert_eq!(header(&response, "Content-Type"), Some("application/json"));
    let help: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert!(help["commands"].as_array().unwrap().len() >= 13);

    let response = server.get("/status");
    let status: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert!(status["total_connections"].as_u64().unwrap() >= 2);
    assert_eq!(status["pid"], std::process::id());
}

// ==================== Concurrencia y apagado ====================

#[test]
fn test_concurrent_connections() {
    let server = TestServer::start();
    let addr = server.addr;

    let start = Instant::now();
    let clients: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(move || {
                let mut stream = TcpStream::connect(addr).unwrap();
                stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
                stream.write_all(b"GET /sleep?seconds=1 HTTP/1.0\r\n\r\n").unwrap();
                let mut response = String::new();
                stream.read_to_string(&mut response).unwrap();
                response
            })
        })
        .collect();

    for client in clients {
        let response = client.join().unwrap();
        assert_eq!(extract_body(&response), "slept 1 seconds");
    }

    // Cuatro sleeps de 1s atendidos en paralelo
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_shutdown_returns_ok_and_lets_inflight_finish() {
    let server = TestServer::start();
    let addr = server.addr;

    let inflight = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(b"GET /sleep?seconds=1 HTTP/1.0\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    });

    // Esperar a que la conexión esté en curso
    let deadline = Instant::now() + Duration::from_secs(5);
    while server.stats.active_connections() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    let stats = Arc::clone(&server.stats);
    let handle = server.handle.clone();
    assert!(server.stop().is_ok());
    assert_eq!(handle.state(), ServerState::Stopped);

    // La conexión en curso no se cancela
    let response = inflight.join().unwrap();
    assert_eq!(extract_body(&response), "slept 1 seconds");
    assert!(stats.wait_for_idle(Duration::from_secs(5)));

    // El listener ya no acepta
    thread::sleep(Duration::from_millis(50));
    assert!(TcpStream::connect(addr).is_err());
}
