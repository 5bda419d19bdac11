//! # Comandos Básicos
//! src/commands/basic.rs
//!
//! Implementación de los comandos básicos del servidor:
//! - /fibonacci: Cálculo de Fibonacci
//! - /reverse: Invertir texto
//! - /toupper: Convertir a mayúsculas
//! - /hash: Hash SHA256 de texto
//! - /random: Generar números aleatorios
//! - /timestamp: Timestamp actual
//! - /status: Estado del servidor
//! - /help: Ayuda sobre comandos disponibles

use super::{number_param, reply, required_param, COMMANDS};
use crate::error::HandlerError;
use crate::http::{Request, Response};
use crate::metrics::ServerStats;
use crate::router::Handler;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Mayor N cuyo Fibonacci cabe en un `i64`
pub const MAX_FIBONACCI: i64 = 92;

/// Máximo de números por request en /random
pub const MAX_RANDOM_COUNT: i64 = 1000;

/// Handler para /fibonacci?num=N
///
/// Responde F(N) en texto plano, con N entre 0 y 92.
pub fn fibonacci_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(fibonacci_response(req))
}

fn fibonacci_response(req: &Request) -> Result<Response, Response> {
    let num = number_param(req, "num")?;
    if !(0..=MAX_FIBONACCI).contains(&num) {
        return Err(Response::bad_request().text("num must be between 0 and 92"));
    }
    Ok(Response::ok().text(&fibonacci(num as u32).to_string()))
}

/// Calcula el N-ésimo número de Fibonacci
///
/// Usa algoritmo iterativo; no hace falta cache para N <= 92.
pub fn fibonacci(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}

/// Handler para /reverse?text=TEXT
pub fn reverse_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(required_param(req, "text").map(|text| {
        let reversed: String = text.chars().rev().collect();
        Response::ok().text(&reversed)
    }))
}

/// Handler para /toupper?text=TEXT
pub fn toupper_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(required_param(req, "text").map(|text| Response::ok().text(&text.to_uppercase())))
}

/// Handler para /hash?text=TEXT
///
/// SHA256 del texto, en hex minúscula.
pub fn hash_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(required_param(req, "text").map(|text| {
        let digest = Sha256::digest(text.as_bytes());
        Response::ok().text(&format!("{:x}", digest))
    }))
}

#[derive(Debug, Serialize)]
struct RandomBody {
    numbers: Vec<i64>,
}

/// Handler para /random?count=N&min=A&max=B
///
/// Genera `count` enteros en `[min, max]`.
pub fn random_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(random_response(req))
}

fn random_response(req: &Request) -> Result<Response, Response> {
    let count = req
        .query_param("count")
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|count| *count >= 1)
        .ok_or_else(|| Response::bad_request().text("count must be a positive integer"))?;
    if count > MAX_RANDOM_COUNT {
        return Err(Response::bad_request().text("count must be <= 1000"));
    }

    let min = number_param(req, "min")
        .map_err(|_| Response::bad_request().text("min must be a number"))?;
    let max = number_param(req, "max")
        .map_err(|_| Response::bad_request().text("max must be a number"))?;
    if max < min {
        return Err(Response::bad_request().text("max must be >= min"));
    }

    let mut rng = rand::thread_rng();
    let numbers = (0..count).map(|_| rng.gen_range(min..=max)).collect();
    Ok(Response::ok().json(&RandomBody { numbers }))
}

#[derive(Debug, Serialize)]
struct TimestampBody {
    timestamp: String,
}

/// Handler para /timestamp
///
/// # Ejemplo de response
/// ```json
/// {"timestamp": "2024-01-01T00:00:00Z"}
/// ```
pub fn timestamp_handler(_req: &Request) -> Result<Response, HandlerError> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    Ok(Response::ok().json(&TimestampBody { timestamp }))
}

#[derive(Debug, Serialize)]
struct StatusBody {
    uptime_s: f64,
    total_connections: u64,
    active_connections: usize,
    pid: u32,
}

/// Handler para /status
///
/// Lee las estadísticas compartidas con el servidor.
pub fn status_handler(stats: Arc<ServerStats>) -> impl Handler {
    move |_req: &Request| -> Result<Response, HandlerError> {
        let body = StatusBody {
            uptime_s: stats.uptime().as_secs_f64(),
            total_connections: stats.total_connections(),
            active_connections: stats.active_connections(),
            pid: std::process::id(),
        };
        Ok(Response::ok().json(&body))
    }
}

#[derive(Debug, Serialize)]
struct HelpBody {
    commands: &'static [&'static str],
}

/// Handler para /help
pub fn help_handler(_req: &Request) -> Result<Response, HandlerError> {
    Ok(Response::ok().json(&HelpBody { commands: COMMANDS }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{body, get};

    fn call(handler: fn(&Request) -> Result<Response, HandlerError>, target: &str) -> Response {
        handler(&get(target)).unwrap()
    }

    // ==================== FIBONACCI ====================

    #[test]
    fn test_fibonacci_calculation() {
        assert_eq!(fibonacci(0), 0);
        assert_eq!(fibonacci(1), 1);
        assert_eq!(fibonacci(2), 1);
        assert_eq!(fibonacci(10), 55);
        assert_eq!(fibonacci(20), 6765);
        assert_eq!(fibonacci(92), 7_540_113_804_746_346_429);
    }

    #[test]
    fn test_fibonacci_handler_success() {
        let response = call(fibonacci_handler, "/fibonacci?num=10");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(body(&response), "55");
    }

    #[test]
    fn test_fibonacci_handler_errors() {
        let cases = [
            ("/fibonacci", "num is required"),
            ("/fibonacci?num=", "num is required"),
            ("/fibonacci?num=abc", "num must be a number"),
            ("/fibonacci?num=-1", "num must be between 0 and 92"),
            ("/fibonacci?num=93", "num must be between 0 and 92"),
        ];

        for (target, message) in cases {
            let response = call(fibonacci_handler, target);
            assert_eq!(response.status_code(), 400, "{}", target);
            assert_eq!(body(&response), message, "{}", target);
        }
    }

    // ==================== TEXTO ====================

    #[test]
    fn test_reverse() {
        assert_eq!(body(&call(reverse_handler, "/reverse?text=hola")), "aloh");
        assert_eq!(body(&call(reverse_handler, "/reverse?text=%C3%B1and%C3%BA")), "údnañ");
        assert_eq!(call(reverse_handler, "/reverse").status_code(), 400);
    }

    #[test]
    fn test_toupper() {
        assert_eq!(body(&call(toupper_handler, "/toupper?text=GoLang")), "GOLANG");
        assert_eq!(body(&call(toupper_handler, "/toupper")), "text is required");
    }

    #[test]
    fn test_hash() {
        let response = call(hash_handler, "/hash?text=abc");
        assert_eq!(
            body(&response),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    // ==================== RANDOM ====================

    #[test]
    fn test_random_in_range() {
        let response = call(random_handler, "/random?count=50&min=-3&max=3");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        let numbers = json["numbers"].as_array().unwrap();
        assert_eq!(numbers.len(), 50);
        assert!(numbers.iter().all(|n| (-3..=3).contains(&n.as_i64().unwrap())));
    }

    #[test]
    fn test_random_single_value_range() {
        let response = call(random_handler, "/random?count=3&min=7&max=7");
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(json["numbers"], serde_json::json!([7, 7, 7]));
    }

    #[test]
    fn test_random_errors() {
        let cases = [
            ("/random?min=1&max=2", "count must be a positive integer"),
            ("/random?count=0&min=1&max=2", "count must be a positive integer"),
            ("/random?count=1001&min=1&max=2", "count must be <= 1000"),
            ("/random?count=1&max=2", "min must be a number"),
            ("/random?count=1&min=1&max=x", "max must be a number"),
            ("/random?count=1&min=5&max=2", "max must be >= min"),
        ];

        for (target, message) in cases {
            let response = call(random_handler, target);
            assert_eq!(response.status_code(), 400, "{}", target);
            assert_eq!(body(&response), message, "{}", target);
        }
    }

    // ==================== OTROS ====================

    #[test]
    fn test_timestamp_is_rfc3339() {
        let response = call(timestamp_handler, "/timestamp");
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn test_status_reads_shared_stats() {
        let stats = Arc::new(ServerStats::new());
        let _open = stats.connection_opened();
        let handler = status_handler(Arc::clone(&stats));

        let response = handler.handle(&get("/status")).unwrap();
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(json["total_connections"], 1);
        assert_eq!(json["active_connections"], 1);
        assert_eq!(json["pid"], std::process::id());
        assert!(json["uptime_s"].as_f64().is_some());
    }

    #[test]
    fn test_help() {
        let response = call(help_handler, "/help");
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        let commands = json["commands"].as_array().unwrap();
        assert_eq!(commands.len(), COMMANDS.len());
        assert!(commands.iter().any(|c| c == "GET  /fibonacci?num="));
    }
}
