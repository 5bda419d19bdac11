//! # Comandos del Servidor
//! src/commands/mod.rs
//!
//! Este módulo contiene los handlers que el binario registra en el router.
//!
//! ## Categorías de comandos
//!
//! - **basic**: fibonacci, reverse, toupper, hash, random, timestamp, status, help
//! - **files**: createfile, deletefile (dentro del directorio de datos)
//! - **load**: simulate, sleep, loadtest
//!
//! Un parámetro faltante o inválido es una respuesta 400 en texto plano,
//! nunca un `HandlerError`. Un parámetro vacío (`?num=`) cuenta como faltante.

pub mod basic;
pub mod files;
pub mod load;

use crate::error::HandlerError;
use crate::http::{Request, Response};
use crate::metrics::ServerStats;
use crate::router::Router;
use std::path::PathBuf;
use std::sync::Arc;

/// Líneas que devuelve `/help`, una por ruta registrada
pub const COMMANDS: &[&str] = &[
    "GET  /fibonacci?num=",
    "POST /createfile?name=&content=&repeat=",
    "DELETE /deletefile?name=",
    "GET  /reverse?text=",
    "GET  /toupper?text=",
    "GET  /hash?text=",
    "GET  /random?count=&min=&max=",
    "GET  /timestamp",
    "GET  /simulate?seconds=&task=",
    "GET  /sleep?seconds=",
    "GET  /loadtest?tasks=&sleep=",
    "GET  /status",
    "GET  /help",
];

/// Registra todos los comandos en el router.
///
/// `data_dir` es la raíz de los comandos de archivos; `stats` es lo que
/// lee `/status`.
pub fn register(router: &mut Router, data_dir: impl Into<PathBuf>, stats: Arc<ServerStats>) {
    let data_dir = data_dir.into();

    // Comandos básicos
    router.get("/fibonacci", basic::fibonacci_handler);
    router.get("/reverse", basic::reverse_handler);
    router.get("/toupper", basic::toupper_handler);
    router.get("/hash", basic::hash_handler);
    router.get("/random", basic::random_handler);
    router.get("/timestamp", basic::timestamp_handler);
    router.get("/status", basic::status_handler(stats));
    router.get("/help", basic::help_handler);

    // Archivos
    router.post("/createfile", files::createfile_handler(data_dir.clone()));
    router.delete("/deletefile", files::deletefile_handler(data_dir));

    // Carga
    router.get("/simulate", load::simulate_handler);
    router.get("/sleep", load::sleep_handler);
    router.get("/loadtest", load::loadtest_handler);
}

/// Aplana el resultado de un comando: el `Err` ya es la respuesta 400
pub(crate) fn reply(result: Result<Response, Response>) -> Result<Response, HandlerError> {
    Ok(result.unwrap_or_else(|bad_request| bad_request))
}

/// Parámetro obligatorio y no vacío
pub(crate) fn required_param<'a>(req: &'a Request, name: &str) -> Result<&'a str, Response> {
    req.query_param(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Response::bad_request().text(&format!("{} is required", name)))
}

/// Parámetro obligatorio entero
pub(crate) fn number_param(req: &Request, name: &str) -> Result<i64, Response> {
    required_param(req, name)?
        .parse()
        .map_err(|_| Response::bad_request().text(&format!("{} must be a number", name)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::http::{Request, Response};

    pub fn get(target: &str) -> Request {
        request("GET", target)
    }

    pub fn request(method: &str, target: &str) -> Request {
        let raw = format!("{} {} HTTP/1.0\r\nContent-Length: 0\r\n\r\n", method, target);
        Request::parse(raw.as_bytes()).unwrap()
    }

    pub fn body(response: &Response) -> String {
        String::from_utf8(response.body().to_vec()).unwrap()
    }
}
