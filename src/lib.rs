//! # rawhttp
//! src/lib.rs
//!
//! Servidor HTTP/1.0 implementado desde cero sobre `std::net`: un thread
//! por conexión, un request y una respuesta por conexión.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing de requests y serialización de responses
//! - `router`: Tabla de rutas ordenada por especificidad
//! - `server`: Accept loop, ciclo de cada conexión y apagado
//! - `commands`: Handlers que registra el binario
//! - `metrics`: Contadores atómicos del servidor
//! - `config`: Configuración por CLI y variables de entorno
//! - `error`: Errores de handlers y errores fatales
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use rawhttp::config::Config;
//! use rawhttp::error::HandlerError;
//! use rawhttp::http::{Request, Response};
//! use rawhttp::router::Router;
//! use rawhttp::server::Server;
//!
//! let mut router = Router::new();
//! router.get("/hello", |_req: &Request| -> Result<Response, HandlerError> {
//!     Ok(Response::ok().text("hola"))
//! });
//!
//! let mut server = Server::new(Config::default(), router);
//! let shutdown = server.shutdown_handle();
//! // `shutdown.shutdown()` desde otro thread detiene el accept loop
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod router;
pub mod server;
