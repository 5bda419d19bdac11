//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Este módulo implementa el protocolo HTTP/1.0 desde cero, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Parsing de requests HTTP/1.0 directamente desde el stream
//! - Construcción y serialización de responses HTTP
//! - Parsing del target (path + query parameters)
//!
//! ## Especificación HTTP/1.0
//!
//! El protocolo HTTP/1.0 (RFC 1945) es más simple que HTTP/1.1:
//! - No requiere el header `Host`
//! - No tiene chunked transfer encoding
//! - No mantiene conexiones persistentes: un request, una respuesta
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Length: 2\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! 55
//! ```

pub mod method;    // Los 9 verbos
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP
pub mod target;    // Path + query

// Re-exportamos los tipos principales para facilitar su uso
pub use method::Method;
pub use request::{ParseError, ParserConfig, Request};
pub use response::Response;
pub use status::StatusCode;
pub use target::Target;
