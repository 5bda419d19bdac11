//! # Construcción y Serialización de Respuestas HTTP
//!
//! Este módulo proporciona una API para construir respuestas HTTP/1.0
//! y convertirlas a bytes para enviar al cliente.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Length: 2\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! 55
//! ```
//!
//! Los headers salen ordenados por clave y `Content-Length` siempre se
//! recalcula a partir del body al serializar.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use rawhttp::http::Response;
//!
//! let response = Response::ok().text("55");
//! let bytes = response.to_bytes();
//!
//! assert_eq!(
//!     bytes,
//!     b"HTTP/1.0 200 OK\r\nContent-Length: 2\r\nContent-Type: text/plain\r\n\r\n55"
//! );
//! ```

use super::request::CONTENT_LENGTH;
use super::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Body fijo que reemplaza a un JSON que no se pudo serializar
pub const JSON_ERROR_BODY: &str = "json marshal error";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Código de estado (200, 404, etc.)
    status_code: u16,

    /// Texto del estado ("OK", "Not Found", etc.)
    status_text: String,

    /// Headers HTTP, ordenados por clave para una salida reproducible
    headers: BTreeMap<String, String>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta con código y texto arbitrarios, sin headers ni body
    pub fn new(status_code: u16, status_text: &str) -> Self {
        Self {
            status_code,
            status_text: single_line(status_text),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Crea una respuesta a partir de un `StatusCode` conocido
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status.as_u16(), status.reason_phrase())
    }

    /// 200 OK vacío
    pub fn ok() -> Self {
        Self::with_status(StatusCode::Ok)
    }

    /// 404 Not Found vacío
    pub fn not_found() -> Self {
        Self::with_status(StatusCode::NotFound)
    }

    /// 400 Bad Request vacío
    pub fn bad_request() -> Self {
        Self::with_status(StatusCode::BadRequest)
    }

    /// 500 Internal Server Error vacío
    pub fn internal_error() -> Self {
        Self::with_status(StatusCode::InternalServerError)
    }

    /// Cambia el código de estado
    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = code;
        self
    }

    /// Cambia el texto del estado (sin `\r` ni `\n`)
    pub fn with_status_text(mut self, text: &str) -> Self {
        self.status_text = single_line(text);
        self
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe, se sobrescribe.
    ///
    /// # Ejemplo
    /// ```
    /// use rawhttp::http::Response;
    ///
    /// let response = Response::ok().with_header("X-Custom", "value");
    /// assert_eq!(response.header("X-Custom"), Some("value"));
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable).
    ///
    /// Los `\r` y `\n` del nombre y del valor se descartan, para que nada
    /// agregue líneas a la cabecera.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(single_line(name), single_line(value));
    }

    /// Reemplaza el body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Fija `Content-Type`
    pub fn with_content_type(self, content_type: &str) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Body de texto plano con `Content-Type: text/plain`
    pub fn text(self, text: &str) -> Self {
        self.with_content_type("text/plain").with_body(text)
    }

    /// Serializa `value` como JSON con `Content-Type: application/json`.
    ///
    /// Si la serialización falla, la respuesta original se descarta y se
    /// devuelve un 500 nuevo con un body de texto fijo. Nunca propaga el error.
    ///
    /// # Ejemplo
    /// ```
    /// use rawhttp::http::Response;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Resultado { numbers: Vec<i32> }
    ///
    /// let response = Response::ok().json(&Resultado { numbers: vec![1, 2] });
    /// assert_eq!(response.body(), br#"{"numbers":[1,2]}"#);
    /// ```
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(data) => self.with_content_type("application/json").with_body(data),
            Err(e) => {
                tracing::error!(error = %e, "JSON serialization failed");
                Response::internal_error().text(JSON_ERROR_BODY)
            }
        }
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - Headers ordenados: `Header-Name: Value\r\n`, con `Content-Length`
    ///   recalculado (cualquier valor previo se ignora)
    /// - Línea vacía: `\r\n`
    /// - Body tal cual
    pub fn to_bytes(&self) -> Vec<u8> {
        let content_length = self.body.len().to_string();

        let mut headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_LENGTH))
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        headers.insert(CONTENT_LENGTH, &content_length);

        let mut result = Vec::with_capacity(64 + self.body.len());

        // 1. Status line
        result.extend_from_slice(
            format!("HTTP/1.0 {} {}\r\n", self.status_code, self.status_text).as_bytes(),
        );

        // 2. Headers
        for (name, value) in headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body (si existe)
        result.extend_from_slice(&self.body);

        result
    }

    /// Escribe la respuesta serializada y hace flush
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    /// Obtiene el código de estado
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Obtiene el texto del estado
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

fn single_line(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}
