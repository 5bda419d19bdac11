//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.0 desde cero, leyendo directamente
//! del stream del socket.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /createfile?name=a.txt&content=hola&repeat=2 HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 5\r\n
//! \r\n
//! datos
//! ```
//!
//! ## Fases
//!
//! 1. **Header block**: se leen líneas hasta la línea vacía (o fin de stream).
//!    Se acepta `\r\n` y también `\n` solo como terminador.
//! 2. **Request Line**: `METHOD target VERSION`
//! 3. **Headers**: Pares `Name: Value`. Las líneas sin `:` se ignoran.
//! 4. **Body**: exactamente `Content-Length` bytes, leídos del resto del
//!    stream. Un POST sin `Content-Length` es un error.

use super::method::{Method, UnknownMethod};
use super::target::Target;
use std::collections::HashMap;
use std::io::{self, BufRead, Read};
use thiserror::Error;

/// Nombre del header que gobierna el body
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Opciones del parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Si es `true`, la versión debe ser exactamente `HTTP/1.0` o `HTTP/1.1`
    pub strict_version: bool,

    /// Máximo de bytes crudos del header block (request line incluida)
    pub max_header_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict_version: true,
            max_header_bytes: 8192,
        }
    }
}

/// Errores que pueden ocurrir durante el parsing.
///
/// Los mensajes (`Display`) son los que recibe el cliente en el body del 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// El stream terminó sin ninguna línea
    #[error("empty request")]
    EmptyRequest,

    /// La request line tiene menos de 2 tokens
    #[error("no method or target")]
    MalformedStartLine,

    /// Método fuera de los 9 verbos
    #[error("bad method: {0}")]
    UnknownMethod(String),

    /// El target no es un path (+ query) válido
    #[error("bad target format: {0}")]
    MalformedTarget(String),

    /// Versión distinta de HTTP/1.0 o HTTP/1.1
    #[error("bad version: {0}")]
    UnsupportedVersion(String),

    /// `Content-Length` no numérico
    #[error("bad content length format: {0}")]
    BadContentLength(String),

    /// El stream terminó antes de `Content-Length` bytes
    #[error("can't read body: {0}")]
    TruncatedBody(String),

    /// POST sin `Content-Length`
    #[error("post request without content length")]
    MissingContentLength,

    /// El header block superó `max_header_bytes`
    #[error("request headers too large")]
    HeadersTooLarge,

    /// Venció el read deadline del socket
    #[error("read timed out")]
    TimedOut,

    /// Cualquier otro error de lectura del header block
    #[error("can't read request: {0}")]
    Io(String),
}

impl ParseError {
    /// Clasifica un error de lectura del header block
    fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ParseError::TimedOut,
            _ => ParseError::Io(err.to_string()),
        }
    }
}

impl From<UnknownMethod> for ParseError {
    fn from(err: UnknownMethod) -> Self {
        ParseError::UnknownMethod(err.0)
    }
}

/// Representa un request HTTP/1.0 parseado.
///
/// Se construye una vez por conexión y no cambia después.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Path + query parseados
    target: Target,

    /// Versión tal como llegó (vacía si no vino y el parser es permisivo)
    version: String,

    /// Headers HTTP, claves sensibles a mayúsculas, el último duplicado gana
    headers: HashMap<String, String>,

    /// Body del request (vacío si no hay `Content-Length`)
    body: Vec<u8>,
}

impl Request {
    /// Construye un request a mano (útil para probar handlers y el router)
    pub fn new(
        method: Method,
        target: Target,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            method,
            target,
            version: "HTTP/1.0".to_string(),
            headers,
            body,
        }
    }

    /// Parsea un request HTTP/1.0 completo desde bytes en memoria,
    /// con las opciones por defecto.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use rawhttp::http::Request;
    ///
    /// let raw = b"GET /fibonacci?num=10 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/fibonacci");
    /// assert_eq!(request.query_param("num"), Some("10"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let mut reader = buffer;
        Self::read_from(&mut reader, &ParserConfig::default())
    }

    /// Lee y parsea un request desde un stream.
    ///
    /// Solo consume lo necesario: el header block y, si corresponde,
    /// exactamente `Content-Length` bytes de body.
    pub fn read_from<R: BufRead>(
        reader: &mut R,
        config: &ParserConfig,
    ) -> Result<Self, ParseError> {
        let lines = Self::read_header_lines(reader, config.max_header_bytes)?;

        if lines.is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // Header block normalizado: líneas unidas por CRLF + línea vacía final
        let head = format!("{}\r\n\r\n", lines.join("\r\n"));

        let mut request = Self::parse_head(&head, config)?;
        request.body = Self::read_body(reader, request.method, &request.headers)?;

        Ok(request)
    }

    /// Lee líneas hasta la línea vacía o el fin del stream.
    ///
    /// Un fragmento final sin terminador se descarta.
    fn read_header_lines<R: BufRead>(
        reader: &mut R,
        max_bytes: usize,
    ) -> Result<Vec<String>, ParseError> {
        let mut lines = Vec::new();
        let mut total = 0usize;

        loop {
            let mut buf = Vec::new();
            // +1 para distinguir "justo en el límite" de "lo superó"
            let limit = (max_bytes - total.min(max_bytes)) as u64 + 1;
            let n = (&mut *reader)
                .take(limit)
                .read_until(b'\n', &mut buf)
                .map_err(ParseError::from_read)?;

            if n == 0 {
                break;
            }

            total += n;
            if total > max_bytes {
                return Err(ParseError::HeadersTooLarge);
            }

            if !buf.ends_with(b"\n") {
                break;
            }

            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }

            if buf.is_empty() {
                break;
            }

            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        Ok(lines)
    }

    /// Parsea un header block normalizado (sin body).
    ///
    /// Formato: `METHOD target VERSION\r\nName: Value\r\n...\r\n\r\n`
    pub fn parse_head(head: &str, config: &ParserConfig) -> Result<Self, ParseError> {
        let block = head.split("\r\n\r\n").next().unwrap_or(head);
        let mut lines = block.split("\r\n");

        let start_line = lines.next().unwrap_or_default();
        let (method, target, version) = Self::parse_request_line(start_line, config)?;
        let headers = Self::parse_headers(lines);

        Ok(Request {
            method,
            target,
            version,
            headers,
            body: Vec::new(),
        })
    }

    /// Parsea la request line (primera línea del request)
    ///
    /// Como mucho 3 tokens: todo lo que sigue al target es la versión.
    fn parse_request_line(
        line: &str,
        config: &ParserConfig,
    ) -> Result<(Method, Target, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() < 2 {
            return Err(ParseError::MalformedStartLine);
        }

        let method: Method = parts[0].parse()?;

        let target = Target::parse(parts[1]).map_err(ParseError::MalformedTarget)?;

        let version = parts[2..].join(" ");
        if config.strict_version && version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::UnsupportedVersion(version));
        }

        Ok((method, target, version))
    }

    /// Parsea los headers HTTP.
    ///
    /// Las líneas sin `:` o con clave vacía se descartan en silencio.
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
        let mut headers = HashMap::new();

        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };

            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            headers.insert(name.to_string(), value.trim().to_string());
        }

        headers
    }

    /// Lee el body del resto del stream según `Content-Length`
    fn read_body<R: BufRead>(
        reader: &mut R,
        method: Method,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>, ParseError> {
        let declared = headers.get(CONTENT_LENGTH);

        if method == Method::POST && declared.is_none() {
            return Err(ParseError::MissingContentLength);
        }

        let Some(declared) = declared else {
            return Ok(Vec::new());
        };

        let length: u64 = declared
            .parse()
            .map_err(|e| ParseError::BadContentLength(format!("{:?}: {}", declared, e)))?;

        if length == 0 {
            return Ok(Vec::new());
        }

        // Sin reservar `length` de golpe: el peer podría mentir
        let mut body = Vec::new();
        (&mut *reader)
            .take(length)
            .read_to_end(&mut body)
            .map_err(|e| match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ParseError::TimedOut,
                _ => ParseError::TruncatedBody(e.to_string()),
            })?;

        if (body.len() as u64) < length {
            return Err(ParseError::TruncatedBody(format!(
                "unexpected EOF after {} of {} bytes",
                body.len(),
                length
            )));
        }

        Ok(body)
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el target completo
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Obtiene el path (decodificado) del request
    pub fn path(&self) -> &str {
        self.target.path()
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &[(String, String)] {
        self.target.query_params()
    }

    /// Obtiene un query parameter específico
    ///
    /// # Ejemplo
    /// ```
    /// use rawhttp::http::Request;
    ///
    /// let raw = b"GET /test?num=42 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.query_param("num"), Some("42"));
    /// assert_eq!(request.query_param("missing"), None);
    /// ```
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.target.query_param(name)
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico (la clave es sensible a mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Obtiene el body del request como String
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }
}
