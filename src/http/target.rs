//! # Request Target
//! src/http/target.rs
//!
//! Parsing estructural del segundo token de la request line:
//!
//! ```text
//! /fibonacci?num=10&fast=true#ignorado
//! └───┬────┘ └───────┬──────┘
//!    path          query
//! ```
//!
//! El path se guarda decodificado (`%20` → espacio) y la query se parte en
//! pares `clave=valor` conservando el orden de aparición. También se acepta
//! la forma absoluta (`http://host/path?q`) y el asterisco de `OPTIONS *`.

use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

/// Target de un request ya parseado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Texto tal como llegó en la request line
    raw: String,

    /// Path decodificado (ej: "/fibonacci")
    path: String,

    /// Query parameters en orden de aparición (ej: [("num", "10")])
    query: Vec<(String, String)>,
}

impl Target {
    /// Parsea un request target.
    ///
    /// El error es el detalle que acompaña a `bad target format: ...`.
    ///
    /// # Ejemplo
    /// ```
    /// use rawhttp::http::Target;
    ///
    /// let target = Target::parse("/reverse?text=hola%20mundo").unwrap();
    /// assert_eq!(target.path(), "/reverse");
    /// assert_eq!(target.query_param("text"), Some("hola mundo"));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("empty target".to_string());
        }

        if raw.chars().any(|c| c.is_ascii_control()) {
            return Err(format!("{:?}: invalid control character in target", raw));
        }

        if raw == "*" {
            return Ok(Self {
                raw: raw.to_string(),
                path: raw.to_string(),
                query: Vec::new(),
            });
        }

        // Forma absoluta: http://host:port/path?query
        if !raw.starts_with('/') && raw.contains("://") {
            let url = Url::parse(raw).map_err(|e| format!("{:?}: {}", raw, e))?;
            let path = decode_path(url.path())?;
            let query = url.query().map(parse_query).unwrap_or_default();
            return Ok(Self {
                raw: raw.to_string(),
                path,
                query,
            });
        }

        if !raw.starts_with('/') {
            return Err(format!("{:?}: target must start with '/'", raw));
        }

        // El fragmento nunca debería viajar, pero si viene se descarta
        let without_fragment = raw.split('#').next().unwrap_or(raw);

        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (without_fragment, Vec::new()),
        };

        Ok(Self {
            raw: raw.to_string(),
            path: decode_path(path)?,
            query,
        })
    }

    /// Obtiene el target original
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Obtiene el path decodificado
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// Obtiene un query parameter específico.
    ///
    /// Si la clave se repite, gana la primera aparición.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Valida los escapes `%XX` y decodifica el path
fn decode_path(path: &str) -> Result<String, String> {
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([h, l]) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => i += 3,
                _ => {
                    let end = (i + 3).min(bytes.len());
                    let bad = String::from_utf8_lossy(&bytes[i..end]);
                    return Err(format!("invalid URL escape {:?}", bad));
                }
            }
        } else {
            i += 1;
        }
    }

    percent_decode_str(path)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| format!("{:?}: path is not valid UTF-8", path))
}

/// `num=10&text=hola+mundo` → [("num", "10"), ("text", "hola mundo")]
fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}
