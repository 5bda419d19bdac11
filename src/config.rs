//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor HTTP con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./rawhttp --port 8080 \
//!   --read-timeout-ms 5000 \
//!   --max-header-bytes 16384
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 ./rawhttp
//! ```

use crate::http::ParserConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "rawhttp")]
#[command(about = "Servidor HTTP/1.0 con un thread por conexión")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio raíz de /createfile y /deletefile
    #[arg(long, default_value = "./data", env = "DATA_DIR")]
    pub data_dir: PathBuf,

    // === Timeouts ===

    /// Plazo de lectura por conexión en milisegundos (0 = sin plazo)
    #[arg(long = "read-timeout-ms", default_value = "30000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Plazo de escritura por conexión en milisegundos (0 = sin plazo)
    #[arg(long = "write-timeout-ms", default_value = "30000", env = "WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    // === Parser ===

    /// Máximo de bytes del header block
    #[arg(long = "max-header-bytes", default_value = "8192", env = "MAX_HEADER_BYTES")]
    pub max_header_bytes: usize,

    /// Acepta cualquier versión en la request line
    #[arg(long = "lenient-version", env = "LENIENT_VERSION")]
    pub lenient_version: bool,

    // === Apagado ===

    /// Cuánto esperar a las conexiones en curso tras cerrar el listener
    #[arg(long = "shutdown-grace-ms", default_value = "5000", env = "SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: u64,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use rawhttp::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.max_header_bytes == 0 {
            return Err("max header bytes must be >= 1".to_string());
        }
        Ok(())
    }

    /// Opciones del parser derivadas de la configuración
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            strict_version: !self.lenient_version,
            max_header_bytes: self.max_header_bytes,
        }
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            data_dir = %self.data_dir.display(),
            read_timeout_ms = self.read_timeout_ms,
            write_timeout_ms = self.write_timeout_ms,
            max_header_bytes = self.max_header_bytes,
            strict_version = !self.lenient_version,
            "Configuration loaded"
        );
    }
}

/// `0` significa "sin plazo" (`set_read_timeout` rechaza una duración cero)
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            data_dir: PathBuf::from("./data"),
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            max_header_bytes: 8192,
            lenient_version: false,
            shutdown_grace_ms: 5_000,
        }
    }
}
