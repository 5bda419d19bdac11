//! # Errores del servidor
//! src/error.rs
//!
//! Los errores de parsing viven en `http::request::ParseError`; aquí están
//! los que cruzan el contrato de handlers y los fatales del servidor.

use crate::server::ServerState;
use std::io;
use thiserror::Error;

/// Falla interna señalada por un handler.
///
/// Siempre termina en un 500 genérico; el detalle solo va al log.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Error de E/S dentro del handler
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Cualquier otra falla
    #[error("{0}")]
    Internal(String),

    /// El handler hizo panic; se atrapa en el router
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Errores fatales del servidor, reportados a quien lo arrancó
#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo abrir el socket de escucha
    #[error("can't bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// `accept` falló por algo distinto a un cierre pedido
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// Configuración inválida
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Operación no permitida en el estado actual
    #[error("operation not allowed in state {0:?}")]
    InvalidState(ServerState),
}
