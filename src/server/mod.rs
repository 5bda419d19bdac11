//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Ordena las rutas y escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea requests HTTP con plazos de lectura
//! 4. Genera y envía responses HTTP
//! 5. Se detiene de forma ordenada a través de un `ShutdownHandle`

pub mod lifecycle;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use lifecycle::{ServerState, ShutdownHandle};
pub use tcp::{Server, INTERNAL_ERROR_BODY, METHOD_NOT_ALLOWED_BODY, NOT_FOUND_BODY};
