//! # Estadísticas del Servidor
//! src/metrics/collector.rs
//!
//! Contadores compartidos entre el accept loop, los threads de cada conexión
//! y el handler de `/status`. Todo es atómico: no se toma ningún lock en el
//! camino de un request.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Estadísticas thread-safe del servidor
#[derive(Debug)]
pub struct ServerStats {
    start_time: Instant,

    /// Conexiones aceptadas desde el arranque
    total_connections: AtomicU64,

    /// Ciclos de conexión en curso
    active_connections: AtomicUsize,

    /// Respuestas escritas por clase
    responses_2xx: AtomicU64,
    responses_4xx: AtomicU64,
    responses_5xx: AtomicU64,

    /// Requests que no pasaron el parser
    parse_errors: AtomicU64,

    /// Handlers que devolvieron `Err` o hicieron panic
    handler_failures: AtomicU64,
}

/// Snapshot serializable (lo devuelve `/status`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_s: f64,
    pub total_connections: u64,
    pub active_connections: usize,
    pub responses_2xx: u64,
    pub responses_4xx: u64,
    pub responses_5xx: u64,
    pub parse_errors: u64,
    pub handler_failures: u64,
}

/// Marca una conexión como activa mientras vive.
///
/// Se crea en el accept loop y se mueve al thread de la conexión; al
/// soltarse (en cualquier camino de salida) decrementa el contador.
#[derive(Debug)]
pub struct ConnectionGuard {
    stats: Arc<ServerStats>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.stats.active_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ServerStats {
    /// Crea estadísticas en cero
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_connections: AtomicU64::new(0),
            active_connections: AtomicUsize::new(0),
            responses_2xx: AtomicU64::new(0),
            responses_4xx: AtomicU64::new(0),
            responses_5xx: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            handler_failures: AtomicU64::new(0),
        }
    }

    /// Registra una conexión aceptada
    pub fn connection_opened(self: &Arc<Self>) -> ConnectionGuard {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            stats: Arc::clone(self),
        }
    }

    /// Registra la respuesta escrita según su código
    pub fn record_response(&self, status_code: u16) {
        let counter = match status_code {
            200..=299 => &self.responses_2xx,
            400..=499 => &self.responses_4xx,
            500..=599 => &self.responses_5xx,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Tiempo desde que se crearon las estadísticas
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Obtiene un snapshot de las estadísticas
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_s: self.uptime().as_secs_f64(),
            total_connections: self.total_connections(),
            active_connections: self.active_connections(),
            responses_2xx: self.responses_2xx.load(Ordering::Relaxed),
            responses_4xx: self.responses_4xx.load(Ordering::Relaxed),
            responses_5xx: self.responses_5xx.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }

    /// Espera a que no queden conexiones activas.
    ///
    /// Retorna `false` si venció `timeout` con conexiones todavía en curso.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.active_connections() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
