//! # Ciclo de vida del servidor
//! src/server/lifecycle.rs
//!
//! ```text
//! Created → Sorted → Listening → Stopped
//! ```
//!
//! El estado vive en un átomo compartido entre el `Server` y todos los
//! `ShutdownHandle`. Un `TcpListener` de std no se puede cerrar desde otro
//! thread mientras está bloqueado en `accept`, así que el apagado marca
//! `Stopped` y se conecta al propio listener para despertarlo.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Estados del servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Construido; rutas todavía sin ordenar
    Created,
    /// Tabla de rutas ordenada por especificidad
    Sorted,
    /// Socket abierto, aceptando conexiones
    Listening,
    /// Apagado pedido; el accept loop termina
    Stopped,
}

impl ServerState {
    fn as_u8(self) -> u8 {
        match self {
            ServerState::Created => 0,
            ServerState::Sorted => 1,
            ServerState::Listening => 2,
            ServerState::Stopped => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ServerState::Created,
            1 => ServerState::Sorted,
            2 => ServerState::Listening,
            _ => ServerState::Stopped,
        }
    }
}

/// Estado compartido del ciclo de vida
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
    wake_addr: OnceLock<SocketAddr>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(ServerState::Created.as_u8()),
            wake_addr: OnceLock::new(),
        }
    }

    pub(crate) fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.state() == ServerState::Stopped
    }

    /// Transición atómica `from → to`; devuelve el estado real si no aplica
    pub(crate) fn advance(&self, from: ServerState, to: ServerState) -> Result<(), ServerState> {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(ServerState::from_u8)
    }

    /// Registra la dirección a la que conectarse para despertar `accept`
    pub(crate) fn arm(&self, bound: SocketAddr) {
        let _ = self.wake_addr.set(wake_target(bound));
    }

    fn stop(&self) -> ServerState {
        ServerState::from_u8(self.state.swap(ServerState::Stopped.as_u8(), Ordering::SeqCst))
    }
}

/// Capacidad de apagado del servidor.
///
/// Se puede clonar y mover a otro thread (por ejemplo, al que espera las
/// señales del sistema operativo). Las conexiones en curso no se cancelan.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    lifecycle: Arc<Lifecycle>,
}

impl ShutdownHandle {
    pub(crate) fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Pasa el servidor a `Stopped` y despierta el `accept` bloqueado.
    ///
    /// Llamarlo más de una vez no tiene efecto.
    pub fn shutdown(&self) {
        let previous = self.lifecycle.stop();
        if previous == ServerState::Stopped {
            return;
        }
        tracing::debug!(?previous, "Shutdown requested");

        if let Some(addr) = self.lifecycle.wake_addr.get() {
            if let Err(e) = TcpStream::connect_timeout(addr, WAKE_TIMEOUT) {
                tracing::debug!(%addr, error = %e, "Wake connection failed");
            }
        }
    }

    /// Estado actual del servidor
    pub fn state(&self) -> ServerState {
        self.lifecycle.state()
    }

    pub fn is_stopped(&self) -> bool {
        self.lifecycle.is_stopped()
    }
}

/// Un listener en `0.0.0.0`/`::` se despierta por loopback
fn wake_target(bound: SocketAddr) -> SocketAddr {
    let ip = match bound.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, bound.port())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_initial_state() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ServerState::Created);
        assert!(!lifecycle.is_stopped());
    }

    #[test]
    fn test_advance() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(ServerState::Created, ServerState::Sorted).is_ok());
        assert_eq!(
            lifecycle.advance(ServerState::Created, ServerState::Sorted),
            Err(ServerState::Sorted)
        );
        assert!(lifecycle.advance(ServerState::Sorted, ServerState::Listening).is_ok());
        assert_eq!(lifecycle.state(), ServerState::Listening);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let handle = ShutdownHandle::new(Arc::new(Lifecycle::new()));
        handle.shutdown();
        handle.shutdown();
        assert_eq!(handle.state(), ServerState::Stopped);
    }

    #[test]
    fn test_no_transition_out_of_stopped() {
        let lifecycle = Arc::new(Lifecycle::new());
        ShutdownHandle::new(Arc::clone(&lifecycle)).shutdown();
        assert_eq!(
            lifecycle.advance(ServerState::Created, ServerState::Sorted),
            Err(ServerState::Stopped)
        );
    }

    #[test]
    fn test_shutdown_wakes_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.arm(listener.local_addr().unwrap());

        ShutdownHandle::new(lifecycle).shutdown();

        // La conexión de despertar ya está en el backlog
        assert!(listener.accept().is_ok());
    }

    #[test]
    fn test_wake_target_unspecified() {
        let v4: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        assert_eq!(wake_target(v4), "127.0.0.1:9000".parse().unwrap());

        let v6: SocketAddr = "[::]:9000".parse().unwrap();
        assert_eq!(wake_target(v6), "[::1]:9000".parse().unwrap());

        let specific: SocketAddr = "10.0.0.5:80".parse().unwrap();
        assert_eq!(wake_target(specific), specific);
    }
}
