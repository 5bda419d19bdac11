//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones
//! simultáneas usando threads. Cada conexión se procesa en su propio thread:
//!
//! ```text
//! accept → leer → parsear → rutear → handler → serializar → escribir → cerrar
//! ```
//!
//! Se escribe exactamente una respuesta por conexión (sin keep-alive).

use super::lifecycle::{Lifecycle, ServerState, ShutdownHandle};
use crate::config::Config;
use crate::error::ServerError;
use crate::http::{ParserConfig, Request, Response};
use crate::metrics::{ConnectionGuard, ServerStats};
use crate::router::{RouteOutcome, Router};
use std::io::BufReader;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Body fijo de un 500; el detalle de la falla solo va al log
pub const INTERNAL_ERROR_BODY: &str = "500 Internal Server Error";

/// Body del 404
pub const NOT_FOUND_BODY: &str = "404 Not Found";

/// Body del 400 por método no registrado para un path conocido
pub const METHOD_NOT_ALLOWED_BODY: &str = "method not allowed";

const SERVER_HEADER: &str = concat!("rawhttp/", env!("CARGO_PKG_VERSION"));

/// Lo que cada thread de conexión necesita de la configuración
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    parser: ParserConfig,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl ConnectionSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            parser: config.parser_config(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        }
    }
}

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    config: Config,
    router: Arc<Router>,
    stats: Arc<ServerStats>,
    lifecycle: Arc<Lifecycle>,
    listener: Option<TcpListener>,
}

impl Server {
    /// Crea un servidor en estado `Created`
    pub fn new(config: Config, router: Router) -> Self {
        Self::with_stats(config, router, Arc::new(ServerStats::new()))
    }

    /// Igual que `new`, compartiendo estadísticas ya creadas (por ejemplo,
    /// las que lee el handler de `/status`)
    pub fn with_stats(config: Config, router: Router, stats: Arc<ServerStats>) -> Self {
        Self {
            config,
            router: Arc::new(router),
            stats,
            lifecycle: Arc::new(Lifecycle::new()),
            listener: None,
        }
    }

    /// Ordena las rutas y abre el socket de escucha.
    ///
    /// Si el bind falla el servidor queda en `Sorted` y se puede reintentar.
    pub fn bind(&mut self) -> Result<SocketAddr, ServerError> {
        self.config.validate().map_err(ServerError::Config)?;

        match self.lifecycle.state() {
            ServerState::Created => {
                let router = Arc::get_mut(&mut self.router)
                    .ok_or(ServerError::InvalidState(ServerState::Created))?;
                router.sort();
                self.lifecycle
                    .advance(ServerState::Created, ServerState::Sorted)
                    .map_err(ServerError::InvalidState)?;
                debug!(routes = self.router.len(), "Routes sorted");
            }
            ServerState::Sorted => {}
            other => return Err(ServerError::InvalidState(other)),
        }

        let address = self.config.address();
        let bind_error = |source| ServerError::Bind {
            addr: address.clone(),
            source,
        };
        let listener = TcpListener::bind(&address).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        self.lifecycle.arm(local_addr);
        self.lifecycle
            .advance(ServerState::Sorted, ServerState::Listening)
            .map_err(ServerError::InvalidState)?;
        self.listener = Some(listener);

        info!(address = %local_addr, "Server started");
        Ok(local_addr)
    }

    /// Corre el accept loop hasta que se pida el apagado.
    ///
    /// Retorna `Ok(())` al detenerse por un `ShutdownHandle`; cualquier
    /// otra falla de `accept` es fatal. En ambos casos el socket de escucha
    /// se cierra al salir, aunque el `Server` siga vivo.
    pub fn serve(&mut self) -> Result<(), ServerError> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| ServerError::InvalidState(self.state()))?;
        let settings = ConnectionSettings::from_config(&self.config);

        loop {
            if self.lifecycle.is_stopped() {
                break;
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    if self.lifecycle.is_stopped() {
                        debug!(%peer, "Dropping connection accepted after shutdown");
                        break;
                    }
                    self.spawn_connection(stream, peer, settings);
                }
                Err(_) if self.lifecycle.is_stopped() => break,
                Err(e) => {
                    error!(error = %e, "Accept failed");
                    return Err(ServerError::Accept(e));
                }
            }
        }

        drop(listener);
        info!("Server stopped");
        Ok(())
    }

    /// `bind` + `serve`
    pub fn run(&mut self) -> Result<(), ServerError> {
        self.bind()?;
        self.serve()
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, settings: ConnectionSettings) {
        let guard = self.stats.connection_opened();
        let router = Arc::clone(&self.router);
        let stats = Arc::clone(&self.stats);

        // Segundo descriptor para responder si el thread no arranca
        let fallback = stream.try_clone();

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || handle_connection(stream, peer, &router, &stats, settings, guard));

        if let Err(e) = spawned {
            error!(%peer, error = %e, "Failed to spawn connection thread");
            match fallback {
                Ok(stream) => reject_connection(stream, peer, &self.stats, settings.write_timeout),
                Err(e) => error!(%peer, error = %e, "Connection closed without response"),
            }
        }
    }

    /// Dirección real del listener (útil con puerto 0); `None` antes de
    /// `bind` y después de que `serve` retorna
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.state()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Capacidad de apagado, clonable entre threads
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.lifecycle))
    }
}

/// Ciclo completo de una conexión.
///
/// El stream y el guard se sueltan al salir, en cualquier camino.
fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    router: &Router,
    stats: &ServerStats,
    settings: ConnectionSettings,
    _guard: ConnectionGuard,
) {
    let start = Instant::now();
    debug!(%peer, "Connection accepted");

    if let Err(e) = stream
        .set_read_timeout(settings.read_timeout)
        .and_then(|_| stream.set_write_timeout(settings.write_timeout))
    {
        warn!(%peer, error = %e, "Failed to set socket timeouts");
    }

    let mut response = respond(&stream, peer, router, stats, &settings.parser);
    add_common_headers(&mut response);

    match response.write_to(&mut stream) {
        Ok(()) => {
            stats.record_response(response.status_code());
            info!(
                %peer,
                status = response.status_code(),
                status_text = response.status_text(),
                latency_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Response sent"
            );
        }
        Err(e) => error!(%peer, error = %e, "Failed to write response"),
    }

    let _ = stream.shutdown(Shutdown::Write);
    debug!(%peer, "Connection closed");
}

/// Lee, parsea y rutea; siempre produce una respuesta
fn respond(
    stream: &TcpStream,
    peer: SocketAddr,
    router: &Router,
    stats: &ServerStats,
    parser: &ParserConfig,
) -> Response {
    let mut reader = BufReader::new(stream);

    let request = match Request::read_from(&mut reader, parser) {
        Ok(request) => request,
        Err(e) => {
            stats.record_parse_error();
            warn!(%peer, error = %e, "Bad request");
            return Response::bad_request().text(&e.to_string());
        }
    };

    info!(%peer, method = %request.method(), path = request.path(), "Request received");

    match router.dispatch(&request) {
        RouteOutcome::Resolved(Ok(response)) => response,
        RouteOutcome::Resolved(Err(e)) => {
            stats.record_handler_failure();
            error!(%peer, path = request.path(), error = %e, "Handler failed");
            Response::internal_error().text(INTERNAL_ERROR_BODY)
        }
        RouteOutcome::MethodMismatch => Response::bad_request().text(METHOD_NOT_ALLOWED_BODY),
        RouteOutcome::PathUnknown => Response::not_found().text(NOT_FOUND_BODY),
    }
}

/// 500 escrito desde el thread de accept cuando no hay thread para la
/// conexión; no se lee el request
fn reject_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    stats: &ServerStats,
    write_timeout: Option<Duration>,
) {
    if let Err(e) = stream.set_write_timeout(write_timeout) {
        warn!(%peer, error = %e, "Failed to set socket timeouts");
    }

    let mut response = Response::internal_error().text(INTERNAL_ERROR_BODY);
    add_common_headers(&mut response);

    match response.write_to(&mut stream) {
        Ok(()) => stats.record_response(response.status_code()),
        Err(e) => error!(%peer, error = %e, "Failed to write response"),
    }
    let _ = stream.shutdown(Shutdown::Write);
}

fn add_common_headers(response: &mut Response) {
    if response.header("Server").is_none() {
        response.add_header("Server", SERVER_HEADER);
    }
    response.add_header("Connection", "close");
}
