//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo implementa el router que mapea método + path a handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Un patrón es un string literal que coincide consigo mismo y con cualquier
//! path que lo extienda por segmentos: `/api` coincide con `/api` y
//! `/api/books`, pero no con `/apiary`.
//!
//! Como el match es por prefijo, las rutas se ordenan una sola vez antes de
//! servir: primero las de más `/`, y a igual cantidad, las más largas. Así
//! siempre gana el patrón más específico.

use crate::error::HandlerError;
use crate::http::{Method, Request, Response};
use std::any::Any;
use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};

/// Contrato de un handler.
///
/// Recibe el request y devuelve una respuesta o una falla interna. Un input
/// inválido del cliente es una respuesta 400, no un `Err`.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> Result<Response, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync,
{
    fn handle(&self, request: &Request) -> Result<Response, HandlerError> {
        self(request)
    }
}

/// Una entrada de la tabla de rutas
pub struct Route {
    method: Method,
    pattern: String,
    handler: Box<dyn Handler>,
}

impl Route {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Clave de especificidad: (cantidad de `/`, largo en caracteres)
    fn specificity(&self) -> (usize, usize) {
        (
            self.pattern.matches('/').count(),
            self.pattern.chars().count(),
        )
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Resultado de despachar un request
#[derive(Debug)]
pub enum RouteOutcome {
    /// Coincidió path y método; contiene lo que devolvió el handler
    Resolved(Result<Response, HandlerError>),

    /// Algún patrón coincidió con el path, pero ninguno con el método
    MethodMismatch,

    /// Ningún patrón coincidió con el path
    PathUnknown,
}

/// Router que mapea (método, patrón) a handlers
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    sorted: bool,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use rawhttp::router::Router;
    /// use rawhttp::http::{Method, Request, Response};
    /// use rawhttp::error::HandlerError;
    ///
    /// fn hello_handler(_req: &Request) -> Result<Response, HandlerError> {
    ///     Ok(Response::ok().text("hola"))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", hello_handler);
    /// router.sort();
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: impl Handler + 'static) {
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            handler: Box::new(handler),
        });
        self.sorted = false;
    }

    /// Atajo para `GET`
    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.register(Method::GET, pattern, handler);
    }

    /// Atajo para `POST`
    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.register(Method::POST, pattern, handler);
    }

    /// Atajo para `PUT`
    pub fn put(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.register(Method::PUT, pattern, handler);
    }

    /// Atajo para `DELETE`
    pub fn delete(&mut self, pattern: &str, handler: impl Handler + 'static) {
        self.register(Method::DELETE, pattern, handler);
    }

    /// Ordena las rutas por especificidad (más segmentos primero, luego más
    /// largas). El sort es estable: a igual clave se respeta el registro.
    pub fn sort(&mut self) {
        self.routes.sort_by_key(|route| Reverse(route.specificity()));
        self.sorted = true;
    }

    /// Indica si la tabla ya está ordenada
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Rutas en el orden en que se prueban
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Cantidad de rutas registradas
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Indica si no hay rutas
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Encuentra y ejecuta el handler apropiado para un request.
    ///
    /// El primer patrón que coincide con el path *y* con el método es el
    /// único que se ejecuta. Un panic del handler se convierte en
    /// `HandlerError::Panicked`.
    pub fn dispatch(&self, request: &Request) -> RouteOutcome {
        let path = request.path();
        let mut path_known = false;

        for route in &self.routes {
            if !matches(path, &route.pattern) {
                continue;
            }
            path_known = true;

            if route.method != request.method() {
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| route.handler.handle(request)))
                .unwrap_or_else(|payload| {
                    Err(HandlerError::Panicked(panic_message(payload.as_ref())))
                });

            return RouteOutcome::Resolved(result);
        }

        if path_known {
            RouteOutcome::MethodMismatch
        } else {
            RouteOutcome::PathUnknown
        }
    }
}

/// Coincidencia exacta, o el path empieza con `pattern + "/"`
pub fn matches(request_path: &str, pattern: &str) -> bool {
    if request_path == pattern {
        return true;
    }

    request_path
        .strip_prefix(pattern)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
