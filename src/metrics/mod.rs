//! # Estadísticas
//! src/metrics/mod.rs
//!
//! Contadores atómicos del servidor:
//! - Conexiones totales y activas
//! - Respuestas por clase (2xx/4xx/5xx)
//! - Errores de parsing y fallas de handlers

pub mod collector;

pub use collector::{ConnectionGuard, ServerStats, StatsSnapshot};
