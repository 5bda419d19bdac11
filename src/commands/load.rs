//! # Comandos de Carga
//! src/commands/load.rs
//!
//! Comandos que bloquean su thread a propósito, para observar la
//! concurrencia del servidor:
//! - /simulate: tarea con nombre que tarda N segundos
//! - /sleep: dormir N segundos
//! - /loadtest: N threads durmiendo en paralelo

use super::{number_param, reply, required_param};
use crate::error::HandlerError;
use crate::http::{Request, Response};
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};

/// Parámetro de segundos: entero y no negativo
fn seconds_param(req: &Request, name: &str) -> Result<u64, Response> {
    let seconds = number_param(req, name)?;
    u64::try_from(seconds)
        .map_err(|_| Response::bad_request().text(&format!("{} must be >= 0", name)))
}

#[derive(Debug, Serialize)]
struct SimulateBody<'a> {
    task: &'a str,
    done: bool,
}

/// Handler para /simulate?seconds=S&task=NAME
pub fn simulate_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(simulate_response(req))
}

fn simulate_response(req: &Request) -> Result<Response, Response> {
    let seconds = seconds_param(req, "seconds")?;
    let task = required_param(req, "task")?;

    thread::sleep(Duration::from_secs(seconds));

    Ok(Response::ok().json(&SimulateBody { task, done: true }))
}

/// Handler para /sleep?seconds=S
pub fn sleep_handler(req: &Request) -> Result<Response, HandlerError> {
    reply(seconds_param(req, "seconds").map(|seconds| {
        thread::sleep(Duration::from_secs(seconds));
        Response::ok().text(&format!("slept {} seconds", seconds))
    }))
}

#[derive(Debug, Serialize)]
struct LoadTestBody {
    tasks: u64,
    sleep: u64,
    duration_ms: u64,
}

/// Máximo de threads que lanza un solo /loadtest
pub const MAX_LOADTEST_TASKS: u64 = 100;

/// Handler para /loadtest?tasks=N&sleep=X
///
/// Lanza `tasks` threads que duermen `sleep` segundos cada uno y mide
/// cuánto tardan todos en terminar.
pub fn loadtest_handler(req: &Request) -> Result<Response, HandlerError> {
    match loadtest_params(req) {
        Ok((tasks, sleep)) => run_loadtest(tasks, sleep),
        Err(bad_request) => Ok(bad_request),
    }
}

fn loadtest_params(req: &Request) -> Result<(u64, u64), Response> {
    let tasks = number_param(req, "tasks")?;
    if tasks < 1 {
        return Err(Response::bad_request().text("tasks must be >= 1"));
    }
    let tasks = u64::try_from(tasks)
        .map_err(|_| Response::bad_request().text("tasks must be a number"))?;
    if tasks > MAX_LOADTEST_TASKS {
        return Err(Response::bad_request()
            .text(&format!("tasks must be <= {}", MAX_LOADTEST_TASKS)));
    }
    let sleep = seconds_param(req, "sleep")?;
    Ok((tasks, sleep))
}

fn run_loadtest(tasks: u64, sleep: u64) -> Result<Response, HandlerError> {
    let start = Instant::now();
    thread::scope(|scope| -> Result<(), HandlerError> {
        let mut workers = Vec::new();
        for _ in 0..tasks {
            let worker = thread::Builder::new()
                .spawn_scoped(scope, move || thread::sleep(Duration::from_secs(sleep)))?;
            workers.push(worker);
        }
        for worker in workers {
            worker
                .join()
                .map_err(|_| HandlerError::Internal("loadtest worker panicked".to_string()))?;
        }
        Ok(())
    })?;

    Ok(Response::ok().json(&LoadTestBody {
        tasks,
        sleep,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}
