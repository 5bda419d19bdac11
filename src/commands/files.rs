//! # Comandos de Archivos
//! src/commands/files.rs
//!
//! - POST /createfile?name=FILE&content=TEXT&repeat=N
//! - DELETE /deletefile?name=FILE
//!
//! Los nombres son relativos al directorio de datos configurado; cualquier
//! ruta que salga de él se rechaza. Las fallas de E/S se registran y el
//! cliente recibe un 500 con un mensaje fijo.

use super::{number_param, reply, required_param};
use crate::error::HandlerError;
use crate::http::{Request, Response};
use crate::router::Handler;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

pub const CREATED_BODY: &str = "File created successfully";
pub const CREATE_FAILED_BODY: &str = "Error creating file";
pub const DELETED_BODY: &str = "File deleted successfully";
pub const DELETE_FAILED_BODY: &str = "Error deleting file";

/// Resuelve `name` dentro de `root`.
///
/// Solo se aceptan componentes normales (y `.`); rutas absolutas o con
/// `..` se rechazan.
pub fn resolve(root: &Path, name: &str) -> io::Result<PathBuf> {
    let mut path = root.to_path_buf();
    let mut depth = 0;

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path escapes data directory: {}", name),
                ));
            }
        }
    }

    if depth == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty file name"));
    }
    Ok(path)
}

/// Crea `name` con `content` repetido `repeat` veces.
///
/// Falla si el archivo ya existe; crea los directorios intermedios.
pub fn create_file(root: &Path, name: &str, content: &str, repeat: usize) -> io::Result<PathBuf> {
    if repeat < 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "repeat must be greater than 0",
        ));
    }

    let path = resolve(root, name)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    let mut writer = BufWriter::new(file);
    for _ in 0..repeat {
        writer.write_all(content.as_bytes())?;
    }
    writer.flush()?;

    Ok(path)
}

/// Elimina `name`; no borra directorios
pub fn delete_file(root: &Path, name: &str) -> io::Result<PathBuf> {
    let path = resolve(root, name)?;
    fs::remove_file(&path)?;
    Ok(path)
}

/// Handler para /createfile, anclado a `data_dir`
pub fn createfile_handler(data_dir: PathBuf) -> impl Handler {
    move |req: &Request| -> Result<Response, HandlerError> {
        reply(createfile_response(&data_dir, req))
    }
}

fn createfile_response(data_dir: &Path, req: &Request) -> Result<Response, Response> {
    let name = required_param(req, "name")?;
    let content = required_param(req, "content")?;
    let repeat = number_param(req, "repeat")?;
    if repeat < 1 {
        return Err(Response::bad_request().text("repeat must be greater than 0"));
    }
    let repeat = usize::try_from(repeat)
        .map_err(|_| Response::bad_request().text("repeat must be a number"))?;

    match create_file(data_dir, name, content, repeat) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "File created");
            Ok(Response::ok().text(CREATED_BODY))
        }
        Err(e) => {
            tracing::error!(file = name, error = %e, "Error creating file");
            Ok(Response::internal_error().text(CREATE_FAILED_BODY))
        }
    }
}

/// Handler para /deletefile, anclado a `data_dir`
pub fn deletefile_handler(data_dir: PathBuf) -> impl Handler {
    move |req: &Request| -> Result<Response, HandlerError> {
        reply(deletefile_response(&data_dir, req))
    }
}

fn deletefile_response(data_dir: &Path, req: &Request) -> Result<Response, Response> {
    let name = required_param(req, "name")?;

    match delete_file(data_dir, name) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "File deleted");
            Ok(Response::ok().text(DELETED_BODY))
        }
        Err(e) => {
            tracing::error!(file = name, error = %e, "Error deleting file");
            Ok(Response::internal_error().text(DELETE_FAILED_BODY))
        }
    }
}
