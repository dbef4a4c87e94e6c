//! Locate and bind the pdfium shared library.
//!
//! Resolution order (first match wins):
//!
//! 1. `PDFIUM_LIB_PATH`: a library file, or a directory containing one.
//! 2. The directory of the running executable.
//! 3. The current working directory.
//! 4. Common system library directories.
//! 5. The platform's dynamic loader search path.

use crate::error::PdfEditError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

const SYSTEM_LIB_DIRS: &[&str] = &["/usr/local/lib", "/usr/lib", "/opt/homebrew/lib"];

/// Bind to pdfium using the resolution order above.
pub fn bind_pdfium() -> Result<Pdfium, PdfEditError> {
    if let Ok(explicit) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !explicit.trim().is_empty() {
            let lib = library_file(Path::new(&explicit));
            info!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, lib.display());
            return bind_from_path(&lib);
        }
    }

    for dir in candidate_dirs() {
        let lib = Pdfium::pdfium_platform_library_name_at_path(dir.as_path());
        if !lib.exists() {
            continue;
        }
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => {
                debug!("Bound pdfium at {}", lib.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => debug!("Could not bind {}: {}", lib.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PdfEditError::PdfiumBindingFailed(e.to_string()))
}

/// Bind to a pdfium library at an explicit `path`.
pub fn bind_from_path(path: &Path) -> Result<Pdfium, PdfEditError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfEditError::PdfiumBindingFailed(format!("{}: {}", path.display(), e)))
}

/// Accept either the library file itself or the directory holding it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    dirs.extend(SYSTEM_LIB_DIRS.iter().map(PathBuf::from));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_dirs_end_with_system_dirs() {
        let dirs = candidate_dirs();
        let tail: Vec<_> = dirs[dirs.len() - SYSTEM_LIB_DIRS.len()..].to_vec();
        assert_eq!(
            tail,
            SYSTEM_LIB_DIRS.iter().map(PathBuf::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn library_file_keeps_explicit_file_path() {
        let p = Path::new("/definitely/not/here/libpdfium.so");
        assert_eq!(library_file(p), p.to_path_buf());
    }

    #[test]
    fn library_file_expands_directory() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_file(dir.path());
        assert_eq!(lib.parent(), Some(dir.path()));
    }

    #[test]
    fn binding_missing_library_fails() {
        let err = bind_from_path(Path::new("/definitely/not/here/libpdfium.so"));
        assert!(matches!(err, Err(PdfEditError::PdfiumBindingFailed(_))));
    }
}
