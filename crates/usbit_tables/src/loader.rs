//! Resolves and loads device/architecture table files.
//!
//! Table paths are resolved the way this codebase's other crates resolve
//! external reference paths: an explicit argument first, then an
//! environment variable, with no implicit project-directory search — this
//! is a library, not a CLI, so it never guesses at a working directory.

use crate::arch_table::ArchitectureTable;
use crate::device::DeviceTable;
use crate::error::TableError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming the device table file, consulted when no
/// explicit path is given to [`load_device_table`].
pub const DEVICE_DB_ENV: &str = "USBIT_DEVICE_DB";
/// Environment variable naming the architecture table file, consulted when
/// no explicit path is given to [`load_architecture_table`].
pub const ARCH_DB_ENV: &str = "USBIT_ARCH_DB";

fn resolve_path(explicit: Option<&Path>, env: &'static str) -> Result<PathBuf, TableError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    std::env::var_os(env)
        .map(PathBuf::from)
        .ok_or(TableError::MissingEnvVar(env))
}

fn read_to_string(path: &Path) -> Result<String, TableError> {
    std::fs::read_to_string(path).map_err(|source| TableError::TableReadIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a device table, preferring `path` and falling back to
/// [`DEVICE_DB_ENV`].
pub fn load_device_table(path: Option<&Path>) -> Result<Arc<DeviceTable>, TableError> {
    let path = resolve_path(path, DEVICE_DB_ENV)?;
    let text = read_to_string(&path)?;
    let table: DeviceTable =
        serde_json::from_str(&text).map_err(|source| TableError::TableLoad {
            path: path.clone(),
            source,
        })?;
    Ok(Arc::new(table))
}

/// Loads an architecture table, preferring `path` and falling back to
/// [`ARCH_DB_ENV`].
pub fn load_architecture_table(path: Option<&Path>) -> Result<Arc<ArchitectureTable>, TableError> {
    let path = resolve_path(path, ARCH_DB_ENV)?;
    let text = read_to_string(&path)?;
    let table = ArchitectureTable::from_json(&text).map_err(|err| match err {
        TableError::InvalidJson(source) => TableError::TableLoad {
            path: path.clone(),
            source,
        },
        other => other,
    })?;
    Ok(Arc::new(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_var_is_reported() {
        std::env::remove_var(DEVICE_DB_ENV);
        let err = load_device_table(None).unwrap_err();
        assert!(matches!(err, TableError::MissingEnvVar(DEVICE_DB_ENV)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_device_table(Some(Path::new("/nonexistent/device.json"))).unwrap_err();
        assert!(matches!(err, TableError::TableReadIo { .. }));
    }
}
