use anyhow::Context;
use std::io;
use std::path::Path;

pub const DEFAULT_ENV_FILE: &str = ".env";

/// Loads `KEY=value` pairs from `path` into the process environment without
/// overriding variables that are already set.
///
/// Returns `Ok(false)` when the file does not exist; the settings must then
/// come from the real environment or the command line. An unreadable or
/// malformed file is an error.
pub fn load_env_file(path: &Path) -> anyhow::Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Error loading {}", path.display())),
    }
}
