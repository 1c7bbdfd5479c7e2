//! File-based configuration source.

use std::path::Path;

use tracing::debug;

use super::source::ConfigurationSource;
use super::ConfigurationError;

/// A configuration source that loads TOML fragments.
///
/// The manager hands over a base path such as `Configuration/Routes`; the
/// source appends the `.toml` extension and parses the file. Whether a
/// missing file is an error is decided by the caller via `allow_missing`.
#[derive(Debug, Clone, Default)]
pub struct TomlFileSource;

impl TomlFileSource {
    pub fn new() -> Self {
        Self
    }
}

impl ConfigurationSource for TomlFileSource {
    fn load(
        &self,
        base_path: &Path,
        allow_missing: bool,
    ) -> Result<toml::Table, ConfigurationError> {
        let path = base_path.with_extension("toml");
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(path = %path.display(), "loaded configuration fragment");
                toml::from_str(&contents).map_err(|e| ConfigurationError::ParseError {
                    path: path.clone(),
                    source: e,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if allow_missing {
                    debug!(path = %path.display(), "configuration fragment absent, skipping");
                    Ok(toml::Table::new())
                } else {
                    Err(ConfigurationError::FileNotFound(path))
                }
            }
            Err(e) => Err(ConfigurationError::ReadError { path, source: e }),
        }
    }
}
