use std::path::Path;

use toml::Table;

use super::ConfigurationError;

/// A source of raw configuration fragments.
///
/// A source is handed a base path (without file extension) and turns it into
/// a nested mapping. When `allow_missing` is `true` a location that does not
/// exist yields an empty mapping; when it is `false` the same situation is an
/// error. That decision is made per call site by the manager, never by the
/// source.
pub trait ConfigurationSource: Send + Sync + std::fmt::Debug {
    fn load(&self, base_path: &Path, allow_missing: bool) -> Result<Table, ConfigurationError>;
}

/// The package enumeration contract consumed by the manager.
///
/// The host system decides what a package is; the manager only needs a key
/// to namespace settings by and a directory to look for fragments in.
pub trait Package {
    fn package_key(&self) -> &str;
    fn configuration_path(&self) -> &Path;
}

/// A named-constant lookup used during placeholder post-processing.
///
/// Injected by the host rather than read from hidden process globals, so
/// tests and embedders control exactly which `%TOKEN%` placeholders resolve.
pub trait ConstantTable: std::fmt::Debug {
    fn is_defined(&self, name: &str) -> bool;
    fn value_of(&self, name: &str) -> Option<String>;
}

impl ConstantTable for std::collections::HashMap<String, String> {
    fn is_defined(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn value_of(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
