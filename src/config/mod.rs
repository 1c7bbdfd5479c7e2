//! Configuration loading and management.

mod container;
mod env;
mod error;
mod file;
mod manager;
mod source;
mod substitute;

pub use container::{Container, OptionValue};
pub use env::EnvConstants;
pub use error::ConfigurationError;
pub use file::TomlFileSource;
pub use manager::{ConfigurationKind, Manager, CORE_PACKAGE_KEY};
pub use source::{ConfigurationSource, ConstantTable, Package};
