//! Configuration foundation for package-based applications: a hierarchical,
//! lockable option tree and a manager that merges configuration fragments
//! from ordered sources with placeholder substitution.

pub mod config;

pub use config::{ConfigurationError, ConfigurationKind, Container, Manager, OptionValue};
