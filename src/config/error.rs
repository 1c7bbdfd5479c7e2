use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("option '{0}' does not exist in this locked configuration container")]
    NoSuchOption(String),

    #[error("cannot introduce option '{0}': the configuration container is locked")]
    ContainerIsLocked(String),

    #[error("invalid configuration type '{0}'")]
    InvalidConfigurationType(String),

    #[error("no package specified for the '{0}' configuration")]
    NoPackageSpecified(String),

    #[error("method '{0}' is not a valid option setter")]
    InvalidSetterMethod(String),

    #[error("option setters take exactly one argument, got {got}")]
    InvalidSetterArity { got: usize },

    #[error("required configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read configuration file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to deserialize configuration: {0}")]
    DeserializeError(#[from] toml::de::Error),
}
