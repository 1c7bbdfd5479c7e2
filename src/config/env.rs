use super::source::ConstantTable;

/// A constant table backed by the process environment.
///
/// The closest Rust analogue to process-wide named constants: a `%TOKEN%`
/// placeholder resolves to the value of the environment variable `TOKEN`.
/// An optional prefix restricts which variables are visible, so unrelated
/// environment noise cannot leak into configuration values.
#[derive(Debug, Clone, Default)]
pub struct EnvConstants {
    prefix: Option<String>,
}

impl EnvConstants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only exposes variables whose name starts with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn visible(&self, name: &str) -> bool {
        match &self.prefix {
            Some(prefix) => name.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

impl ConstantTable for EnvConstants {
    fn is_defined(&self, name: &str) -> bool {
        self.visible(name) && std::env::var_os(name).is_some()
    }

    fn value_of(&self, name: &str) -> Option<String> {
        if !self.visible(name) {
            return None;
        }
        std::env::var(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_environment_variables() {
        std::env::set_var("EMBER_FND_TEST_CONSTANT", "resolved");
        let constants = EnvConstants::new();
        assert!(constants.is_defined("EMBER_FND_TEST_CONSTANT"));
        assert_eq!(
            constants.value_of("EMBER_FND_TEST_CONSTANT"),
            Some("resolved".to_owned())
        );
        std::env::remove_var("EMBER_FND_TEST_CONSTANT");
    }

    #[test]
    fn undefined_variables_are_not_defined() {
        let constants = EnvConstants::new();
        assert!(!constants.is_defined("EMBER_FND_SURELY_NOT_SET"));
        assert_eq!(constants.value_of("EMBER_FND_SURELY_NOT_SET"), None);
    }

    #[test]
    fn prefix_hides_unrelated_variables() {
        std::env::set_var("EMBER_FND_PREFIXED", "yes");
        std::env::set_var("UNRELATED_FND_VAR", "no");
        let constants = EnvConstants::with_prefix("EMBER_");
        assert!(constants.is_defined("EMBER_FND_PREFIXED"));
        assert!(!constants.is_defined("UNRELATED_FND_VAR"));
        std::env::remove_var("EMBER_FND_PREFIXED");
        std::env::remove_var("UNRELATED_FND_VAR");
    }
}
