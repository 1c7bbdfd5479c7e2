//! Placeholder substitution for configuration values.
//!
//! String leaves may embed `%TOKEN%` markers, where `TOKEN` consists of
//! ASCII letters, digits and underscores. Tokens that resolve against the
//! supplied constant table are replaced by the constant's value; everything
//! else is left verbatim, so optional or forward-referenced constants never
//! abort startup.

use toml::Value;

use super::container::{Container, OptionValue};
use super::source::ConstantTable;

/// Replaces `%TOKEN%` placeholders in every string leaf of the tree.
///
/// Recurses through sub-containers and into sequence items. Running this a
/// second time over an already-substituted tree changes nothing as long as
/// the substituted values introduced no new tokens.
pub(crate) fn post_process(container: &mut Container, constants: &dyn ConstantTable) {
    for (_, value) in container.iter_mut() {
        match value {
            OptionValue::Scalar(Value::String(s)) => substitute(s, constants),
            OptionValue::Sequence(items) => {
                for item in items.iter_mut() {
                    substitute_value(item, constants);
                }
            }
            OptionValue::Container(child) => post_process(child, constants),
            OptionValue::Scalar(_) => {}
        }
    }
}

fn substitute_value(value: &mut Value, constants: &dyn ConstantTable) {
    match value {
        Value::String(s) => substitute(s, constants),
        Value::Array(items) => {
            for item in items.iter_mut() {
                substitute_value(item, constants);
            }
        }
        Value::Table(table) => {
            for (_, nested) in table.iter_mut() {
                substitute_value(nested, constants);
            }
        }
        _ => {}
    }
}

/// Scans a single string for `%TOKEN%` markers.
///
/// A `%` that is not followed by a token and a closing `%` is ordinary text.
/// Once a closing delimiter has been consumed it does not start another
/// token, so `%A%B%` contains exactly one candidate token, `A`.
fn substitute(s: &mut String, constants: &dyn ConstantTable) {
    if !s.contains('%') {
        return;
    }
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }
        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                token.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if !token.is_empty() && chars.peek() == Some(&'%') {
            chars.next();
            match constants.value_of(&token) {
                Some(value) => result.push_str(&value),
                None => {
                    result.push('%');
                    result.push_str(&token);
                    result.push('%');
                }
            }
        } else {
            result.push('%');
            result.push_str(&token);
        }
    }

    *s = result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn constants(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn container(toml_str: &str) -> Container {
        Container::from_table(toml::from_str(toml_str).unwrap())
    }

    #[test]
    fn defined_tokens_are_replaced() {
        let mut config = container(r#"path = "%BASE_PATH%/data""#);
        post_process(&mut config, &constants(&[("BASE_PATH", "/opt/app")]));
        assert_eq!(
            config.try_get("path").unwrap().as_str(),
            Some("/opt/app/data")
        );
    }

    #[test]
    fn undefined_tokens_are_left_verbatim() {
        let mut config = container(r#"path = "%UNDEFINED%/data""#);
        post_process(&mut config, &constants(&[]));
        assert_eq!(
            config.try_get("path").unwrap().as_str(),
            Some("%UNDEFINED%/data")
        );
    }

    #[test]
    fn multiple_tokens_in_one_string_are_all_replaced() {
        let mut config = container(r#"url = "%SCHEME%://%HOST%/api""#);
        post_process(
            &mut config,
            &constants(&[("SCHEME", "https"), ("HOST", "example.com")]),
        );
        assert_eq!(
            config.try_get("url").unwrap().as_str(),
            Some("https://example.com/api")
        );
    }

    #[test]
    fn lone_and_doubled_percent_signs_are_ordinary_text() {
        let mut config = container(r#"discount = "50% off, 100%% sure""#);
        post_process(&mut config, &constants(&[("off", "nope")]));
        assert_eq!(
            config.try_get("discount").unwrap().as_str(),
            Some("50% off, 100%% sure")
        );
    }

    #[test]
    fn substitution_recurses_into_sub_containers_and_sequences() {
        let mut config = container(
            r#"
            endpoints = ["%HOST%/users", "%HOST%/posts"]
            [server]
            host = "%HOST%"
            "#,
        );
        post_process(&mut config, &constants(&[("HOST", "example.com")]));

        let endpoints = config.try_get("endpoints").unwrap().as_sequence().unwrap();
        assert_eq!(endpoints[0].as_str(), Some("example.com/users"));
        assert_eq!(endpoints[1].as_str(), Some("example.com/posts"));
        let server = config.try_get("server").unwrap().as_container().unwrap();
        assert_eq!(server.try_get("host").unwrap().as_str(), Some("example.com"));
    }

    #[test]
    fn post_processing_is_idempotent() {
        let mut config = container(
            r#"
            resolved = "%BASE%/data"
            unresolved = "%MISSING%/data"
            "#,
        );
        let table = constants(&[("BASE", "/opt")]);
        post_process(&mut config, &table);
        let once = config.clone();
        post_process(&mut config, &table);
        assert_eq!(config, once);
    }

    #[test]
    fn non_string_scalars_are_untouched() {
        let mut config = container("port = 8080\nratio = 0.5\nenabled = true");
        let before = config.clone();
        post_process(&mut config, &constants(&[("8080", "nope")]));
        assert_eq!(config, before);
    }
}
