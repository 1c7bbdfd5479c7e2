//! The hierarchical configuration container.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::ConfigurationError;

/// A single configuration option value.
///
/// Nested mappings become child [`Container`]s when a tree is built from a
/// [`toml::Table`]; sequences and scalars are leaves and are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Scalar(Value),
    Sequence(Vec<Value>),
    Container(Container),
}

impl OptionValue {
    /// Returns the scalar value, if this is a scalar option.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            OptionValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the items, if this is a sequence option.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            OptionValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the child container, if this option is a sub-container.
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            OptionValue::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Mutable variant of [`as_container`](Self::as_container).
    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            OptionValue::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, OptionValue::Container(_))
    }

    /// Converts this option back into a plain TOML value.
    fn to_value(&self) -> Value {
        match self {
            OptionValue::Scalar(value) => value.clone(),
            OptionValue::Sequence(items) => Value::Array(items.clone()),
            OptionValue::Container(container) => Value::Table(container.to_table()),
        }
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Table(table) => OptionValue::Container(Container::from_table(table)),
            Value::Array(items) => OptionValue::Sequence(items),
            other => OptionValue::Scalar(other),
        }
    }
}

impl From<Container> for OptionValue {
    fn from(container: Container) -> Self {
        OptionValue::Container(container)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Scalar(Value::String(s.to_owned()))
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Scalar(Value::String(s))
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Scalar(Value::Integer(i))
    }
}

impl From<f64> for OptionValue {
    fn from(f: f64) -> Self {
        OptionValue::Scalar(Value::Float(f))
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Scalar(Value::Boolean(b))
    }
}

/// A general purpose configuration container.
///
/// Options live in an insertion-ordered map. Reading a missing option on an
/// unlocked container creates an empty sub-container on the fly, so nested
/// structures can be built up without declaring intermediate levels first.
/// Once [`lock`](Self::lock)ed, the container and every sub-container become
/// closed against new keys: reads of missing options fail instead of
/// autovivifying, and only existing options may still be overwritten. A locked
/// tree is safe to share read-only across threads.
///
/// ```
/// use ember_fnd::config::Container;
///
/// let mut config = Container::new();
/// config
///     .get("server")?
///     .as_container_mut()
///     .and_then(|server| server.set("port", 8080i64).ok());
/// config.lock();
/// assert!(config.get("missing").is_err());
/// # Ok::<(), ember_fnd::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    options: IndexMap<String, OptionValue>,
    locked: bool,
}

impl Container {
    /// Creates an empty, unlocked container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a container tree from a plain nested mapping.
    ///
    /// Nested tables become sub-containers recursively; all other values are
    /// stored as leaves.
    pub fn from_table(table: Table) -> Self {
        let mut container = Container::new();
        for (name, value) in table {
            container.options.insert(name, OptionValue::from(value));
        }
        container
    }

    /// Converts this container (and all sub-containers) back into a plain
    /// nested mapping. Round-trips with [`from_table`](Self::from_table).
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        for (name, value) in &self.options {
            table.insert(name.clone(), value.to_value());
        }
        table
    }

    /// Deserializes this container into a typed configuration struct.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, ConfigurationError> {
        Value::Table(self.to_table())
            .try_into()
            .map_err(ConfigurationError::DeserializeError)
    }

    /// Returns the value of the named option.
    ///
    /// If the option does not exist it is created as an empty sub-container,
    /// which is what makes chained construction of nested options work. On a
    /// locked container a missing option is an error instead.
    pub fn get(&mut self, name: &str) -> Result<&mut OptionValue, ConfigurationError> {
        if self.locked && !self.options.contains_key(name) {
            return Err(ConfigurationError::NoSuchOption(name.to_owned()));
        }
        Ok(self
            .options
            .entry(name.to_owned())
            .or_insert_with(|| OptionValue::Container(Container::new())))
    }

    /// Returns the value of the named option without any side effect.
    pub fn try_get(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Whether the named option is present. Never autovivifies.
    pub fn has(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Sets the named option to the given value.
    ///
    /// Overwriting an existing option is always allowed; introducing a new
    /// option fails once the container is locked.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if self.locked && !self.options.contains_key(&name) {
            return Err(ConfigurationError::ContainerIsLocked(name));
        }
        self.options.insert(name, value.into());
        Ok(())
    }

    /// Removes the named option. Removing an absent option is not an error,
    /// but any removal on a locked container is.
    pub fn unset(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if self.locked {
            return Err(ConfigurationError::ContainerIsLocked(name.to_owned()));
        }
        self.options.shift_remove(name);
        Ok(())
    }

    /// Locks this container and, depth-first, every sub-container.
    ///
    /// Locking is irreversible and idempotent.
    pub fn lock(&mut self) {
        self.locked = true;
        for value in self.options.values_mut() {
            if let OptionValue::Container(child) = value {
                child.lock();
            }
        }
    }

    /// Whether this container is locked against the introduction of new keys.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Number of top-level options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    ///
    /// Calling `iter` again restarts the traversal. Structural mutation
    /// invalidates any iterator, which the borrow checker enforces.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Mutable iteration over `(name, value)` pairs, for overwriting values
    /// in place. Overwrites are permitted even on locked containers.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut OptionValue)> {
        self.options
            .iter_mut()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Merges another container into this one and returns `self`.
    ///
    /// For every option of `other`, in `other`'s order: if both sides hold a
    /// sub-container under that name the children are merged recursively,
    /// with `other`'s leaves winning on conflicts. In every other case,
    /// including a sub-container meeting a plain leaf, `other`'s value
    /// replaces the existing one entirely. Consuming `other` guarantees the
    /// merged tree shares no children with another container.
    pub fn merge_with(&mut self, other: Container) -> Result<&mut Self, ConfigurationError> {
        for (name, incoming) in other.options {
            let value = match (self.options.get(&name), incoming) {
                (Some(OptionValue::Container(existing)), OptionValue::Container(new_child)) => {
                    let mut merged = existing.clone();
                    merged.merge_with(new_child)?;
                    OptionValue::Container(merged)
                }
                (_, incoming) => incoming,
            };
            self.set(name, value)?;
        }
        Ok(self)
    }

    /// Convention-driven setter dispatch: `"setSomeOption"` with exactly one
    /// argument behaves like `set("someOption", argument)` and returns `self`
    /// so calls can be chained.
    pub fn invoke(
        &mut self,
        method: &str,
        mut arguments: Vec<OptionValue>,
    ) -> Result<&mut Self, ConfigurationError> {
        let rest = method
            .strip_prefix("set")
            .ok_or_else(|| ConfigurationError::InvalidSetterMethod(method.to_owned()))?;
        let mut chars = rest.chars();
        let first = match chars.next() {
            Some(c) if c.is_uppercase() => c,
            _ => return Err(ConfigurationError::InvalidSetterMethod(method.to_owned())),
        };
        if arguments.len() != 1 {
            return Err(ConfigurationError::InvalidSetterArity {
                got: arguments.len(),
            });
        }
        let name: String = first.to_lowercase().chain(chars).collect();
        let value = arguments.pop().expect("arity checked above");
        self.set(name, value)?;
        Ok(self)
    }
}
