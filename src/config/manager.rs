//! The configuration manager.
//!
//! Orchestrates configuration sources per category, with a fixed layer
//! order: bundled core defaults, then per-package fragments in enumeration
//! order, then the global configuration directory, then the same directory
//! scoped to the active application context. Later layers win on scalar
//! conflicts and merge recursively on nested ones.

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::debug;

use super::container::{Container, OptionValue};
use super::env::EnvConstants;
use super::source::{ConfigurationSource, ConstantTable, Package};
use super::substitute;
use super::ConfigurationError;

/// Key under which the framework's own settings are registered.
///
/// The bundled core defaults fragment is named after this key, and
/// [`Manager::get_settings`] serves the core settings under it.
pub const CORE_PACKAGE_KEY: &str = "Ember";

/// The closed set of configuration categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationKind {
    /// The framework's own settings, loaded before everything else.
    Core,
    /// Per-package settings, namespaced by package key.
    Settings,
    /// Package metadata, narrowed to one package on retrieval.
    Packages,
    /// Object configuration, served as one merged structure.
    Objects,
    Routes,
    SignalsSlots,
    Caches,
}

impl ConfigurationKind {
    /// File stem of the fragment a source is asked to load for this category.
    pub fn fragment_name(self) -> &'static str {
        match self {
            ConfigurationKind::Core => CORE_PACKAGE_KEY,
            ConfigurationKind::Settings => "Settings",
            ConfigurationKind::Packages => "Packages",
            ConfigurationKind::Objects => "Objects",
            ConfigurationKind::Routes => "Routes",
            ConfigurationKind::SignalsSlots => "SignalsSlots",
            ConfigurationKind::Caches => "Caches",
        }
    }
}

/// A general purpose configuration manager.
///
/// Constructed once per process with a fixed application context; the
/// `load_*` operations run sequentially during startup, core settings first,
/// since later loads may depend on values resolved there.
///
/// ```no_run
/// use ember_fnd::config::{Manager, TomlFileSource};
///
/// let mut manager = Manager::new("Production", "packages/Ember/Configuration", "config")
///     .with_source(TomlFileSource::new());
/// manager.load_core_settings()?;
/// # Ok::<(), ember_fnd::ConfigurationError>(())
/// ```
#[derive(Debug)]
pub struct Manager {
    context: String,
    sources: Vec<Box<dyn ConfigurationSource>>,
    core_configuration_path: PathBuf,
    global_path: PathBuf,
    constants: Box<dyn ConstantTable>,
    settings: Container,
    configurations: IndexMap<ConfigurationKind, Container>,
}

impl Manager {
    /// Creates a manager for the given application context.
    ///
    /// `core_configuration_path` is the directory holding the bundled core
    /// defaults; `global_path` the global override directory, which may
    /// contain a per-context subdirectory named after `context`. Sources are
    /// registered with [`with_source`](Self::with_source); constants default
    /// to the process environment and can be replaced with
    /// [`with_constants`](Self::with_constants).
    pub fn new(
        context: impl Into<String>,
        core_configuration_path: impl Into<PathBuf>,
        global_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            context: context.into(),
            sources: Vec::new(),
            core_configuration_path: core_configuration_path.into(),
            global_path: global_path.into(),
            constants: Box::new(EnvConstants::new()),
            settings: Container::new(),
            configurations: IndexMap::from([
                (ConfigurationKind::Routes, Container::new()),
                (ConfigurationKind::SignalsSlots, Container::new()),
                (ConfigurationKind::Caches, Container::new()),
                (ConfigurationKind::Objects, Container::new()),
            ]),
        }
    }

    /// Registers a configuration source. Sources are consulted in
    /// registration order within each layer; later sources override earlier
    /// ones on conflicting keys.
    pub fn with_source(mut self, source: impl ConfigurationSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Replaces the constant table used for `%TOKEN%` placeholder
    /// substitution.
    pub fn with_constants(mut self, constants: impl ConstantTable + 'static) -> Self {
        self.constants = Box::new(constants);
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Loads the core settings bundled with the framework package and merges
    /// them with the global and context-scoped override layers.
    ///
    /// Core settings are needed far earlier in the bootstrap than any
    /// package's settings, so they are loaded separately; afterwards they can
    /// be retrieved like any other setting through
    /// [`get_settings`](Self::get_settings).
    pub fn load_core_settings(&mut self) -> Result<(), ConfigurationError> {
        debug!(context = %self.context, "loading core settings");
        let fragment_name = ConfigurationKind::Core.fragment_name();

        let mut settings = Container::new();
        for source in &self.sources {
            let fragment = source.load(&self.core_configuration_path.join(fragment_name), false)?;
            settings.merge_with(Container::from_table(fragment))?;
        }
        for source in &self.sources {
            let fragment = source.load(&self.global_path.join(fragment_name), true)?;
            settings.merge_with(Container::from_table(fragment))?;
            let fragment = source.load(
                &self.global_path.join(&self.context).join(fragment_name),
                true,
            )?;
            settings.merge_with(Container::from_table(fragment))?;
        }
        substitute::post_process(&mut settings, self.constants.as_ref());
        self.settings.set(CORE_PACKAGE_KEY, settings)?;
        Ok(())
    }

    /// Loads the settings of the given packages and merges them with those
    /// potentially existing in the global override layers.
    ///
    /// Packages are processed in enumeration order, later packages winning on
    /// conflicting keys. The core package is skipped; its settings were
    /// already loaded by [`load_core_settings`](Self::load_core_settings).
    /// Repeated calls merge into the existing settings registry rather than
    /// replacing it.
    pub fn load_global_settings(
        &mut self,
        packages: &[&dyn Package],
    ) -> Result<(), ConfigurationError> {
        debug!(context = %self.context, packages = packages.len(), "loading global settings");
        let fragment_name = ConfigurationKind::Settings.fragment_name();

        let mut settings = Container::new();
        for package in packages {
            if package.package_key() == CORE_PACKAGE_KEY {
                continue;
            }
            for source in &self.sources {
                let fragment =
                    source.load(&package.configuration_path().join(fragment_name), true)?;
                settings.merge_with(Container::from_table(fragment))?;
            }
        }
        for source in &self.sources {
            let fragment = source.load(&self.global_path.join(fragment_name), true)?;
            settings.merge_with(Container::from_table(fragment))?;
            let fragment = source.load(
                &self.global_path.join(&self.context).join(fragment_name),
                true,
            )?;
            settings.merge_with(Container::from_table(fragment))?;
        }
        substitute::post_process(&mut settings, self.constants.as_ref());
        self.settings.merge_with(settings)?;
        Ok(())
    }

    /// Loads one of the special configuration categories (`Routes`,
    /// `SignalsSlots`, `Caches` or `Objects`) from the given packages and the
    /// global override layers, merging into whatever was stored for the
    /// category so far.
    ///
    /// The stored result is the raw merged structure; interpreting it is left
    /// to the subsystem the category belongs to.
    pub fn load_special_configuration(
        &mut self,
        kind: ConfigurationKind,
        packages: &[&dyn Package],
    ) -> Result<(), ConfigurationError> {
        let mut merged = self
            .configurations
            .get(&kind)
            .cloned()
            .ok_or_else(|| ConfigurationError::InvalidConfigurationType(format!("{kind:?}")))?;
        debug!(context = %self.context, kind = ?kind, "loading special configuration");
        let fragment_name = kind.fragment_name();

        for package in packages {
            for source in &self.sources {
                let fragment =
                    source.load(&package.configuration_path().join(fragment_name), true)?;
                merged.merge_with(Container::from_table(fragment))?;
            }
        }
        for source in &self.sources {
            let fragment = source.load(&self.global_path.join(fragment_name), true)?;
            merged.merge_with(Container::from_table(fragment))?;
        }
        for source in &self.sources {
            let fragment = source.load(
                &self.global_path.join(&self.context).join(fragment_name),
                true,
            )?;
            merged.merge_with(Container::from_table(fragment))?;
        }
        substitute::post_process(&mut merged, self.constants.as_ref());
        self.configurations.insert(kind, merged);
        Ok(())
    }

    /// Returns the settings of the specified package, or an empty container
    /// if no settings were loaded for it. Never an error.
    pub fn get_settings(&self, package_key: &str) -> Container {
        self.settings
            .try_get(package_key)
            .and_then(OptionValue::as_container)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the specified raw configuration.
    ///
    /// `Routes`, `SignalsSlots` and `Caches` are served from the structures
    /// stored by [`load_special_configuration`](Self::load_special_configuration);
    /// the package argument is ignored for them. `Packages` requires a
    /// package, is loaded on demand across all layers and narrowed to that
    /// package's key. `Objects` requires a package and is served whole. Any
    /// other category is a caller bug.
    pub fn get_special_configuration(
        &self,
        kind: ConfigurationKind,
        package: Option<&dyn Package>,
    ) -> Result<Container, ConfigurationError> {
        match kind {
            ConfigurationKind::Routes
            | ConfigurationKind::SignalsSlots
            | ConfigurationKind::Caches => Ok(self
                .configurations
                .get(&kind)
                .cloned()
                .unwrap_or_default()),
            ConfigurationKind::Packages => {
                let package = package
                    .ok_or_else(|| ConfigurationError::NoPackageSpecified(format!("{kind:?}")))?;
                let merged = self.load_layers_for(kind, package)?;
                Ok(merged
                    .try_get(package.package_key())
                    .and_then(OptionValue::as_container)
                    .cloned()
                    .unwrap_or_default())
            }
            ConfigurationKind::Objects => {
                if package.is_none() {
                    return Err(ConfigurationError::NoPackageSpecified(format!("{kind:?}")));
                }
                Ok(self
                    .configurations
                    .get(&ConfigurationKind::Objects)
                    .cloned()
                    .unwrap_or_default())
            }
            other => Err(ConfigurationError::InvalidConfigurationType(format!(
                "{other:?}"
            ))),
        }
    }

    /// Merges one package's fragment with the global and context layers.
    fn load_layers_for(
        &self,
        kind: ConfigurationKind,
        package: &dyn Package,
    ) -> Result<Container, ConfigurationError> {
        let fragment_name = kind.fragment_name();
        let mut merged = Container::new();
        for source in &self.sources {
            let fragment = source.load(&package.configuration_path().join(fragment_name), true)?;
            merged.merge_with(Container::from_table(fragment))?;
        }
        for source in &self.sources {
            let fragment = source.load(&self.global_path.join(fragment_name), true)?;
            merged.merge_with(Container::from_table(fragment))?;
        }
        for source in &self.sources {
            let fragment = source.load(
                &self.global_path.join(&self.context).join(fragment_name),
                true,
            )?;
            merged.merge_with(Container::from_table(fragment))?;
        }
        Ok(merged)
    }
}
