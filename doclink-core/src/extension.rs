//! Descriptors for extension modules and loadable plugins.
//!
//! These are capability contracts only; the access layer never calls into them.
//! `#[derive(Module)]` implements [`Module`] from a `#[module(name = "...", version = "...")]`
//! attribute, falling back to the deriving crate's package name and version.

use std::error::Error as StdError;
use thiserror::Error;

/// A named, versioned extension module.
pub trait Module {
    /// Returns the stable name of the module.
    fn name(&self) -> &str;

    /// Returns the version of the module.
    fn version(&self) -> &str;
}

/// A failure while loading or unloading a [`Plugin`].
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("plugin {0} is already loaded")]
    AlreadyLoaded(String),
    #[error("plugin {0} is not loaded")]
    NotLoaded(String),
    #[error("plugin {id}: {source}")]
    Failed {
        id: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// A unit that can be loaded and unloaded at runtime.
pub trait Plugin {
    /// Returns the stable identifier of the plugin.
    fn id(&self) -> &str;

    /// Returns whether the plugin is currently loaded.
    fn is_loaded(&self) -> bool;

    /// Loads the plugin.
    fn load(&mut self) -> Result<(), PluginError>;

    /// Unloads the plugin.
    fn unload(&mut self) -> Result<(), PluginError>;
}
