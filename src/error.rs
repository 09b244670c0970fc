//! Session-level errors.

use crate::config::ConfigError;
use crate::render::SurfaceError;
use crate::session::ModuleError;
use std::io;
use thiserror::Error;

/// Boxed loader failure.
pub type StartupSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The module could not be loaded or instantiated.
    #[error("module failed to start: {source}")]
    Startup {
        /// What the loader reported.
        source: StartupSource,
    },

    /// The display surface is absent.
    #[error("display surface missing: {0}")]
    MissingSurface(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The module stopped with an error.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Host I/O failed (terminal setup, helper threads).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BridgeError {
    /// Wrap a loader error.
    pub fn startup<E>(source: E) -> Self
    where
        E: Into<StartupSource>,
    {
        Self::Startup {
            source: source.into(),
        }
    }
}

impl From<SurfaceError> for BridgeError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::Missing(what) => Self::MissingSurface(what),
            SurfaceError::Io(err) => Self::Io(err),
        }
    }
}
