//! Error handling for pipestore
//!
//! This module defines the crate error type and a Result alias used
//! throughout the pipeline, store and record layers.

use thiserror::Error;

/// Broad classification of a [`PipeStoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid configuration or content (bad paths, types, names)
    Configuration,
    /// Lifecycle misuse by the caller (double connect, use outside an open bracket)
    State,
    /// A backing resource could not be created or opened
    Resource,
    /// Underlying IO or serialization failure
    Io,
}

/// Main error type for pipestore operations
#[derive(Error, Debug)]
pub enum PipeStoreError {
    /// Errors related to configuration and content specifications
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path could not be resolved to a node or terminal
    #[error("Can't resolve \"{path}\" relative to \"{anchor}\"")]
    Unresolved { path: String, anchor: String },

    /// A terminal does not satisfy the capability required by its consumer
    #[error("Source terminal \"{terminal}\" used for input in \"{container}\" is not nameable and cloneable")]
    TypeMismatch { terminal: String, container: String },

    /// Errors caused by calling lifecycle operations in the wrong order
    #[error("State error: {0}")]
    State(String),

    /// A store container or record segment could not be created
    #[error("Could not create \"{resource}\": {message}")]
    Resource { resource: String, message: String },

    /// The pipeline graph contains a dependency cycle
    #[error("Cycle detected in pipeline graph")]
    CycleDetected,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipeStoreError>,
    },
}

impl PipeStoreError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipeStoreError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through any context wrappers
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipeStoreError::Config(_)
            | PipeStoreError::Unresolved { .. }
            | PipeStoreError::TypeMismatch { .. }
            | PipeStoreError::CycleDetected => ErrorCategory::Configuration,
            PipeStoreError::State(_) => ErrorCategory::State,
            PipeStoreError::Resource { .. } => ErrorCategory::Resource,
            PipeStoreError::Io(_) | PipeStoreError::Serialization(_) => ErrorCategory::Io,
            PipeStoreError::WithContext { source, .. } => source.category(),
        }
    }

    pub fn is_config(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_state(&self) -> bool {
        self.category() == ErrorCategory::State
    }

    pub fn is_resource(&self) -> bool {
        self.category() == ErrorCategory::Resource
    }
}

impl From<serde_json::Error> for PipeStoreError {
    fn from(err: serde_json::Error) -> Self {
        PipeStoreError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PipeStoreError {
    fn from(err: toml::de::Error) -> Self {
        PipeStoreError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for PipeStoreError {
    fn from(err: toml::ser::Error) -> Self {
        PipeStoreError::Serialization(err.to_string())
    }
}

/// Result type alias for pipestore operations
pub type Result<T> = std::result::Result<T, PipeStoreError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
