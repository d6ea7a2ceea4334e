//! Error types for secret resolution

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Boxed error returned by client implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for resolution operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The vault rejected or failed the secret request
    #[error("Failed to get secret '{name}' from key vault")]
    #[diagnostic(
        code(kvconfig::fetch),
        help("Check that the secret exists and that you are signed in to the vault")
    )]
    Fetch {
        /// Secret name
        name: String,
        /// Error reported by the client
        #[source]
        source: BoxError,
    },

    /// The client factory could not produce a client for a vault
    #[error("Failed to create key vault client for {vault}")]
    #[diagnostic(code(kvconfig::client))]
    Client {
        /// Vault base URL
        vault: String,
        /// Error reported by the factory
        #[source]
        source: BoxError,
    },

    /// I/O error while persisting a cache entry
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(kvconfig::io),
        help("Check permissions on the cache directory or disable the cache")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write")
        operation: String,
    },

    /// A typed configuration could not be converted to or from JSON
    #[error("Serialization error: {message}")]
    #[diagnostic(code(kvconfig::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// A string was expected to be a secret reference but is not
    #[error("Not a key vault secret reference: {value}")]
    #[diagnostic(
        code(kvconfig::invalid_reference),
        help("Expected https://<vault>.vault.azure.net/secrets/<name>[/<version>]")
    )]
    InvalidReference {
        /// The rejected value
        value: String,
    },

    /// Invalid option value
    #[error("Configuration error: {message}")]
    #[diagnostic(code(kvconfig::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create a fetch error for a secret
    #[must_use]
    pub fn fetch(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Fetch {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a client factory error for a vault
    #[must_use]
    pub fn client(vault: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Client {
            vault: vault.into(),
            source: source.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }
}

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, Error>;
