//! Key vault references in configuration
//!
//! Configuration values of the form
//! `https://{vault}.vault.azure.net/secrets/{name}[/{version}]` are replaced
//! with the secret's value, fetched through a caller-supplied client.
//!
//! # Layers
//!
//! - [`SecretReference::parse`] recognizes references
//! - [`resolve_secret`] resolves one reference, optionally through an
//!   encrypted on-disk [`SecretCache`]
//! - [`resolve_tree`] / [`resolve_tree_in_place`] walk a [`serde_json::Value`]
//!   and resolve every reference found
//!
//! # Example
//!
//! ```ignore
//! use kvconfig::{AzCliClientFactory, ResolverOptions, resolve_tree};
//!
//! let options = ResolverOptions::new(AzCliClientFactory::new()).with_cache(true);
//! let config = serde_json::json!({
//!     "database": { "password": "https://myvault.vault.azure.net/secrets/db-password" }
//! });
//! let resolved = resolve_tree(&options, &config).await?;
//! ```

mod cache;
mod client;
pub mod clients;
mod error;
mod options;
mod reference;
mod resolver;
mod traversal;

pub use cache::{CACHE_FILE_PREFIX, CacheKey, SecretCache};
pub use client::{ClientFactory, KeyVaultSecret, SecretClient};
pub use clients::{AzCliClient, AzCliClientFactory};
pub use error::{BoxError, Error, Result};
pub use options::{
    CACHE_DIR_ENV, CACHE_ENV, CacheSettings, DEFAULT_CONCURRENCY, ResolverOptions,
};
pub use reference::{SecretReference, is_secret_reference};
pub use resolver::resolve_secret;
pub use traversal::{find_references, resolve_config, resolve_tree, resolve_tree_in_place};
