//! Key vault client contract
//!
//! The resolver never talks to a vault directly. Callers supply a
//! [`ClientFactory`] that produces a [`SecretClient`] per vault base URL.

use crate::BoxError;
use async_trait::async_trait;
use std::sync::Arc;

/// A secret as returned by the vault. `None` is treated as an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyVaultSecret {
    /// Secret value
    pub value: Option<String>,
}

impl KeyVaultSecret {
    /// A secret with a value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    /// A secret without a value
    #[must_use]
    pub const fn empty() -> Self {
        Self { value: None }
    }
}

/// Client for a single vault
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Fetch a secret by name. `version: None` requests the latest version.
    async fn get_secret(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<KeyVaultSecret, BoxError>;
}

/// Produces a client for a vault base URL, e.g. `https://myvault.vault.azure.net`
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Create or look up the client for `vault_base_url`
    async fn client(&self, vault_base_url: &str) -> Result<Arc<dyn SecretClient>, BoxError>;
}

#[async_trait]
impl<F> ClientFactory for F
where
    F: Fn(&str) -> Arc<dyn SecretClient> + Send + Sync,
{
    async fn client(&self, vault_base_url: &str) -> Result<Arc<dyn SecretClient>, BoxError> {
        Ok(self(vault_base_url))
    }
}
