//! Azure CLI backed secret client

use crate::{BoxError, ClientFactory, KeyVaultSecret, SecretClient, SecretReference};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

/// Default Azure CLI executable
pub const DEFAULT_AZ_PROGRAM: &str = "az";

/// Fetches secrets with `az keyvault secret show`.
///
/// Authentication is whatever `az login` established; nothing is configured
/// here.
#[derive(Debug, Clone)]
pub struct AzCliClient {
    program: PathBuf,
    vault_base_url: String,
}

impl AzCliClient {
    /// Client for one vault using the `az` on `PATH`
    #[must_use]
    pub fn new(vault_base_url: impl Into<String>) -> Self {
        Self::with_program(DEFAULT_AZ_PROGRAM, vault_base_url)
    }

    /// Client for one vault using a specific executable
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>, vault_base_url: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            vault_base_url: vault_base_url.into(),
        }
    }

    fn args(&self, name: &str, version: Option<&str>) -> Vec<String> {
        let id = SecretReference::new(
            self.vault_base_url.clone(),
            name,
            version.map(str::to_string),
        )
        .secret_id();
        vec![
            "keyvault".to_string(),
            "secret".to_string(),
            "show".to_string(),
            "--id".to_string(),
            id,
            "--query".to_string(),
            "value".to_string(),
            "--output".to_string(),
            "tsv".to_string(),
        ]
    }
}

#[async_trait]
impl SecretClient for AzCliClient {
    async fn get_secret(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<KeyVaultSecret, BoxError> {
        let output = Command::new(&self.program)
            .args(self.args(name, version))
            .output()
            .await
            .map_err(|e| format!("Failed to execute '{}': {e}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("az keyvault secret show failed: {}", stderr.trim()).into());
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| format!("az returned a non UTF-8 secret: {e}"))?;
        // tsv output ends with a line break that is not part of the value
        let value = stdout
            .strip_suffix('\n')
            .map(|v| v.strip_suffix('\r').unwrap_or(v))
            .unwrap_or(&stdout);

        if value.is_empty() {
            Ok(KeyVaultSecret::empty())
        } else {
            Ok(KeyVaultSecret::new(value))
        }
    }
}

/// Produces an [`AzCliClient`] per vault
#[derive(Debug, Clone)]
pub struct AzCliClientFactory {
    program: PathBuf,
}

impl Default for AzCliClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AzCliClientFactory {
    /// Factory using the `az` on `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(DEFAULT_AZ_PROGRAM)
    }

    /// Factory using a specific executable
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ClientFactory for AzCliClientFactory {
    async fn client(&self, vault_base_url: &str) -> Result<Arc<dyn SecretClient>, BoxError> {
        Ok(Arc::new(AzCliClient::with_program(
            self.program.clone(),
            vault_base_url,
        )))
    }
}
