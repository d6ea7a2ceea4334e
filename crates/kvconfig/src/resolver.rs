//! Resolution of a single secret reference

use crate::{Error, ResolverOptions, Result, SecretReference};

/// Resolve one reference to its plaintext value.
///
/// With caching enabled the on-disk cache is consulted first and any failure
/// there falls through to the vault. Values fetched from the vault are written
/// back to the cache unless they are empty. An absent or empty value resolves
/// to `""`.
///
/// # Errors
///
/// - [`Error::Client`] if the factory cannot produce a client for the vault
/// - [`Error::Fetch`] if the vault request fails
/// - [`Error::Io`] if the cache entry cannot be written
pub async fn resolve_secret(
    options: &ResolverOptions,
    reference: &SecretReference,
) -> Result<String> {
    let cache = options.secret_cache();

    if let Some(cache) = &cache
        && let Some(value) = cache.read(reference).await
    {
        tracing::debug!(secret = %reference.secret_name, "Resolved secret from cache");
        return Ok(value);
    }

    let client = options
        .client()
        .client(&reference.vault_base_url)
        .await
        .map_err(|e| {
            tracing::error!(
                vault = %reference.vault_base_url,
                error = %e,
                "Error creating key vault client"
            );
            Error::client(&reference.vault_base_url, e)
        })?;

    let secret = client
        .get_secret(&reference.secret_name, reference.secret_version.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(
                secret = %reference.secret_name,
                error = %e,
                "Error getting secret from key vault"
            );
            Error::fetch(&reference.secret_name, e)
        })?;

    let value = match secret.value {
        Some(value) if !value.is_empty() => value,
        _ => {
            tracing::debug!(secret = %reference.secret_name, "Key vault returned an empty secret");
            return Ok(String::new());
        }
    };

    if let Some(cache) = &cache {
        cache.write(reference, &value).await?;
    }

    tracing::debug!(secret = %reference.secret_name, "Resolved secret from key vault");
    Ok(value)
}
