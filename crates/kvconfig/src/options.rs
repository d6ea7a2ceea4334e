//! Resolver options and cache settings

use crate::{ClientFactory, Error, Result, SecretCache};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable that enables or disables the secret cache
pub const CACHE_ENV: &str = "KVCONFIG_CACHE";
/// Environment variable that overrides the cache directory
pub const CACHE_DIR_ENV: &str = "KVCONFIG_CACHE_DIR";

/// Default number of secrets resolved concurrently
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Cache settings, suitable for embedding in an application's own config
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    /// Whether resolved secrets are cached on disk. Useful during development.
    #[serde(default)]
    pub enabled: bool,

    /// Cache directory, defaults to the platform temporary directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CacheSettings {
    /// Read settings from `KVCONFIG_CACHE` and `KVCONFIG_CACHE_DIR`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `KVCONFIG_CACHE` is not a boolean.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of these settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `KVCONFIG_CACHE` is not a boolean.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(CACHE_ENV) {
            self.enabled = parse_bool(&raw).ok_or_else(|| {
                Error::configuration(format!("{CACHE_ENV} must be a boolean, got '{raw}'"))
            })?;
        }
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Options for a resolution call
#[derive(Clone)]
pub struct ResolverOptions {
    client: Arc<dyn ClientFactory>,
    cache: bool,
    cache_dir: Option<PathBuf>,
    concurrency: usize,
}

impl fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverOptions")
            .field("cache", &self.cache)
            .field("cache_dir", &self.cache_dir)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl ResolverOptions {
    /// Options with the given client factory, caching disabled
    #[must_use]
    pub fn new(client: impl ClientFactory + 'static) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Options with an already shared client factory
    #[must_use]
    pub fn from_shared(client: Arc<dyn ClientFactory>) -> Self {
        Self {
            client,
            cache: false,
            cache_dir: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Enable or disable the on-disk cache
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Set the cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Apply [`CacheSettings`]
    #[must_use]
    pub fn with_cache_settings(mut self, settings: CacheSettings) -> Self {
        self.cache = settings.enabled;
        if let Some(dir) = settings.dir {
            self.cache_dir = Some(dir);
        }
        self
    }

    /// Maximum number of secrets resolved at once. `1` resolves sequentially.
    /// Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The client factory
    #[must_use]
    pub fn client(&self) -> &dyn ClientFactory {
        self.client.as_ref()
    }

    /// Whether the on-disk cache is enabled
    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.cache
    }

    /// Cache directory, the platform temporary directory unless set
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Explicitly configured cache directory, if any
    #[must_use]
    pub fn configured_cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Concurrency limit for tree resolution
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The cache these options point at, if caching is enabled
    #[must_use]
    pub fn secret_cache(&self) -> Option<SecretCache> {
        self.cache.then(|| SecretCache::new(self.cache_dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, KeyVaultSecret, SecretClient};
    use async_trait::async_trait;

    struct NoopClient;

    #[async_trait]
    impl SecretClient for NoopClient {
        async fn get_secret(
            &self,
            _name: &str,
            _version: Option<&str>,
        ) -> std::result::Result<KeyVaultSecret, BoxError> {
            Ok(KeyVaultSecret::empty())
        }
    }

    fn options() -> ResolverOptions {
        ResolverOptions::new(|_: &str| -> Arc<dyn SecretClient> { Arc::new(NoopClient) })
    }

    #[test]
    fn test_defaults() {
        let options = options();
        assert!(!options.cache_enabled());
        assert_eq!(options.cache_dir(), std::env::temp_dir());
        assert_eq!(options.configured_cache_dir(), None);
        assert_eq!(options.concurrency(), DEFAULT_CONCURRENCY);
        assert!(options.secret_cache().is_none());
    }

    #[test]
    fn test_builder() {
        let options = options()
            .with_cache(true)
            .with_cache_dir("/var/cache/kv")
            .with_concurrency(0);
        assert!(options.cache_enabled());
        assert_eq!(options.cache_dir(), PathBuf::from("/var/cache/kv"));
        assert_eq!(options.concurrency(), 1);
        let cache = options.secret_cache().unwrap();
        assert_eq!(cache.dir(), Path::new("/var/cache/kv"));
    }

    #[test]
    fn test_cache_settings_apply() {
        let options = options().with_cache_settings(CacheSettings {
            enabled: true,
            dir: Some(PathBuf::from("/srv/kv")),
        });
        assert!(options.cache_enabled());
        assert_eq!(options.cache_dir(), PathBuf::from("/srv/kv"));
    }

    #[test]
    fn test_debug_omits_client() {
        let debug = format!("{:?}", options());
        assert!(debug.contains("ResolverOptions"));
        assert!(debug.contains("cache"));
    }

    #[test]
    fn test_cache_settings_deserialize_camel_case() {
        let settings: CacheSettings =
            serde_json::from_str(r#"{"enabled": true, "dir": "/tmp/kv"}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.dir, Some(PathBuf::from("/tmp/kv")));

        let settings: CacheSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, CacheSettings::default());
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [(CACHE_ENV, Some("yes")), (CACHE_DIR_ENV, Some("/tmp/kv-env"))],
            || {
                let settings = CacheSettings::from_env().unwrap();
                assert!(settings.enabled);
                assert_eq!(settings.dir, Some(PathBuf::from("/tmp/kv-env")));
            },
        );
    }

    #[test]
    fn test_from_env_unset() {
        temp_env::with_vars_unset([CACHE_ENV, CACHE_DIR_ENV], || {
            assert_eq!(CacheSettings::from_env().unwrap(), CacheSettings::default());
        });
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        temp_env::with_var(CACHE_ENV, Some("maybe"), || {
            let err = CacheSettings::from_env().unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }));
        });
    }

    #[test]
    fn test_env_overrides_keep_file_settings() {
        temp_env::with_vars_unset([CACHE_ENV, CACHE_DIR_ENV], || {
            let settings = CacheSettings {
                enabled: true,
                dir: Some(PathBuf::from("/from/file")),
            }
            .with_env_overrides()
            .unwrap();
            assert!(settings.enabled);
            assert_eq!(settings.dir, Some(PathBuf::from("/from/file")));
        });
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nope"), None);
    }
}
