//! Key vault secret reference matching
//!
//! A configuration string is a secret reference when it has the shape
//! `https://{vault}.vault.azure.net/secrets/{name}[/{version}]`. Anything else
//! is an ordinary value and is left alone.

use crate::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// 1. vault base url, 2. secret name, 3. (optional) secret version
#[allow(clippy::expect_used, reason = "the pattern is a literal")]
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https://[^.]+\.vault\.azure\.net)/secrets/([^/]+?)(?:/(.*?))?$")
        .expect("secret reference pattern compiles")
});

/// A parsed reference to a key vault secret
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretReference {
    /// Vault origin, e.g. `https://myvault.vault.azure.net`
    pub vault_base_url: String,
    /// Secret name
    pub secret_name: String,
    /// Secret version; `None` means the latest version
    pub secret_version: Option<String>,
}

impl SecretReference {
    /// Create a reference from its parts
    #[must_use]
    pub fn new(
        vault_base_url: impl Into<String>,
        secret_name: impl Into<String>,
        secret_version: Option<String>,
    ) -> Self {
        Self {
            vault_base_url: vault_base_url.into(),
            secret_name: secret_name.into(),
            secret_version,
        }
    }

    /// Match a string against the secret reference shape.
    ///
    /// Returns `None` for strings that are not references; most configuration
    /// values are not, so this is not an error.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let captures = REFERENCE_PATTERN.captures(value)?;
        let vault_base_url = captures.get(1)?.as_str();
        let secret_name = captures.get(2)?.as_str();
        let secret_version = captures
            .get(3)
            .map(|m| m.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Some(Self::new(vault_base_url, secret_name, secret_version))
    }

    /// The canonical secret identifier URL
    #[must_use]
    pub fn secret_id(&self) -> String {
        match &self.secret_version {
            Some(version) => format!(
                "{}/secrets/{}/{}",
                self.vault_base_url, self.secret_name, version
            ),
            None => format!("{}/secrets/{}", self.vault_base_url, self.secret_name),
        }
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.secret_id())
    }
}

impl FromStr for SecretReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::InvalidReference {
            value: s.to_string(),
        })
    }
}

/// Match an arbitrary configuration value. Only strings can be references.
#[must_use]
pub fn is_secret_reference(value: &Value) -> Option<SecretReference> {
    value.as_str().and_then(SecretReference::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_version() {
        let reference =
            SecretReference::parse("https://myvault.vault.azure.net/secrets/foo/baadf00d").unwrap();
        assert_eq!(reference.vault_base_url, "https://myvault.vault.azure.net");
        assert_eq!(reference.secret_name, "foo");
        assert_eq!(reference.secret_version.as_deref(), Some("baadf00d"));
    }

    #[test]
    fn test_parse_without_version() {
        let reference = SecretReference::parse("https://myvault.vault.azure.net/secrets/foo").unwrap();
        assert_eq!(reference.vault_base_url, "https://myvault.vault.azure.net");
        assert_eq!(reference.secret_name, "foo");
        assert_eq!(reference.secret_version, None);
    }

    #[test]
    fn test_version_keeps_remaining_slashes() {
        let reference =
            SecretReference::parse("https://myvault.vault.azure.net/secrets/foo/a/b/c").unwrap();
        assert_eq!(reference.secret_name, "foo");
        assert_eq!(reference.secret_version.as_deref(), Some("a/b/c"));
    }

    #[test]
    fn test_trailing_slash_means_latest() {
        let reference = SecretReference::parse("https://myvault.vault.azure.net/secrets/foo/").unwrap();
        assert_eq!(reference.secret_name, "foo");
        assert_eq!(reference.secret_version, None);
    }

    #[test]
    fn test_rejects_non_references() {
        for value in [
            "",
            "plain text",
            "https://example.com/secrets/foo",
            "http://myvault.vault.azure.net/secrets/foo",
            "https://my.vault.vault.azure.net/secrets/foo",
            "https://myvault.vault.azure.net/keys/foo",
            "https://myvault.vault.azure.net/secrets/",
            "https://myvault.vault.azure.net/secrets",
            "HTTPS://myvault.vault.azure.net/secrets/foo",
            "https://myvault.VAULT.azure.net/secrets/foo",
            " https://myvault.vault.azure.net/secrets/foo",
        ] {
            assert!(SecretReference::parse(value).is_none(), "matched {value:?}");
        }
    }

    #[test]
    fn test_secret_id_round_trips() {
        for url in [
            "https://myvault.vault.azure.net/secrets/foo",
            "https://myvault.vault.azure.net/secrets/foo/baadf00d",
        ] {
            let reference: SecretReference = url.parse().unwrap();
            assert_eq!(reference.secret_id(), url);
            assert_eq!(reference.to_string(), url);
        }
    }

    #[test]
    fn test_from_str_rejects() {
        let err = "not a reference".parse::<SecretReference>().unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_is_secret_reference_only_matches_strings() {
        assert!(is_secret_reference(&json!("https://myvault.vault.azure.net/secrets/foo")).is_some());
        assert!(is_secret_reference(&json!(1)).is_none());
        assert!(is_secret_reference(&json!(null)).is_none());
        assert!(is_secret_reference(&json!(true)).is_none());
        assert!(is_secret_reference(&json!({"x": "https://myvault.vault.azure.net/secrets/foo"})).is_none());
    }
}
