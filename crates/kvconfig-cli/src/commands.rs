//! Command implementations

use crate::cli::{CheckArgs, CliError, ResolveArgs};
use crate::document;
use kvconfig::{
    AzCliClientFactory, CacheSettings, ClientFactory, ResolverOptions, find_references,
    resolve_tree_in_place,
};
use std::sync::Arc;

/// Resolve a document with the Azure CLI client and return the rendered
/// output. With `--in-place` the file is rewritten and `None` is returned.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded or any secret fails to
/// resolve.
pub async fn resolve(args: ResolveArgs) -> Result<Option<String>, CliError> {
    let factory = Arc::new(AzCliClientFactory::with_program(args.az.clone()));
    resolve_with(args, factory).await
}

/// [`resolve`] with an explicit client factory
///
/// # Errors
///
/// Returns an error if the document cannot be loaded or any secret fails to
/// resolve.
pub async fn resolve_with(
    args: ResolveArgs,
    factory: Arc<dyn ClientFactory>,
) -> Result<Option<String>, CliError> {
    let format = document::detect_format(&args.file, args.format)?;
    let mut value = document::load(&args.file, format).await?;

    let mut settings = CacheSettings::from_env()?;
    if args.cache {
        settings.enabled = true;
    }
    if let Some(dir) = args.cache_dir {
        settings.dir = Some(dir);
    }

    let options = ResolverOptions::from_shared(factory)
        .with_cache_settings(settings)
        .with_concurrency(args.concurrency);
    tracing::debug!(file = %args.file.display(), %format, ?options, "Resolving document");

    resolve_tree_in_place(&options, &mut value).await?;
    let rendered = document::render(&value, format)?;

    if args.in_place {
        tokio::fs::write(&args.file, rendered)
            .await
            .map_err(|e| kvconfig::Error::io(e, &args.file, "write"))?;
        tracing::info!(file = %args.file.display(), "Resolved document in place");
        return Ok(None);
    }
    Ok(Some(rendered))
}

/// List the secret references in a document, one `pointer<TAB>secret id` per line
///
/// # Errors
///
/// Returns an error if the document cannot be loaded.
pub async fn check(args: CheckArgs) -> Result<String, CliError> {
    let format = document::detect_format(&args.file, args.format)?;
    let value = document::load(&args.file, format).await?;

    let references = find_references(&value);
    tracing::debug!(file = %args.file.display(), count = references.len(), "Found references");

    Ok(references
        .into_iter()
        .map(|(pointer, reference)| format!("{pointer}\t{reference}\n"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use async_trait::async_trait;
    use kvconfig::{BoxError, KeyVaultSecret, SecretClient};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct EchoNameClient;

    #[async_trait]
    impl SecretClient for EchoNameClient {
        async fn get_secret(
            &self,
            name: &str,
            _version: Option<&str>,
        ) -> Result<KeyVaultSecret, BoxError> {
            Ok(KeyVaultSecret::new(format!("value-of-{name}")))
        }
    }

    fn factory() -> Arc<dyn ClientFactory> {
        Arc::new(|_: &str| -> Arc<dyn SecretClient> { Arc::new(EchoNameClient) })
    }

    fn resolve_args(file: &Path) -> ResolveArgs {
        ResolveArgs {
            file: file.to_path_buf(),
            cache: false,
            cache_dir: None,
            in_place: false,
            concurrency: 2,
            format: None,
            az: PathBuf::from("az"),
        }
    }

    #[tokio::test]
    async fn test_resolve_prints_document() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.json");
        std::fs::write(
            &file,
            r#"{"db": {"password": "https://myvault.vault.azure.net/secrets/db-password"}}"#,
        )
        .unwrap();

        let output = resolve_with(resolve_args(&file), factory())
            .await
            .unwrap()
            .unwrap();

        let value = document::parse(&output, Format::Json).unwrap();
        assert_eq!(value["db"]["password"], "value-of-db-password");
    }

    #[tokio::test]
    async fn test_resolve_in_place_yaml() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.yaml");
        std::fs::write(
            &file,
            "api:\n  key: https://myvault.vault.azure.net/secrets/api-key/v1\n  port: 80\n",
        )
        .unwrap();

        let mut args = resolve_args(&file);
        args.in_place = true;
        assert_eq!(resolve_with(args, factory()).await.unwrap(), None);

        let text = std::fs::read_to_string(&file).unwrap();
        let value = document::parse(&text, Format::Yaml).unwrap();
        assert_eq!(value["api"]["key"], "value-of-api-key");
        assert_eq!(value["api"]["port"], 80);
    }

    #[tokio::test]
    async fn test_check_lists_references() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.json");
        std::fs::write(
            &file,
            r#"{"a": "https://myvault.vault.azure.net/secrets/foo", "b": ["x", "https://myvault.vault.azure.net/secrets/bar/v2"]}"#,
        )
        .unwrap();

        let output = check(CheckArgs {
            file: file.clone(),
            format: None,
        })
        .await
        .unwrap();

        assert_eq!(
            output,
            "/a\thttps://myvault.vault.azure.net/secrets/foo\n\
             /b/1\thttps://myvault.vault.azure.net/secrets/bar/v2\n"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_with(resolve_args(&dir.path().join("absent.json")), factory())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
