//! Loading and saving JSON/YAML documents as [`serde_json::Value`]

use crate::cli::{CliError, Format};
use serde_json::Value;
use std::path::Path;

/// Pick the format from an explicit choice or the file extension.
///
/// # Errors
///
/// Returns a configuration error when no format is given and the extension
/// is not recognized.
pub fn detect_format(path: &Path, explicit: Option<Format>) -> Result<Format, CliError> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => Ok(Format::Json),
        Some("yaml" | "yml") => Ok(Format::Yaml),
        _ => Err(CliError::config_with_help(
            format!("Cannot detect the format of {}", path.display()),
            "Pass --format json or --format yaml",
        )),
    }
}

/// Parse document text
///
/// # Errors
///
/// Returns a configuration error if the text is not valid in `format`.
pub fn parse(text: &str, format: Format) -> Result<Value, CliError> {
    match format {
        Format::Json => serde_json::from_str(text)
            .map_err(|e| CliError::config(format!("Invalid JSON document: {e}"))),
        Format::Yaml => serde_yaml::from_str(text)
            .map_err(|e| CliError::config(format!("Invalid YAML document: {e}"))),
    }
}

/// Render a document, always ending with a newline
///
/// # Errors
///
/// Returns a configuration error if the value cannot be rendered.
pub fn render(value: &Value, format: Format) -> Result<String, CliError> {
    let mut text = match format {
        Format::Json => serde_json::to_string_pretty(value)
            .map_err(|e| CliError::config(format!("Failed to render JSON: {e}")))?,
        Format::Yaml => serde_yaml::to_string(value)
            .map_err(|e| CliError::config(format!("Failed to render YAML: {e}")))?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Read and parse a document from disk
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed.
pub async fn load(path: &Path, format: Format) -> Result<Value, CliError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::config(format!("Failed to read {}: {e}", path.display())))?;
    parse(&text, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format_from_extension() {
        assert_eq!(detect_format(Path::new("a.json"), None).unwrap(), Format::Json);
        assert_eq!(detect_format(Path::new("a.YAML"), None).unwrap(), Format::Yaml);
        assert_eq!(detect_format(Path::new("a.yml"), None).unwrap(), Format::Yaml);
    }

    #[test]
    fn test_explicit_format_wins() {
        assert_eq!(
            detect_format(&PathBuf::from("config.txt"), Some(Format::Json)).unwrap(),
            Format::Json
        );
    }

    #[test]
    fn test_unknown_extension() {
        let err = detect_format(Path::new("config.txt"), None).unwrap_err();
        assert!(err.to_string().contains("config.txt"));
    }

    #[test]
    fn test_yaml_parse_and_render() {
        let value = parse("a: 1\nb:\n  c: text\n", Format::Yaml).unwrap();
        assert_eq!(value, json!({"a": 1, "b": {"c": "text"}}));
        let text = render(&value, Format::Yaml).unwrap();
        assert_eq!(parse(&text, Format::Yaml).unwrap(), value);
    }

    #[test]
    fn test_json_render_ends_with_newline() {
        let text = render(&json!({"a": 1}), Format::Json).unwrap();
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse("{", Format::Json).is_err());
    }
}
