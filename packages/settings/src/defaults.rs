// ABOUTME: Default settings document used to seed and reset the store
// ABOUTME: Built-in defaults or a JSON file passed through the document sanitizer

use serde_json::json;
use std::path::Path;
use tracing::info;

use crate::sanitize::sanitize_document;
use crate::store::StorageResult;
use crate::types::SettingsDocument;

/// Built-in defaults, used when no defaults file is configured
pub fn builtin_defaults() -> SettingsDocument {
    sanitize_document(&json!({
        "general": {
            "site_title": "Keel",
            "tagline": "",
            "admin_email": "",
            "items_per_page": 10,
            "maintenance_mode": false
        },
        "appearance": {
            "theme": "light",
            "accent_color": "#2271b1",
            "show_breadcrumbs": true
        },
        "notifications": {
            "email_enabled": true,
            "digest_frequency": "weekly"
        },
        "advanced": {
            "cache_ttl": 3600,
            "debug_logging": false
        }
    }))
}

/// Read defaults from a JSON file. The file gets the same cleaning as a
/// submitted document, so an unsafe file cannot seed unsafe values.
pub fn load_defaults(path: &Path) -> StorageResult<SettingsDocument> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let document = sanitize_document(&value);
    info!(path = %path.display(), keys = document.len(), "Loaded settings defaults");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageError;
    use crate::types::SettingValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_defaults_are_already_clean() {
        let defaults = builtin_defaults();
        let value = serde_json::to_value(&defaults).unwrap();
        assert_eq!(sanitize_document(&value), defaults);
        assert_eq!(
            defaults["general"].as_map().unwrap()["items_per_page"],
            SettingValue::Int(10)
        );
    }

    #[test]
    fn test_load_defaults_sanitizes_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"title": "<b>Hi</b>", "on": "true", "list": [1, 2], "nested": {{"n": 5}}}}"#
        )
        .unwrap();

        let document = load_defaults(file.path()).unwrap();
        assert_eq!(document["title"], SettingValue::Text("Hi".into()));
        assert_eq!(document["on"], SettingValue::Bool(true));
        assert!(!document.contains_key("list"));
        assert_eq!(document["nested"].as_map().unwrap()["n"], SettingValue::Int(5));
    }

    #[test]
    fn test_load_defaults_reports_bad_input() {
        let missing = load_defaults(Path::new("/nonexistent/keel-defaults.json"));
        assert!(matches!(missing, Err(StorageError::Io(_))));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_defaults(file.path()), Err(StorageError::Json(_))));
    }
}
