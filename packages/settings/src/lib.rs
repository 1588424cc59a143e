// ABOUTME: Settings subsystem core: sanitization, options storage and naming helpers
// ABOUTME: Re-exports the types the API and CLI crates build on

pub mod defaults;
pub mod naming;
pub mod sanitize;
pub mod store;
pub mod types;

pub use defaults::{builtin_defaults, load_defaults};
pub use sanitize::{
    sanitize_attribute, sanitize_document, sanitize_post_content, sanitize_text, sanitize_url,
    SanitizeError,
};
pub use store::{
    MemoryOptionsBackend, OptionsBackend, OptionsStore, SqliteOptionsBackend, StorageError,
    StorageResult,
};
pub use types::{SanitizeType, SettingValue, SettingsDocument, StoredOptions};
