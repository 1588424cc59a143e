// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Keel

// Server Configuration
pub const KEEL_HOST: &str = "KEEL_HOST";
pub const KEEL_PORT: &str = "KEEL_PORT";
pub const PORT: &str = "PORT"; // Legacy

// Options Storage
pub const KEEL_DATABASE_URL: &str = "KEEL_DATABASE_URL";
pub const KEEL_OPTION_NAME: &str = "KEEL_OPTION_NAME";
pub const KEEL_DEFAULTS_PATH: &str = "KEEL_DEFAULTS_PATH";

// Authorization & Request Integrity
pub const KEEL_ADMIN_TOKEN_HASH: &str = "KEEL_ADMIN_TOKEN_HASH";
pub const KEEL_NONCE_SECRET: &str = "KEEL_NONCE_SECRET";
pub const KEEL_NONCE_LIFETIME_SECS: &str = "KEEL_NONCE_LIFETIME_SECS";

// Admin Screen
pub const KEEL_MENU_PRIORITY: &str = "KEEL_MENU_PRIORITY";

// Defaults
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4010;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://keel.db?mode=rwc";
pub const DEFAULT_OPTION_NAME: &str = "keel_settings";
pub const DEFAULT_NONCE_LIFETIME_SECS: u64 = 86_400;
pub const DEFAULT_MENU_PRIORITY: i32 = 10;

/// Database URL value that selects the process-local backend
pub const MEMORY_DATABASE_URL: &str = "memory";
