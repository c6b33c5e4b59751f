//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `HIKAYAT_BACKEND_URL`: Identity backend base URL
//! - `HIKAYAT_ANON_KEY`: Public (anon) API key
//! - `HIKAYAT_HTTP_TIMEOUT_SECS`: HTTP client timeout in seconds (optional)
//! - `HIKAYAT_SESSION_TIMEOUT_MS`: Session inactivity window in
//!   milliseconds (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./hikayat.json` or `./hikayat.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use hikayat_domain::constants::{DEFAULT_HTTP_TIMEOUT_SECS, SESSION_INACTIVITY_TIMEOUT_MS};
use hikayat_domain::{BackendConfig, Config, HikayatError, Result, SessionConfig};
use url::Url;

/// Load configuration with automatic fallback strategy
///
/// Reads a `.env` file if one is present, then attempts to load from
/// environment variables. If any required variables are missing, falls
/// back to loading from a config file.
///
/// # Errors
/// Returns `HikayatError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            // Fall back to file
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `HikayatError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let backend_url = env_var("HIKAYAT_BACKEND_URL")?;
    let anon_key = env_var("HIKAYAT_ANON_KEY")?;

    let http_timeout_secs = match std::env::var("HIKAYAT_HTTP_TIMEOUT_SECS") {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| HikayatError::Config(format!("Invalid HTTP timeout: {}", e)))?,
        Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
    };

    let inactivity_timeout_ms = match std::env::var("HIKAYAT_SESSION_TIMEOUT_MS") {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|e| HikayatError::Config(format!("Invalid session timeout: {}", e)))?,
        Err(_) => SESSION_INACTIVITY_TIMEOUT_MS,
    };

    let config = Config {
        backend: BackendConfig { url: backend_url, anon_key, http_timeout_secs },
        session: SessionConfig { inactivity_timeout_ms },
    };
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `HikayatError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(HikayatError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            HikayatError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| HikayatError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `HikayatError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| HikayatError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| HikayatError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(HikayatError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./hikayat.{json,toml}`)
/// 2. Parent directory
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("hikayat.json"),
            cwd.join("hikayat.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("hikayat.json"),
                exe_dir.join("hikayat.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Sanity-check loaded values before handing them to the wiring layer.
fn validate(config: &Config) -> Result<()> {
    let url = Url::parse(&config.backend.url)
        .map_err(|e| HikayatError::Config(format!("Invalid backend URL: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(HikayatError::Config(format!(
            "Unsupported backend URL scheme: {}",
            url.scheme()
        )));
    }
    if config.backend.anon_key.trim().is_empty() {
        return Err(HikayatError::Config("Anon key must not be empty".to_string()));
    }
    if config.session.inactivity_timeout_ms <= 0 {
        return Err(HikayatError::Config("Session timeout must be positive".to_string()));
    }
    Ok(())
}

/// Get required environment variable
///
/// # Errors
/// Returns `HikayatError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        HikayatError::Config(format!("Missing required environment variable: {}", key))
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_hikayat_env() {
        std::env::remove_var("HIKAYAT_BACKEND_URL");
        std::env::remove_var("HIKAYAT_ANON_KEY");
        std::env::remove_var("HIKAYAT_HTTP_TIMEOUT_SECS");
        std::env::remove_var("HIKAYAT_SESSION_TIMEOUT_MS");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_hikayat_env();

        std::env::set_var("HIKAYAT_BACKEND_URL", "https://xyzcompany.supabase.co");
        std::env::set_var("HIKAYAT_ANON_KEY", "anon-key");
        std::env::set_var("HIKAYAT_HTTP_TIMEOUT_SECS", "10");
        std::env::set_var("HIKAYAT_SESSION_TIMEOUT_MS", "60000");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.backend.url, "https://xyzcompany.supabase.co");
        assert_eq!(config.backend.anon_key, "anon-key");
        assert_eq!(config.backend.http_timeout_secs, 10);
        assert_eq!(config.session.inactivity_timeout_ms, 60_000);

        clear_hikayat_env();
    }

    #[test]
    fn test_load_from_env_defaults_optional_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_hikayat_env();

        std::env::set_var("HIKAYAT_BACKEND_URL", "https://xyzcompany.supabase.co");
        std::env::set_var("HIKAYAT_ANON_KEY", "anon-key");

        let config = load_from_env().expect("optional vars should default");
        assert_eq!(config.backend.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.session.inactivity_timeout_ms, SESSION_INACTIVITY_TIMEOUT_MS);

        clear_hikayat_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_hikayat_env();

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with missing env var");

        let err = result.unwrap_err();
        assert!(matches!(err, HikayatError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_hikayat_env();

        std::env::set_var("HIKAYAT_BACKEND_URL", "https://xyzcompany.supabase.co");
        std::env::set_var("HIKAYAT_ANON_KEY", "anon-key");
        std::env::set_var("HIKAYAT_SESSION_TIMEOUT_MS", "not-a-number");

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with invalid session timeout");

        let err = result.unwrap_err();
        assert!(matches!(err, HikayatError::Config(_)), "Should be a Config error");

        clear_hikayat_env();
    }

    #[test]
    fn test_load_from_env_rejects_bad_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_hikayat_env();

        std::env::set_var("HIKAYAT_BACKEND_URL", "not a url");
        std::env::set_var("HIKAYAT_ANON_KEY", "anon-key");

        let result = load_from_env();
        assert!(result.is_err(), "Should reject an unparseable URL");

        clear_hikayat_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "backend": {
                "url": "https://xyzcompany.supabase.co",
                "anon_key": "anon-key",
                "http_timeout_secs": 20
            },
            "session": {
                "inactivity_timeout_ms": 120000
            }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_ok(), "Should load config from JSON file");

        let config = result.unwrap();
        assert_eq!(config.backend.url, "https://xyzcompany.supabase.co");
        assert_eq!(config.backend.http_timeout_secs, 20);
        assert_eq!(config.session.inactivity_timeout_ms, 120_000);

        // Cleanup
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[backend]
url = "https://xyzcompany.supabase.co"
anon_key = "anon-key"

[session]
inactivity_timeout_ms = 3600000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_ok(), "Should load config from TOML file");

        let config = result.unwrap();
        assert_eq!(config.backend.anon_key, "anon-key");
        assert_eq!(config.backend.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.session.inactivity_timeout_ms, 3_600_000);

        // Cleanup
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(result.is_err(), "Should fail when file not found");

        let err = result.unwrap_err();
        assert!(matches!(err, HikayatError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let invalid_json = r#"{ "this is": "not valid json" "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_json.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        // Cleanup
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let content = "some content";
        let path = PathBuf::from("test.yaml");
        let result = parse_config(content, &path);
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_validate_rejects_nonpositive_timeout() {
        let config = Config {
            backend: BackendConfig {
                url: "https://xyzcompany.supabase.co".to_string(),
                anon_key: "anon-key".to_string(),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            session: SessionConfig { inactivity_timeout_ms: 0 },
        };
        assert!(validate(&config).is_err(), "Zero timeout should be rejected");
    }
}
