//! Settings loading.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. built-in defaults ([`PipelineSettings::default`])
//! 2. a TOML file: the given path, or `tether.toml` in the working
//!    directory when present
//! 3. environment variables prefixed `TETHER_`, e.g.
//!    `TETHER_BASE_URL=https://api.example.com`

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tether_domain::{DomainError, PipelineSettings};
use thiserror::Error;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "tether.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "TETHER";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are out of range.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// No session directory is configured and the platform has no data dir.
    #[error("no session directory configured and no platform data directory available")]
    NoSessionDir,
}

/// Loads and validates settings.
///
/// # Errors
///
/// Returns [`SettingsError::Load`] if an explicitly given file is missing
/// or any source fails to parse, and [`SettingsError::Invalid`] if the
/// merged settings fail validation.
pub fn load_settings(path: Option<&Path>) -> Result<PipelineSettings, SettingsError> {
    let file = match path {
        Some(path) => File::from(path),
        None => File::new(CONFIG_FILE, FileFormat::Toml).required(false),
    };
    load_from(file, Environment::with_prefix(ENV_PREFIX))
}

fn load_from(
    file: File<config::FileSourceFile, FileFormat>,
    environment: Environment,
) -> Result<PipelineSettings, SettingsError> {
    let settings: PipelineSettings = Config::builder()
        .add_source(Config::try_from(&PipelineSettings::default())?)
        .add_source(file)
        .add_source(
            environment
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("unauthenticated_routes"),
        )
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}

/// Directory the session files are kept in.
///
/// # Errors
///
/// Returns [`SettingsError::NoSessionDir`] when neither the settings nor
/// the platform provide one.
pub fn session_dir(settings: &PipelineSettings) -> Result<PathBuf, SettingsError> {
    settings
        .session_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join("tether")))
        .ok_or(SettingsError::NoSessionDir)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let file = File::from(dir.path().join(CONFIG_FILE)).required(false);

        let settings = load_from(file, no_env()).unwrap();

        assert_eq!(settings, PipelineSettings::default());
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "base_url = \"https://api.example.com\"\nwarning_window_secs = 300\n",
        );

        let settings = load_from(File::from(path.as_path()), no_env()).unwrap();

        assert_eq!(settings.base_url, "https://api.example.com");
        assert_eq!(settings.warning_window_secs, 300);
        assert_eq!(settings.refresh_path, "/refresh");
        assert_eq!(settings.poll_interval_secs, 10);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "request_timeout_secs = 30\n");
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::from([
            ("TETHER_REQUEST_TIMEOUT_SECS".to_string(), "15".to_string()),
            (
                "TETHER_UNAUTHENTICATED_ROUTES".to_string(),
                "/login,/welcome".to_string(),
            ),
        ])));

        let settings = load_from(File::from(path.as_path()), env).unwrap();

        assert_eq!(settings.request_timeout_secs, 15);
        assert_eq!(
            settings.unauthenticated_routes,
            vec!["/login".to_string(), "/welcome".to_string()]
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "poll_interval_secs = 0\n");

        let err = load_from(File::from(path.as_path()), no_env()).unwrap_err();

        assert!(matches!(
            err,
            SettingsError::Invalid(DomainError::InvalidSetting {
                name: "poll_interval_secs",
                ..
            })
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn configured_session_dir_wins() {
        let settings = PipelineSettings {
            session_dir: Some(PathBuf::from("/var/lib/tether")),
            ..PipelineSettings::default()
        };
        assert_eq!(
            session_dir(&settings).unwrap(),
            PathBuf::from("/var/lib/tether")
        );
    }
}
