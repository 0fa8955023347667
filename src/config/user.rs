//! Locating and loading the user's options file.
//!
//! Location: $XDG_CONFIG_HOME/dirwire/dirwire.toml

use std::path::{Path, PathBuf};

use super::ConnectionOptions;
use crate::error::ConfigError;

/// Returns the path to the user options file, if XDG_CONFIG_HOME is set.
pub fn user_options_path() -> Option<PathBuf> {
    let xdg_config = std::env::var_os("XDG_CONFIG_HOME")?;
    Some(PathBuf::from(xdg_config).join("dirwire").join("dirwire.toml"))
}

/// Load and validate options from a TOML file.
pub fn load_options(path: &Path) -> Result<ConnectionOptions, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let options = ConnectionOptions::from_toml_str(&text)?;
    log::debug!(
        target: "dirwire::config",
        "Loaded connection options from {}",
        path.display()
    );
    Ok(options)
}

/// Load the user options file, falling back to defaults when it is absent.
///
/// A file that exists but cannot be parsed is still an error.
pub fn load_user_options() -> Result<ConnectionOptions, ConfigError> {
    match user_options_path() {
        Some(path) if path.exists() => load_options(&path),
        _ => Ok(ConnectionOptions::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn with_xdg_config_home<T>(value: Option<&Path>, f: impl FnOnce() -> T) -> T {
        let original = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: #[serial(xdg_env)] prevents concurrent modification of XDG_CONFIG_HOME
        unsafe {
            match value {
                Some(path) => env::set_var("XDG_CONFIG_HOME", path),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
        let result = f();
        // SAFETY: same as above, restoring the original value
        unsafe {
            match original {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
        result
    }

    #[test]
    #[serial(xdg_env)]
    fn user_options_path_uses_xdg_config_home() {
        let path = with_xdg_config_home(Some(Path::new("/custom/config")), user_options_path);
        assert_eq!(
            path,
            Some(PathBuf::from("/custom/config/dirwire/dirwire.toml"))
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn user_options_path_is_none_without_xdg() {
        assert_eq!(with_xdg_config_home(None, user_options_path), None);
    }

    #[test]
    #[serial(xdg_env)]
    fn missing_user_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options =
            with_xdg_config_home(Some(dir.path()), load_user_options).expect("defaults");
        assert_eq!(options, ConnectionOptions::default());
    }

    #[test]
    #[serial(xdg_env)]
    fn user_file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_dir = dir.path().join("dirwire");
        std::fs::create_dir_all(&config_dir).expect("mkdir");
        std::fs::write(config_dir.join("dirwire.toml"), "abandon_on_timeout = true\n")
            .expect("write");

        let options =
            with_xdg_config_home(Some(dir.path()), load_user_options).expect("should load");
        assert!(options.abandon_on_timeout);
    }

    #[test]
    fn load_options_reports_missing_file_as_io() {
        let err = load_options(Path::new("/nonexistent/dirwire.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
