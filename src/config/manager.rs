use crate::config::models::ClientConfig;
use crate::constants;
use crate::error::Error;
use crate::fs::{FileSystem, OsFileSystem};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads and saves the client configuration.
pub struct ConfigManager<F: FileSystem> {
    fs: F,
    config_dir: PathBuf,
}

impl ConfigManager<OsFileSystem> {
    /// Creates a new `ConfigManager` with the default filesystem and config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, Error> {
        let config_dir = get_config_dir()?;
        Ok(Self {
            fs: OsFileSystem,
            config_dir,
        })
    }
}

impl<F: FileSystem> ConfigManager<F> {
    pub const fn with_fs(fs: F, config_dir: PathBuf) -> Self {
        Self { fs, config_dir }
    }

    /// Get the configuration directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILENAME)
    }

    /// Loads `config.toml`, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load_config(&self) -> Result<ClientConfig, Error> {
        let config_path = self.config_path();
        if !self.fs.exists(&config_path) {
            debug!(
                target: "restwire::config",
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = self.fs.read_to_string(&config_path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", config_path.display())))
    }

    /// Loads the configuration and applies `RESTWIRE_BASE_URL` and
    /// `RESTWIRE_TIMEOUT_SECS` on top of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or an override is not a
    /// valid value.
    pub fn load_effective_config(&self) -> Result<ClientConfig, Error> {
        let mut config = self.load_config()?;
        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Saves the configuration to `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written.
    pub fn save_config(&self, config: &ClientConfig) -> Result<(), Error> {
        // Ensure config directory exists
        self.fs.create_dir_all(&self.config_dir)?;

        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        self.fs.write_all(&self.config_path(), content.as_bytes())?;
        Ok(())
    }
}

/// Applies environment overrides to a loaded configuration.
///
/// # Errors
///
/// Returns an error if `RESTWIRE_TIMEOUT_SECS` is not a whole number.
pub fn apply_env_overrides(config: &mut ClientConfig) -> Result<(), Error> {
    if let Ok(base_url) = std::env::var(constants::ENV_RESTWIRE_BASE_URL) {
        if !base_url.is_empty() {
            config.base_url = Some(base_url);
        }
    }
    if let Ok(timeout) = std::env::var(constants::ENV_RESTWIRE_TIMEOUT_SECS) {
        config.default_timeout_secs = timeout.trim().parse().map_err(|_| {
            Error::Config(format!(
                "{} must be a whole number of seconds, got '{timeout}'",
                constants::ENV_RESTWIRE_TIMEOUT_SECS
            ))
        })?;
    }
    Ok(())
}

/// Gets the configuration directory: `RESTWIRE_CONFIG_DIR` when set,
/// otherwise `~/.config/restwire`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf, Error> {
    if let Ok(dir) = std::env::var(constants::ENV_RESTWIRE_CONFIG_DIR) {
        let expanded = shellexpand::tilde(&dir).into_owned();
        return Ok(PathBuf::from(expanded));
    }
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::Config("Could not determine the home directory".to_string()))?;
    Ok(home_dir.join(".config").join(constants::CONFIG_DIR_NAME))
}
