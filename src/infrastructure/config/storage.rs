//! Locating, reading and seeding the TOML configuration file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while handling the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform exposes no per-user configuration directory.
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    /// Reading the file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Writing the default file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Defaults could not be rendered as TOML.
    #[error("failed to render default configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// The configuration file backing an [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Uses `explicit` when given, otherwise `config.toml` in the platform
    /// configuration directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if no path was given and the
    /// platform has no configuration directory.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::at(path));
        }
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(dirs.config_dir().join(CONFIG_FILE_NAME)))
    }

    /// Wraps a concrete file path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration.
    ///
    /// A missing file is seeded with the defaults. A file that does not
    /// parse is left untouched and the defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read, or if
    /// seeding the defaults fails.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.seed_defaults();
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        toml::from_str(&content).or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring malformed config file");
            Ok(AppConfig::default())
        })
    }

    fn seed_defaults(&self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config)?;
        self.write_atomically(rendered.as_bytes())
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        info!(path = %self.path.display(), "Wrote default configuration");
        Ok(config)
    }

    /// Replaces the file through a sibling temp file so readers never see
    /// a partial write.
    fn write_atomically(&self, bytes: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(bytes)?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), size = bytes.len(), "Persisted config file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_seeded_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let file = ConfigFile::at(&path);

        let config = file.load().unwrap();
        assert!(config.http_cache.enabled);
        assert!(path.exists());

        let reloaded = file.load().unwrap();
        assert_eq!(reloaded.loader.request_timeout_secs, 10);
    }

    #[test]
    fn test_malformed_file_falls_back_and_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "invalid_toml = [").unwrap();

        let config = ConfigFile::at(&path).load().unwrap();
        assert!(config.http_cache.enabled);
        assert_eq!(fs::read_to_string(&path).unwrap(), "invalid_toml = [");
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "[memory_cache]\nmax_entries = 7\n").unwrap();

        let file = ConfigFile::resolve(Some(&custom)).unwrap();
        assert_eq!(file.path(), custom.as_path());
        assert_eq!(file.load().unwrap().memory_cache.max_entries, 7);
    }

    #[test]
    fn test_unreadable_path_is_an_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be read as a file.
        let err = ConfigFile::at(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
