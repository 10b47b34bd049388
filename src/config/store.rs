//! Versioned persistence of the slider configuration.
//!
//! The slider treats storage as a plain record store: it loads the record once
//! at boot and writes it back after every accepted configuration update.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

use super::SliderConfig;

/// Layout version of [`StoredSettings`]. Bump when fields change meaning.
pub const SETTINGS_VERSION: u32 = 1;

/// The record written to persistent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    /// Layout version the record was written with.
    pub version: u32,
    /// Slider calibration.
    pub slider: SliderConfig,
}

impl StoredSettings {
    /// Wrap a configuration in a record of the current version.
    pub fn current(slider: SliderConfig) -> Self {
        Self {
            version: SETTINGS_VERSION,
            slider,
        }
    }
}

/// Backing storage for [`StoredSettings`].
pub trait SettingsStore {
    /// Read the stored record, `Ok(None)` if nothing has been written yet.
    ///
    /// A corrupt record is reported as an error.
    fn load(&mut self) -> Result<Option<StoredSettings>>;

    /// Write the record, replacing whatever was stored.
    fn save(&mut self, settings: &StoredSettings) -> Result<()>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for &mut S {
    fn load(&mut self) -> Result<Option<StoredSettings>> {
        (**self).load()
    }

    fn save(&mut self, settings: &StoredSettings) -> Result<()> {
        (**self).save(settings)
    }
}

/// Load the slider configuration, falling back to compiled-in defaults.
///
/// A missing record, a version mismatch, an unreadable record or one that
/// fails [`SliderConfig::validate`] all yield [`SliderConfig::default`]; none
/// of them is fatal.
pub fn load_settings<S: SettingsStore>(store: &mut S) -> SliderConfig {
    match store.load() {
        Ok(Some(record)) if record.version == SETTINGS_VERSION => match record.slider.validate() {
            Ok(()) => {
                info!("Reloading camera slider settings");
                record.slider
            }
            Err(_) => {
                warn!("Stored settings hold invalid values, using defaults");
                SliderConfig::default()
            }
        },
        Ok(Some(record)) => {
            warn!(
                "Settings version {} does not match {}, using defaults",
                record.version,
                SETTINGS_VERSION
            );
            SliderConfig::default()
        }
        Ok(None) => {
            info!("No stored settings, using defaults");
            SliderConfig::default()
        }
        Err(_) => {
            warn!("Stored settings unreadable, using defaults");
            SliderConfig::default()
        }
    }
}

/// Check a record's version.
///
/// # Errors
///
/// Returns `ConfigError::UnsupportedVersion` when it differs from
/// [`SETTINGS_VERSION`].
pub fn check_version(record: &StoredSettings) -> Result<()> {
    if record.version == SETTINGS_VERSION {
        Ok(())
    } else {
        Err(Error::Config(ConfigError::UnsupportedVersion {
            found: record.version,
            expected: SETTINGS_VERSION,
        }))
    }
}

/// RAM-backed store.
///
/// Survives for as long as the value lives; used by tests to simulate a
/// reboot and by boards without non-volatile storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Option<StoredSettings>,
    writes: u32,
}

impl MemoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            record: None,
            writes: 0,
        }
    }

    /// Create a store that already holds a record.
    pub fn with_record(record: StoredSettings) -> Self {
        Self {
            record: Some(record),
            writes: 0,
        }
    }

    /// The stored record, if any.
    pub fn record(&self) -> Option<&StoredSettings> {
        self.record.as_ref()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl SettingsStore for MemoryStore {
    fn load(&mut self) -> Result<Option<StoredSettings>> {
        Ok(self.record.clone())
    }

    fn save(&mut self, settings: &StoredSettings) -> Result<()> {
        self.record = Some(settings.clone());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(feature = "std")]
pub use file::{parse_settings, TomlFileStore};

#[cfg(feature = "std")]
mod file {
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::error::{ConfigError, Error, Result};

    use super::{SettingsStore, StoredSettings};

    /// Settings stored as a TOML file.
    #[derive(Debug, Clone)]
    pub struct TomlFileStore {
        path: PathBuf,
    }

    impl TomlFileStore {
        /// Create a store backed by `path`. The file need not exist yet.
        pub fn new<P: AsRef<Path>>(path: P) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// Path of the backing file.
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    /// Parse a settings record from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse_settings(content: &str) -> Result<StoredSettings> {
        toml::from_str(content).map_err(|e| {
            let msg = heapless::String::try_from(e.message()).unwrap_or_default();
            Error::Config(ConfigError::ParseError(msg))
        })
    }

    fn io_error(e: std::io::Error) -> Error {
        let text = e.to_string();
        let msg = heapless::String::try_from(text.as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    }

    impl SettingsStore for TomlFileStore {
        fn load(&mut self) -> Result<Option<StoredSettings>> {
            let content = match fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(io_error(e)),
            };

            parse_settings(&content).map(Some)
        }

        fn save(&mut self, settings: &StoredSettings) -> Result<()> {
            let content = toml::to_string(settings).map_err(|e| {
                let text = e.to_string();
                let msg = heapless::String::try_from(text.as_str()).unwrap_or_default();
                Error::Config(ConfigError::ParseError(msg))
            })?;

            fs::write(&self.path, content).map_err(io_error)
        }
    }
}
