//! Engine configuration.
//!
//! Only the storage root is required; everything else has a default. Values
//! come either from CLI arguments or from `CASEFILE_*` environment variables.

use anyhow::{Context, Result, bail};

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the storage root.
pub const ENV_STORAGE_ROOT: &str = "CASEFILE_STORAGE_ROOT";

/// Environment variable holding the compression level.
pub const ENV_COMPRESSION: &str = "CASEFILE_COMPRESSION";

/// Environment variable holding the stale temp file age in seconds.
pub const ENV_STALE_TEMP_SECS: &str = "CASEFILE_STALE_TEMP_SECS";

/// Default age after which leftover temp files are swept.
pub const DEFAULT_STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Compression level for the merged PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Write streams as they are.
    #[default]
    None,
    /// Flate-compress uncompressed streams.
    Standard,
}

impl CompressionLevel {
    /// Whether streams get compressed before writing.
    pub fn compresses(&self) -> bool {
        matches!(self, Self::Standard)
    }
}

impl FromStr for CompressionLevel {
    type Err = anyhow::Error;

    /// Parse `"none"` or `"standard"`, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            _ => bail!("Invalid compression level: {s}. Must be one of: none, standard"),
        }
    }
}

/// Configuration shared by every inspection and merge.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that holds uploads, temp files and merged outputs.
    pub storage_root: PathBuf,

    /// Compression applied to merged outputs.
    pub compression: CompressionLevel,

    /// Temp and staging files older than this are removed by a sweep.
    pub stale_temp_age: Duration,
}

impl Config {
    /// Configuration with defaults for everything but the storage root.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            compression: CompressionLevel::default(),
            stale_temp_age: DEFAULT_STALE_TEMP_AGE,
        }
    }

    /// Read the configuration from `CASEFILE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage root is unset or an optional value
    /// does not parse.
    pub fn from_env() -> Result<Self> {
        let storage_root = std::env::var(ENV_STORAGE_ROOT)
            .with_context(|| format!("{ENV_STORAGE_ROOT} must be set"))?;
        let mut config = Self::new(storage_root);

        if let Ok(value) = std::env::var(ENV_COMPRESSION) {
            config.compression = value
                .parse()
                .with_context(|| format!("Invalid {ENV_COMPRESSION}"))?;
        }

        if let Ok(value) = std::env::var(ENV_STALE_TEMP_SECS) {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_STALE_TEMP_SECS}: {value}"))?;
            config.stale_temp_age = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage root does not exist or is not a
    /// directory.
    pub fn validate(&self) -> Result<()> {
        let metadata = std::fs::metadata(&self.storage_root).with_context(|| {
            format!(
                "Storage root is not accessible: {}",
                self.storage_root.display()
            )
        })?;

        if !metadata.is_dir() {
            bail!(
                "Storage root is not a directory: {}",
                self.storage_root.display()
            );
        }

        Ok(())
    }
}
