//! Loader configuration.
//!
//! Configuration is optional TOML:
//!
//! ```toml
//! min_version = 58
//! max_version = 74
//! preferred_dir = "/opt/icu/lib"
//! extra_search_dirs = ["/srv/icu"]
//! system_dirs = true
//! dll_map = "/etc/icubind/icu.dll.config"
//! ```
//!
//! [`LoaderConfig::from_env`] reads the file named by `ICUBIND_CONFIG` and
//! lets `ICUBIND_ICU4C_DIR` override the preferred directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::version::{MAX_SUPPORTED_ICU_VERSION, MIN_SUPPORTED_ICU_VERSION, VersionRange};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "ICUBIND_CONFIG";

/// Environment variable overriding the preferred ICU directory.
pub const ICU4C_DIR_ENV: &str = "ICUBIND_ICU4C_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
	pub min_version: u32,
	pub max_version: u32,
	pub preferred_dir: Option<PathBuf>,
	/// Overrides the executable directory as the probe base.
	pub base_dir: Option<PathBuf>,
	pub extra_search_dirs: Vec<PathBuf>,
	/// Whether platform system library directories are searched last.
	pub system_dirs: bool,
	pub dll_map: Option<PathBuf>,
}

impl Default for LoaderConfig {
	fn default() -> Self {
		Self {
			min_version: MIN_SUPPORTED_ICU_VERSION,
			max_version: MAX_SUPPORTED_ICU_VERSION,
			preferred_dir: None,
			base_dir: None,
			extra_search_dirs: Vec::new(),
			system_dirs: true,
			dll_map: None,
		}
	}
}

impl LoaderConfig {
	/// Parses TOML source; `origin` is only used in error messages.
	pub fn parse(source: &str, origin: &Path) -> Result<Self> {
		toml::from_str(source).map_err(|error| Error::Config {
			path: origin.to_path_buf(),
			error,
		})
	}

	pub fn load(path: &Path) -> Result<Self> {
		let source = std::fs::read_to_string(path).map_err(|error| Error::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::parse(&source, path)?;
		debug!(path = %path.display(), "loaded loader config");
		Ok(config)
	}

	/// Configuration of the running process.
	pub fn from_env() -> Result<Self> {
		let mut config = match std::env::var_os(CONFIG_ENV) {
			Some(path) if !path.is_empty() => Self::load(Path::new(&path))?,
			_ => Self::default(),
		};
		if let Some(dir) = std::env::var_os(ICU4C_DIR_ENV).filter(|d| !d.is_empty()) {
			config.preferred_dir = Some(PathBuf::from(dir));
		}
		Ok(config)
	}

	/// The configured confinement range.
	pub fn range(&self) -> Result<VersionRange> {
		VersionRange::new(self.min_version, self.max_version)
	}
}
