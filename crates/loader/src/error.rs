//! Error types for ICU resolution and binding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating, loading or binding ICU.
#[derive(Debug, Error)]
pub enum Error {
	/// No discovered ICU version falls inside the active confinement range.
	#[error("no usable ICU version in range [{min}, {max}] ({searched} directories searched)")]
	NoUsableIcuVersion {
		/// Lower bound of the active range.
		min: u32,
		/// Upper bound of the active range.
		max: u32,
		/// Number of directories that were scanned.
		searched: usize,
	},

	/// The library file was found but the OS loader refused it.
	#[error("failed to load {}: {reason}", path.display())]
	LibraryLoadFailed {
		/// Path of the library that failed to load.
		path: PathBuf,
		/// Loader-provided reason.
		reason: String,
	},

	/// The library loaded but does not export the requested function.
	#[error("entry point {name} not found for ICU {version}")]
	EntryPointNotFound {
		/// Logical (unversioned) name of the entry point.
		name: String,
		/// Major version that was searched.
		version: u32,
	},

	/// A confinement range with `min > max`.
	#[error("invalid ICU version range [{min}, {max}]")]
	InvalidConfinementRange {
		/// Requested lower bound.
		min: u32,
		/// Requested upper bound.
		max: u32,
	},

	/// Error reading a file.
	#[error("I/O error reading {}: {error}", path.display())]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing the loader configuration.
	#[error("invalid loader config {}: {error}", path.display())]
	Config {
		/// Path of the configuration file.
		path: PathBuf,
		/// The TOML parse error.
		error: toml::de::Error,
	},

	/// Error parsing a DllMap file.
	#[error("DllMap parse error: {0}")]
	DllMap(String),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;
