//! Version identifiers and confinement ranges.

use std::fmt;

use crate::error::{Error, Result};

/// Lowest ICU major version the binder knows how to name-mangle for.
pub const MIN_SUPPORTED_ICU_VERSION: u32 = 44;

/// Highest ICU major version the binder knows how to name-mangle for.
pub const MAX_SUPPORTED_ICU_VERSION: u32 = 80;

/// One discovered or selected ICU release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IcuVersionInfo {
	pub major: u32,
	/// Dotted version when the file name carries one, e.g. `62.1`.
	pub full: Option<String>,
}

impl IcuVersionInfo {
	pub fn new(major: u32) -> Self {
		Self { major, full: None }
	}

	pub fn with_full(major: u32, full: impl Into<String>) -> Self {
		Self { major, full: Some(full.into()) }
	}
}

impl fmt::Display for IcuVersionInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.full {
			Some(full) => f.write_str(full),
			None => write!(f, "{}", self.major),
		}
	}
}

/// Inclusive range of acceptable ICU major versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
	min: u32,
	max: u32,
}

impl VersionRange {
	/// Builds `[min, max]`, rejecting `min > max`.
	pub fn new(min: u32, max: u32) -> Result<Self> {
		if min > max {
			return Err(Error::InvalidConfinementRange { min, max });
		}
		Ok(Self { min, max })
	}

	pub const fn exact(version: u32) -> Self {
		Self { min: version, max: version }
	}

	/// Every version the binder supports.
	pub const fn supported() -> Self {
		Self {
			min: MIN_SUPPORTED_ICU_VERSION,
			max: MAX_SUPPORTED_ICU_VERSION,
		}
	}

	pub const fn min(&self) -> u32 {
		self.min
	}

	pub const fn max(&self) -> u32 {
		self.max
	}

	pub const fn contains(&self, major: u32) -> bool {
		major >= self.min && major <= self.max
	}
}

impl Default for VersionRange {
	fn default() -> Self {
		Self::supported()
	}
}

impl fmt::Display for VersionRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.min, self.max)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_inverted_range() {
		let err = VersionRange::new(62, 58).unwrap_err();
		assert!(matches!(err, Error::InvalidConfinementRange { min: 62, max: 58 }));
	}

	#[test]
	fn range_bounds_are_inclusive() {
		let range = VersionRange::new(58, 62).unwrap();
		assert!(range.contains(58));
		assert!(range.contains(62));
		assert!(!range.contains(57));
		assert!(!range.contains(63));
		assert!(VersionRange::exact(59).contains(59));
	}

	#[test]
	fn display_prefers_full_version() {
		assert_eq!(IcuVersionInfo::new(62).to_string(), "62");
		assert_eq!(IcuVersionInfo::with_full(62, "62.1").to_string(), "62.1");
	}
}
