//! Discovery of installed ICU versions.
//!
//! Only the common library is inspected since it carries the version in every
//! naming convention.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::platform::{IcuModule, Platform};
use crate::probe::{Origin, SearchDir};
use crate::version::IcuVersionInfo;

/// A version found in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
	pub version: IcuVersionInfo,
	pub directory: PathBuf,
	pub origin: Origin,
	/// Position of the directory in probe order.
	pub rank: usize,
}

/// Scans `dir` (non-recursively) for ICU common libraries.
///
/// Results are ordered highest major first with one entry per major; an entry
/// carrying a full version is preferred over a bare one. Unreadable or missing
/// directories yield an empty list.
pub fn scan(platform: Platform, dir: &Path) -> Vec<IcuVersionInfo> {
	let entries = match std::fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(error) => {
			trace!(dir = %dir.display(), %error, "skipping directory");
			return Vec::new();
		}
	};

	let mut found: Vec<IcuVersionInfo> = entries
		.flatten()
		.filter_map(|entry| {
			let name = entry.file_name();
			platform.parse_file_name(IcuModule::Common, name.to_str()?)
		})
		.collect();

	found.sort_by(|a, b| b.major.cmp(&a.major).then_with(|| b.full.is_some().cmp(&a.full.is_some())).then_with(|| a.full.cmp(&b.full)));
	found.dedup_by_key(|v| v.major);

	if !found.is_empty() {
		debug!(
			dir = %dir.display(),
			versions = ?found.iter().map(|v| v.major).collect::<Vec<_>>(),
			"found ICU libraries"
		);
	}
	found
}

/// Scans every directory in probe order.
pub fn discover(platform: Platform, dirs: &[SearchDir]) -> Vec<Discovered> {
	dirs.iter()
		.enumerate()
		.flat_map(|(rank, dir)| {
			scan(platform, &dir.path).into_iter().map(move |version| Discovered {
				version,
				directory: dir.path.clone(),
				origin: dir.origin,
				rank,
			})
		})
		.collect()
}
