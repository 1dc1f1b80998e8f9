//! Version selection policy.
//!
//! Ranking, first match wins:
//! 1. the previously bound version, while it still satisfies the range;
//! 2. the highest in-range version of the preferred directory;
//! 3. the highest in-range version anywhere;
//! 4. equal majors fall back to probe order.

use std::path::{Path, PathBuf};

use crate::catalog::Discovered;
use crate::error::{Error, Result};
use crate::probe::Origin;
use crate::version::{IcuVersionInfo, VersionRange};

/// A version that was bound before the current resolution started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Previous<'a> {
	pub version: &'a IcuVersionInfo,
	pub directory: &'a Path,
}

/// A selectable version and the directory holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
	pub version: IcuVersionInfo,
	pub directory: PathBuf,
}

/// All in-range candidates, best first.
pub fn rank(discovered: &[Discovered], range: VersionRange, previous: Option<Previous<'_>>) -> Vec<Candidate> {
	let mut in_range: Vec<&Discovered> = discovered.iter().filter(|d| range.contains(d.version.major)).collect();

	in_range.sort_by(|a, b| {
		let a_prev = is_previous(a, previous.as_ref());
		let b_prev = is_previous(b, previous.as_ref());
		let a_pref = a.origin == Origin::Preferred;
		let b_pref = b.origin == Origin::Preferred;
		b_prev
			.cmp(&a_prev)
			.then_with(|| b_pref.cmp(&a_pref))
			.then_with(|| b.version.major.cmp(&a.version.major))
			.then_with(|| a.rank.cmp(&b.rank))
	});

	let mut ranked: Vec<Candidate> = in_range
		.into_iter()
		.map(|d| Candidate {
			version: d.version.clone(),
			directory: d.directory.clone(),
		})
		.collect();

	// A bound version no longer on disk is still loaded and usable.
	if let Some(prev) = previous
		&& range.contains(prev.version.major)
		&& !ranked.first().is_some_and(|c| c.version.major == prev.version.major && c.directory == prev.directory)
	{
		ranked.insert(
			0,
			Candidate {
				version: prev.version.clone(),
				directory: prev.directory.to_path_buf(),
			},
		);
	}

	ranked
}

/// Picks exactly one version, or fails with [`Error::NoUsableIcuVersion`].
pub fn select(discovered: &[Discovered], range: VersionRange, previous: Option<Previous<'_>>, searched: usize) -> Result<Candidate> {
	rank(discovered, range, previous).into_iter().next().ok_or(Error::NoUsableIcuVersion {
		min: range.min(),
		max: range.max(),
		searched,
	})
}

fn is_previous(d: &Discovered, previous: Option<&Previous<'_>>) -> bool {
	previous.is_some_and(|p| p.version.major == d.version.major && p.directory == d.directory)
}
