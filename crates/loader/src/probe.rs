//! Candidate directory enumeration.
//!
//! Produces the ordered list of directories that may hold ICU libraries. Every
//! directory is later scanned, since a higher-priority directory may hold no
//! matching files at all. Missing directories are not an error here.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::platform::{Arch, Platform};

/// Where a search directory came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
	/// Caller-supplied preferred directory.
	Preferred,
	/// Process base directory.
	Base,
	/// `base/lib/<rid><arch>`.
	ArchSubdir,
	/// `base/runtimes/<rid><arch>/native`.
	Runtimes,
	/// Entry of the OS dynamic-library search path.
	SearchPath,
	/// Directory listed in the loader configuration.
	Configured,
	/// Platform system library directory.
	System,
}

/// One directory to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDir {
	pub path: PathBuf,
	pub origin: Origin,
}

/// Raw inputs to directory probing.
#[derive(Debug, Clone, Default)]
pub struct ProbeInputs {
	pub preferred_dir: Option<PathBuf>,
	pub base_dir: Option<PathBuf>,
	pub search_path: Vec<PathBuf>,
	pub extra_dirs: Vec<PathBuf>,
	pub system_dirs: Vec<PathBuf>,
}

impl ProbeInputs {
	/// Inputs of the running process: executable directory, the platform's
	/// search-path variable and its system directories.
	pub fn from_env(platform: Platform, arch: Arch) -> Self {
		let base_dir = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));
		let search_path = std::env::var_os(platform.search_path_var())
			.map(|value| split_search_path(&value))
			.unwrap_or_default();

		Self {
			preferred_dir: None,
			base_dir,
			search_path,
			extra_dirs: Vec::new(),
			system_dirs: platform.system_dirs(arch),
		}
	}
}

/// Splits a search-path variable, dropping empty entries.
pub fn split_search_path(value: &OsStr) -> Vec<PathBuf> {
	std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()).collect()
}

/// Returns the ordered, de-duplicated list of directories to scan.
pub fn candidates(inputs: &ProbeInputs, platform: Platform, arch: Arch) -> Vec<SearchDir> {
	let mut dirs = Vec::new();
	let mut seen = FxHashSet::default();
	let mut push = |path: PathBuf, origin: Origin| {
		if path.as_os_str().is_empty() {
			return;
		}
		let path = std::path::absolute(&path).unwrap_or(path);
		if seen.insert(path.clone()) {
			dirs.push(SearchDir { path, origin });
		}
	};

	if let Some(preferred) = &inputs.preferred_dir {
		push(preferred.clone(), Origin::Preferred);
	}

	if let Some(base) = &inputs.base_dir {
		let arch_dir = format!("{}{}", platform.rid_prefix(), arch.token());
		push(base.clone(), Origin::Base);
		push(base.join("lib").join(&arch_dir), Origin::ArchSubdir);
		push(base.join("runtimes").join(&arch_dir).join("native"), Origin::Runtimes);
	}

	for dir in &inputs.search_path {
		push(dir.clone(), Origin::SearchPath);
	}
	for dir in &inputs.extra_dirs {
		push(dir.clone(), Origin::Configured);
	}
	for dir in &inputs.system_dirs {
		push(dir.clone(), Origin::System);
	}

	dirs
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn origins(dirs: &[SearchDir]) -> Vec<Origin> {
		dirs.iter().map(|d| d.origin).collect()
	}

	#[test]
	fn search_order_follows_priority() {
		let base = PathBuf::from("/opt/app");
		let inputs = ProbeInputs {
			preferred_dir: Some(PathBuf::from("/opt/icu")),
			base_dir: Some(base.clone()),
			search_path: vec![PathBuf::from("/usr/bin")],
			extra_dirs: vec![PathBuf::from("/srv/icu")],
			system_dirs: vec![PathBuf::from("/usr/lib")],
		};

		let dirs = candidates(&inputs, Platform::Windows, Arch::X64);
		assert_eq!(
			origins(&dirs),
			vec![
				Origin::Preferred,
				Origin::Base,
				Origin::ArchSubdir,
				Origin::Runtimes,
				Origin::SearchPath,
				Origin::Configured,
				Origin::System
			]
		);
		assert_eq!(dirs[2].path, std::path::absolute(base.join("lib").join("win-x64")).unwrap());
		assert_eq!(dirs[3].path, std::path::absolute(base.join("runtimes").join("win-x64").join("native")).unwrap());
	}

	#[test]
	fn preferred_directory_is_used_as_is() {
		let inputs = ProbeInputs {
			preferred_dir: Some(PathBuf::from("/opt/icu")),
			..Default::default()
		};
		let dirs = candidates(&inputs, Platform::Linux, Arch::X86);
		assert_eq!(dirs.len(), 1);
		assert_eq!(dirs[0].path, std::path::absolute("/opt/icu").unwrap());
	}

	#[test]
	fn duplicates_keep_first_position() {
		let inputs = ProbeInputs {
			preferred_dir: Some(PathBuf::from("/opt/app")),
			base_dir: Some(PathBuf::from("/opt/app")),
			search_path: vec![PathBuf::from("/opt/app"), PathBuf::from("/usr/lib")],
			system_dirs: vec![PathBuf::from("/usr/lib")],
			..Default::default()
		};
		let dirs = candidates(&inputs, Platform::Linux, Arch::X64);
		assert_eq!(origins(&dirs), vec![Origin::Preferred, Origin::ArchSubdir, Origin::Runtimes, Origin::SearchPath]);
		assert_eq!(dirs[3].path, std::path::absolute("/usr/lib").unwrap());
	}

	#[test]
	fn relative_directories_become_absolute() {
		let inputs = ProbeInputs {
			search_path: vec![PathBuf::from("relative/icu")],
			..Default::default()
		};
		let dirs = candidates(&inputs, Platform::Linux, Arch::X64);
		assert!(dirs[0].path.is_absolute());
	}

	#[test]
	#[serial_test::serial]
	fn process_inputs_come_from_executable_and_search_path_var() {
		let platform = Platform::current();
		let var = platform.search_path_var();
		let saved = std::env::var_os(var);
		let saved_cwd = std::env::current_dir().unwrap();
		let elsewhere = tempfile::tempdir().expect("must create tempdir");
		let joined = std::env::join_paths([PathBuf::from("/opt/icu-a"), PathBuf::from("/opt/icu-b")]).unwrap();
		// SAFETY: serialised with every other test touching process state.
		unsafe { std::env::set_var(var, &joined) };
		std::env::set_current_dir(elsewhere.path()).unwrap();

		let inputs = ProbeInputs::from_env(platform, Arch::current());

		std::env::set_current_dir(&saved_cwd).unwrap();
		// SAFETY: as above.
		unsafe {
			match &saved {
				Some(value) => std::env::set_var(var, value),
				None => std::env::remove_var(var),
			}
		}

		let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
		assert_eq!(inputs.base_dir, Some(exe_dir));
		assert_eq!(inputs.search_path, vec![PathBuf::from("/opt/icu-a"), PathBuf::from("/opt/icu-b")]);
		assert_eq!(inputs.system_dirs, platform.system_dirs(Arch::current()));
		assert_eq!(inputs.preferred_dir, None);
	}

	#[test]
	fn empty_search_path_entries_are_dropped() {
		let joined = std::env::join_paths([PathBuf::from("/a"), PathBuf::new(), PathBuf::from("/b")]).unwrap();
		assert_eq!(split_search_path(&joined), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
	}
}
