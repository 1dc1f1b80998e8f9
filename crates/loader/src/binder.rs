//! Versioned symbol binding.
//!
//! [`SymbolBinder`] owns every open ICU module and a cache of resolved entry
//! points. Modules are keyed by their on-disk path so re-resolving a version
//! never opens the same file twice.

use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace, warn};

use crate::dll_map::DllMap;
use crate::error::{Error, Result};
use crate::platform::{IcuModule, Platform};
use crate::version::IcuVersionInfo;

/// Majors below this use two-digit `X.Y` release numbers, which older
/// releases exported as `name_X_Y`.
const FIRST_MAJOR_ONLY_RELEASE: u32 = 49;

/// Address of a resolved native function.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryPoint(NonNull<c_void>);

// SAFETY: an entry point is a code address; it carries no thread affinity.
unsafe impl Send for EntryPoint {}
// SAFETY: see above.
unsafe impl Sync for EntryPoint {}

impl EntryPoint {
	pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
		NonNull::new(ptr).map(Self)
	}

	pub fn as_ptr(self) -> *mut c_void {
		self.0.as_ptr()
	}

	/// Reinterprets the address as a function pointer type.
	///
	/// # Safety
	///
	/// `F` must be an `extern "C"` function pointer type matching the native
	/// signature, and the module that exported the symbol must still be loaded
	/// whenever the result is called.
	pub unsafe fn cast<F: Copy>(self) -> F {
		assert_eq!(size_of::<F>(), size_of::<*mut c_void>(), "entry points can only be cast to pointer-sized types");
		// SAFETY: sizes match; validity is the caller's contract.
		unsafe { std::mem::transmute_copy(&self.0.as_ptr()) }
	}
}

impl fmt::Debug for EntryPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EntryPoint({:p})", self.0)
	}
}

/// Opens native modules. The production implementation is
/// [`LibloadingLoader`](crate::native::LibloadingLoader).
pub trait ModuleLoader: Send + Sync {
	fn load(&self, path: &Path) -> std::result::Result<Box<dyn NativeModule>, String>;
}

/// An open native module.
pub trait NativeModule: Send + Sync {
	/// Looks up an exported symbol by its exact name.
	fn symbol(&self, name: &str) -> Option<EntryPoint>;

	/// Releases the module. Dropping without calling this also releases it,
	/// but loses the error.
	fn close(self: Box<Self>) -> std::result::Result<(), String>;
}

/// Exported names to try for `name` in ICU `major`, in order.
pub fn symbol_candidates(name: &str, major: u32) -> Vec<String> {
	let mut names = vec![name.to_string(), format!("{name}_{major}")];
	if major < FIRST_MAJOR_ONLY_RELEASE {
		names.push(format!("{name}_{}_{}", major / 10, major % 10));
	}
	names
}

struct OpenModule {
	major: u32,
	module: Box<dyn NativeModule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
	major: u32,
	module: IcuModule,
	name: String,
}

/// Loads ICU modules and resolves versioned entry points.
pub struct SymbolBinder {
	platform: Platform,
	loader: Arc<dyn ModuleLoader>,
	name_map: Option<DllMap>,
	/// Insertion order is load order; releases run newest first.
	modules: IndexMap<PathBuf, OpenModule>,
	cache: FxHashMap<SymbolKey, EntryPoint>,
}

impl fmt::Debug for SymbolBinder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SymbolBinder")
			.field("platform", &self.platform)
			.field("modules", &self.modules.keys().collect::<Vec<_>>())
			.field("cached_symbols", &self.cache.len())
			.finish_non_exhaustive()
	}
}

impl SymbolBinder {
	pub fn new(platform: Platform, loader: Arc<dyn ModuleLoader>) -> Self {
		Self {
			platform,
			loader,
			name_map: None,
			modules: IndexMap::new(),
			cache: FxHashMap::default(),
		}
	}

	/// Consults `map` before the conventional file names.
	pub fn with_name_map(mut self, map: DllMap) -> Self {
		self.name_map = Some(map);
		self
	}

	pub fn platform(&self) -> Platform {
		self.platform
	}

	/// Number of open modules.
	pub fn open_modules(&self) -> usize {
		self.modules.len()
	}

	/// Number of cached entry points.
	pub fn cached_symbols(&self) -> usize {
		self.cache.len()
	}

	/// Resolves `name` in `module` of the given version.
	///
	/// Cached results are returned without touching the module again.
	pub fn bind(&mut self, version: &IcuVersionInfo, directory: &Path, module: IcuModule, name: &str) -> Result<EntryPoint> {
		let key = SymbolKey {
			major: version.major,
			module,
			name: name.to_string(),
		};
		if let Some(entry) = self.cache.get(&key) {
			return Ok(*entry);
		}

		let path = self.load_module(version, directory, module)?;
		let open = &self.modules[&path];
		for candidate in symbol_candidates(name, version.major) {
			if let Some(entry) = open.module.symbol(&candidate) {
				trace!(symbol = %candidate, module = %module, "bound entry point");
				self.cache.insert(key, entry);
				return Ok(entry);
			}
		}

		Err(Error::EntryPointNotFound {
			name: name.to_string(),
			version: version.major,
		})
	}

	/// Opens `module` unless it is already open; returns its path.
	///
	/// The data library of the same directory is preloaded when present, and
	/// the common library is opened before the i18n one.
	pub fn load_module(&mut self, version: &IcuVersionInfo, directory: &Path, module: IcuModule) -> Result<PathBuf> {
		let path = self.library_path(version, directory, module);
		if self.modules.contains_key(&path) {
			return Ok(path);
		}

		match module {
			IcuModule::Common => self.preload_data(version, directory),
			IcuModule::I18n => {
				self.load_module(version, directory, IcuModule::Common)?;
			}
			IcuModule::Data => {}
		}

		if !path.is_file() {
			return Err(Error::LibraryLoadFailed {
				path,
				reason: "file not found".to_string(),
			});
		}

		let loaded = self.loader.load(&path).map_err(|reason| Error::LibraryLoadFailed { path: path.clone(), reason })?;
		debug!(path = %path.display(), module = %module, "opened ICU module");
		self.modules.insert(
			path.clone(),
			OpenModule {
				major: version.major,
				module: loaded,
			},
		);
		Ok(path)
	}

	fn preload_data(&mut self, version: &IcuVersionInfo, directory: &Path) {
		let path = self.library_path(version, directory, IcuModule::Data);
		if self.modules.contains_key(&path) || !path.is_file() {
			return;
		}
		if let Err(error) = self.load_module(version, directory, IcuModule::Data) {
			debug!(%error, "data library preload failed");
		}
	}

	/// Path of `module` inside `directory`.
	///
	/// Order: DllMap target (if mapped, present and not named for another ICU
	/// version), conventional name, then the full-version name when the
	/// conventional one is absent.
	pub fn library_path(&self, version: &IcuVersionInfo, directory: &Path, module: IcuModule) -> PathBuf {
		if let Some(map) = &self.name_map {
			let mapped = map.map_library_name(module.logical_name(), self.platform);
			let mapped_major = self.platform.parse_file_name(module, mapped).map(|v| v.major);
			if mapped != module.logical_name() && mapped_major.is_none_or(|major| major == version.major) {
				let path = directory.join(mapped);
				if path.is_file() {
					return path;
				}
				debug!(mapped, module = %module, "mapped library missing, using conventional name");
			} else if mapped_major.is_some() {
				debug!(mapped, module = %module, version = version.major, "mapped library is another ICU version, ignoring");
			}
		}

		let conventional = directory.join(self.platform.file_name(module, version.major));
		if !conventional.is_file()
			&& let Some(full) = &version.full
			&& let Some(name) = self.platform.full_file_name(module, full)
		{
			let path = directory.join(name);
			if path.is_file() {
				return path;
			}
		}
		conventional
	}

	/// Closes every module of `major` and drops its cached entry points.
	pub fn release_version(&mut self, major: u32) {
		let paths: Vec<PathBuf> = self.modules.iter().rev().filter(|(_, open)| open.major == major).map(|(path, _)| path.clone()).collect();
		for path in paths {
			if let Some(open) = self.modules.shift_remove(&path) {
				close_module(&path, open);
			}
		}
		self.cache.retain(|key, _| key.major != major);
	}

	/// Closes every module, newest first, and clears the cache.
	///
	/// Failures are logged and do not stop the remaining releases.
	pub fn release_all(&mut self) {
		if !self.modules.is_empty() {
			info!(modules = self.modules.len(), "releasing ICU modules");
		}
		while let Some((path, open)) = self.modules.pop() {
			close_module(&path, open);
		}
		self.cache.clear();
	}
}

fn close_module(path: &Path, open: OpenModule) {
	if let Err(reason) = open.module.close() {
		warn!(path = %path.display(), %reason, "failed to release ICU module");
	}
}
