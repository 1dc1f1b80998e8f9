//! In-process stand-in for the OS loader.
//!
//! Library files are empty placeholders; the fake recognises them by name and
//! hands out real `extern "C"` functions so callers can invoke what they bind.
//! A file whose contents start with `broken` refuses to load.

use std::cell::Cell;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::binder::{EntryPoint, ModuleLoader, NativeModule};
use crate::platform::{IcuModule, Platform};

thread_local! {
	static CLEANUPS: Cell<usize> = const { Cell::new(0) };
}

/// Number of `u_cleanup` calls made on the current thread.
pub(crate) fn cleanup_calls() -> usize {
	CLEANUPS.with(Cell::get)
}

/// Creates placeholder common, i18n and data libraries for `major`.
pub(crate) fn touch_install(dir: &Path, platform: Platform, major: u32) {
	std::fs::create_dir_all(dir).expect("must create install dir");
	for module in [IcuModule::Common, IcuModule::I18n, IcuModule::Data] {
		std::fs::write(dir.join(platform.file_name(module, major)), b"").expect("must create library file");
	}
}

fn write_version(out: *mut u8, version: [u8; 4]) {
	// SAFETY: ICU's UVersionInfo is a 4-byte out array.
	unsafe { std::ptr::copy_nonoverlapping(version.as_ptr(), out, version.len()) }
}

fn entry(f: extern "C" fn(*mut u8)) -> EntryPoint {
	EntryPoint::from_raw(f as *mut c_void).expect("function pointers are non-null")
}

extern "C" fn u_cleanup() {
	CLEANUPS.with(|c| c.set(c.get() + 1));
}

extern "C" fn ucol_open() {}

macro_rules! fake_versions {
	($($major:literal => $icu:expr, $unicode:expr;)*) => {
		/// `u_getVersion` and `u_getUnicodeVersion` of a fake release.
		fn version_entries(major: u32) -> Option<(EntryPoint, EntryPoint)> {
			match major {
				$($major => {
					extern "C" fn get_version(out: *mut u8) {
						write_version(out, $icu)
					}
					extern "C" fn get_unicode_version(out: *mut u8) {
						write_version(out, $unicode)
					}
					Some((entry(get_version), entry(get_unicode_version)))
				})*
				_ => None,
			}
		}
	};
}

fake_versions! {
	44 => [4, 4, 2, 0], [5, 2, 0, 0];
	58 => [58, 2, 0, 0], [9, 0, 0, 0];
	59 => [59, 1, 0, 0], [9, 0, 0, 0];
	62 => [62, 1, 0, 0], [11, 0, 0, 0];
	63 => [63, 1, 0, 0], [11, 0, 0, 0];
}

#[derive(Debug, Default)]
struct Record {
	loads: Vec<PathBuf>,
	closes: Vec<PathBuf>,
	lookups: usize,
}

/// Loader double that records every load, close and symbol lookup.
pub(crate) struct FakeLoader {
	platform: Platform,
	legacy: bool,
	fail_close: bool,
	record: Arc<Mutex<Record>>,
}

impl FakeLoader {
	pub(crate) fn new(platform: Platform) -> Self {
		Self {
			platform,
			legacy: false,
			fail_close: false,
			record: Arc::default(),
		}
	}

	/// Exports `name_X_Y` instead of `name_NN`.
	pub(crate) fn legacy_names(mut self) -> Self {
		self.legacy = true;
		self
	}

	/// Every close reports an error (after recording it).
	pub(crate) fn failing_close(mut self) -> Self {
		self.fail_close = true;
		self
	}

	pub(crate) fn load_count(&self) -> usize {
		self.record.lock().loads.len()
	}

	pub(crate) fn loads(&self) -> Vec<PathBuf> {
		self.record.lock().loads.clone()
	}

	pub(crate) fn closed(&self) -> Vec<PathBuf> {
		self.record.lock().closes.clone()
	}

	pub(crate) fn lookups(&self) -> usize {
		self.record.lock().lookups
	}

	fn symbols(&self, module: IcuModule, major: u32) -> FxHashMap<String, EntryPoint> {
		let suffix = if self.legacy {
			format!("_{}_{}", major / 10, major % 10)
		} else {
			format!("_{major}")
		};

		let mut symbols = FxHashMap::default();
		match module {
			IcuModule::Common => {
				if let Some((version, unicode)) = version_entries(major) {
					symbols.insert(format!("u_getVersion{suffix}"), version);
					symbols.insert(format!("u_getUnicodeVersion{suffix}"), unicode);
				}
				let cleanup = EntryPoint::from_raw(u_cleanup as extern "C" fn() as *mut c_void).expect("non-null");
				symbols.insert(format!("u_cleanup{suffix}"), cleanup);
			}
			IcuModule::I18n => {
				let open = EntryPoint::from_raw(ucol_open as extern "C" fn() as *mut c_void).expect("non-null");
				symbols.insert(format!("ucol_open{suffix}"), open);
			}
			IcuModule::Data => {}
		}
		symbols
	}
}

impl ModuleLoader for FakeLoader {
	fn load(&self, path: &Path) -> Result<Box<dyn NativeModule>, String> {
		let contents = std::fs::read(path).map_err(|e| e.to_string())?;
		if contents.starts_with(b"broken") {
			return Err(format!("{}: broken image", path.display()));
		}

		let name = path.file_name().and_then(|n| n.to_str()).ok_or("unnamed library")?;
		let (module, major) = [IcuModule::Common, IcuModule::I18n, IcuModule::Data]
			.into_iter()
			.find_map(|m| self.platform.parse_file_name(m, name).map(|v| (m, v.major)))
			.ok_or_else(|| format!("{name}: not an ICU library"))?;

		self.record.lock().loads.push(path.to_path_buf());
		Ok(Box::new(FakeModule {
			path: path.to_path_buf(),
			symbols: self.symbols(module, major),
			record: self.record.clone(),
			fail_close: self.fail_close,
		}))
	}
}

struct FakeModule {
	path: PathBuf,
	symbols: FxHashMap<String, EntryPoint>,
	record: Arc<Mutex<Record>>,
	fail_close: bool,
}

impl NativeModule for FakeModule {
	fn symbol(&self, name: &str) -> Option<EntryPoint> {
		self.record.lock().lookups += 1;
		self.symbols.get(name).copied()
	}

	fn close(self: Box<Self>) -> Result<(), String> {
		self.record.lock().closes.push(self.path.clone());
		if self.fail_close {
			return Err(format!("{}: still in use", self.path.display()));
		}
		Ok(())
	}
}
