//! OS loader backed by `libloading`.

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::binder::{EntryPoint, ModuleLoader, NativeModule};

/// Opens modules with the platform dynamic loader.
///
/// On Windows, libraries are opened with `LOAD_WITH_ALTERED_SEARCH_PATH` so
/// their own dependencies (`icudt`, `icuuc`) resolve from the library's
/// directory rather than the process directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibloadingLoader;

impl ModuleLoader for LibloadingLoader {
	fn load(&self, path: &Path) -> Result<Box<dyn NativeModule>, String> {
		// SAFETY: ICU libraries run no initialisers with preconditions on the
		// loading thread.
		let library = unsafe { open(path) }.map_err(|e| e.to_string())?;
		Ok(Box::new(LoadedLibrary {
			library,
			path: path.to_path_buf(),
		}))
	}
}

#[cfg(windows)]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
	use libloading::os::windows::{LOAD_WITH_ALTERED_SEARCH_PATH, Library as WinLibrary};

	// SAFETY: forwarded from the caller.
	unsafe { WinLibrary::load_with_flags(path, LOAD_WITH_ALTERED_SEARCH_PATH) }.map(Library::from)
}

#[cfg(not(windows))]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
	// SAFETY: forwarded from the caller.
	unsafe { Library::new(path) }
}

struct LoadedLibrary {
	library: Library,
	path: PathBuf,
}

impl NativeModule for LoadedLibrary {
	fn symbol(&self, name: &str) -> Option<EntryPoint> {
		// SAFETY: only the address is read; the signature is asserted later by
		// whoever casts the entry point.
		let symbol: Symbol<'_, unsafe extern "C" fn()> = unsafe { self.library.get(name.as_bytes()) }.ok()?;
		EntryPoint::from_raw(*symbol as *mut c_void)
	}

	fn close(self: Box<Self>) -> Result<(), String> {
		let LoadedLibrary { library, path } = *self;
		library.close().map_err(|e| format!("{}: {e}", path.display()))
	}
}
