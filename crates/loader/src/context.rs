//! ICU lifecycle management.
//!
//! [`IcuContext`] owns the active binding: the selected version, its
//! directory, the confinement range, the preferred directory and every open
//! module. All of it sits behind one lock that covers the whole
//! resolve-or-reuse decision, so concurrent first uses observe a single
//! resolution.
//!
//! Resolution is lazy. Narrowing the range away from the bound version only
//! marks the binding for re-resolution on the next use, and a failed
//! re-resolution keeps the old binding in place.
//!
//! Entry points handed out stay valid until [`IcuContext::cleanup`] or a
//! version switch. Not calling either while other threads still use entry
//! points is the caller's responsibility.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::binder::{EntryPoint, ModuleLoader, SymbolBinder};
use crate::catalog;
use crate::config::LoaderConfig;
use crate::dll_map::DllMap;
use crate::error::{Error, Result};
use crate::platform::{Arch, IcuModule, Platform};
use crate::probe::{self, ProbeInputs};
use crate::select::{self, Previous};
use crate::table::format_version;
use crate::version::{IcuVersionInfo, VersionRange};

/// The version a context is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBinding {
	pub version: IcuVersionInfo,
	pub directory: PathBuf,
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	/// Nothing bound; the next use resolves.
	Uninitialized,
	/// Bound to a version satisfying the current range.
	Bound,
	/// Bound, but the range changed; the next use resolves again.
	PendingResolve,
}

struct State {
	range: VersionRange,
	preferred_dir: Option<PathBuf>,
	inputs: ProbeInputs,
	binder: SymbolBinder,
	active: Option<ActiveBinding>,
}

/// Resolution context for one set of ICU libraries.
///
/// A process normally has exactly one active context (see
/// [`wrapper`](crate::wrapper)); separate instances are useful with loaders
/// that do not share process-wide state, such as test doubles.
pub struct IcuContext {
	platform: Platform,
	arch: Arch,
	state: Mutex<State>,
}

impl IcuContext {
	/// Context over `inputs`, confined to every supported version.
	///
	/// `inputs.preferred_dir` seeds the preferred directory.
	pub fn new(loader: Arc<dyn ModuleLoader>, inputs: ProbeInputs) -> Self {
		let platform = Platform::current();
		Self::build(platform, Arch::current(), SymbolBinder::new(platform, loader), inputs, VersionRange::supported())
	}

	/// Context of the running process as described by `config`.
	pub fn from_config(config: &LoaderConfig, loader: Arc<dyn ModuleLoader>) -> Result<Self> {
		let platform = Platform::current();
		let arch = Arch::current();
		let range = config.range()?;

		let mut inputs = ProbeInputs::from_env(platform, arch);
		inputs.preferred_dir = config.preferred_dir.clone();
		if let Some(base) = &config.base_dir {
			inputs.base_dir = Some(base.clone());
		}
		inputs.extra_dirs = config.extra_search_dirs.clone();
		if !config.system_dirs {
			inputs.system_dirs.clear();
		}

		let mut binder = SymbolBinder::new(platform, loader);
		if let Some(path) = &config.dll_map {
			binder = binder.with_name_map(DllMap::load(path)?);
		}

		Ok(Self::build(platform, arch, binder, inputs, range))
	}

	fn build(platform: Platform, arch: Arch, binder: SymbolBinder, inputs: ProbeInputs, range: VersionRange) -> Self {
		Self {
			platform,
			arch,
			state: Mutex::new(State {
				range,
				preferred_dir: inputs.preferred_dir.clone(),
				inputs,
				binder,
				active: None,
			}),
		}
	}

	/// Binds ICU unless already bound to a version inside the range.
	pub fn init(&self) -> Result<ActiveBinding> {
		self.state.lock().ensure_bound(self.platform, self.arch)
	}

	/// Releases every module and forgets the active binding.
	///
	/// Calls ICU's `u_cleanup` first when it is available. Never fails:
	/// release errors are logged. The range and preferred directory are kept.
	pub fn cleanup(&self) {
		let mut state = self.state.lock();
		if let Some(active) = state.active.take() {
			shutdown_icu(&mut state.binder, &active);
			info!(version = %active.version, "ICU cleaned up");
		}
		state.binder.release_all();
	}

	/// Restricts acceptable versions to `[min, max]`.
	///
	/// An invalid range leaves every piece of state untouched. A bound version
	/// outside the new range is replaced on next use.
	pub fn confine_icu_versions(&self, min: u32, max: u32) -> Result<()> {
		let range = VersionRange::new(min, max)?;
		self.confine(range);
		Ok(())
	}

	/// Restricts acceptable versions to exactly `version`.
	pub fn confine_icu_version(&self, version: u32) {
		self.confine(VersionRange::exact(version));
	}

	fn confine(&self, range: VersionRange) {
		let mut state = self.state.lock();
		state.range = range;
		if let Some(active) = &state.active
			&& !range.contains(active.version.major)
		{
			debug!(bound = active.version.major, %range, "bound ICU outside new range, resolving on next use");
		}
	}

	/// Sets the directory searched before all others. Takes effect on the
	/// next resolution.
	pub fn set_preferred_icu4c_directory(&self, dir: Option<PathBuf>) {
		self.state.lock().preferred_dir = dir;
	}

	pub fn preferred_icu4c_directory(&self) -> Option<PathBuf> {
		self.state.lock().preferred_dir.clone()
	}

	pub fn range(&self) -> VersionRange {
		self.state.lock().range
	}

	pub fn state(&self) -> LifecycleState {
		let state = self.state.lock();
		match &state.active {
			None => LifecycleState::Uninitialized,
			Some(active) if state.range.contains(active.version.major) => LifecycleState::Bound,
			Some(_) => LifecycleState::PendingResolve,
		}
	}

	/// Current binding without triggering resolution.
	pub fn active(&self) -> Option<ActiveBinding> {
		self.state.lock().active.clone()
	}

	/// Number of modules currently open.
	pub fn open_modules(&self) -> usize {
		self.state.lock().binder.open_modules()
	}

	/// Resolves `name` from `module` of the active version, binding first if
	/// needed.
	pub fn entry_point(&self, module: IcuModule, name: &str) -> Result<EntryPoint> {
		let mut state = self.state.lock();
		let active = state.ensure_bound(self.platform, self.arch)?;
		state.binder.bind(&active.version, &active.directory, module, name)
	}

	/// Version of the bound ICU library, e.g. `61.1`.
	pub fn icu_version(&self) -> Result<String> {
		self.query_version("u_getVersion")
	}

	/// Unicode version implemented by the bound ICU library, e.g. `11.0`.
	pub fn unicode_version(&self) -> Result<String> {
		self.query_version("u_getUnicodeVersion")
	}

	/// Calls a `void (*)(UVersionInfo)` export of the common library.
	fn query_version(&self, name: &str) -> Result<String> {
		let entry = self.entry_point(IcuModule::Common, name)?;
		// SAFETY: both version exports are `void (*)(UVersionInfo)`.
		let get = unsafe { entry.cast::<unsafe extern "C" fn(*mut u8)>() };
		let mut info = [0u8; 4];
		// SAFETY: UVersionInfo is a 4-byte out array.
		unsafe { get(info.as_mut_ptr()) };
		Ok(format_version(info))
	}
}

impl State {
	/// Returns the active binding, resolving when there is none or it left the
	/// range.
	///
	/// An in-range binding returns here without rescanning, so `rank` only
	/// ever sees a previous binding that is outside the range.
	fn ensure_bound(&mut self, platform: Platform, arch: Arch) -> Result<ActiveBinding> {
		if let Some(active) = &self.active
			&& self.range.contains(active.version.major)
		{
			return Ok(active.clone());
		}

		let mut inputs = self.inputs.clone();
		inputs.preferred_dir = self.preferred_dir.clone();
		let dirs = probe::candidates(&inputs, platform, arch);
		let discovered = catalog::discover(platform, &dirs);
		let previous = self.active.as_ref().map(|active| Previous {
			version: &active.version,
			directory: &active.directory,
		});
		let ranked = select::rank(&discovered, self.range, previous);
		debug!(range = %self.range, directories = dirs.len(), candidates = ranked.len(), "resolving ICU");

		for candidate in ranked {
			match self.binder.load_module(&candidate.version, &candidate.directory, IcuModule::Common) {
				Ok(_) => {
					if let Some(old) = self.active.take() {
						info!(from = %old.version, to = %candidate.version, "switching ICU version");
						shutdown_icu(&mut self.binder, &old);
						self.binder.release_version(old.version.major);
					}
					info!(version = %candidate.version, dir = %candidate.directory.display(), "bound ICU");
					let active = ActiveBinding {
						version: candidate.version,
						directory: candidate.directory,
					};
					self.active = Some(active.clone());
					return Ok(active);
				}
				Err(error) => {
					warn!(%error, version = %candidate.version, "skipping ICU candidate");
					self.binder.release_version(candidate.version.major);
				}
			}
		}

		Err(Error::NoUsableIcuVersion {
			min: self.range.min(),
			max: self.range.max(),
			searched: dirs.len(),
		})
	}
}

/// Runs ICU's own teardown for `active`, if it exports one.
fn shutdown_icu(binder: &mut SymbolBinder, active: &ActiveBinding) {
	match binder.bind(&active.version, &active.directory, IcuModule::Common, "u_cleanup") {
		Ok(entry) => {
			// SAFETY: `void u_cleanup(void)`; the module is still open.
			unsafe { entry.cast::<unsafe extern "C" fn()>()() };
		}
		Err(error) => debug!(%error, "u_cleanup unavailable"),
	}
}
