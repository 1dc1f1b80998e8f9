//! Process-wide ICU context.
//!
//! The context is created on first use from [`LoaderConfig::from_env`] and the
//! OS loader. A configuration that fails to load is logged and replaced by the
//! defaults, so a bad file never prevents ICU from being found.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::warn;

pub use crate::version::{MAX_SUPPORTED_ICU_VERSION, MIN_SUPPORTED_ICU_VERSION};
use crate::binder::EntryPoint;
use crate::config::LoaderConfig;
use crate::context::{ActiveBinding, IcuContext};
use crate::error::Result;
use crate::native::LibloadingLoader;
use crate::platform::{Arch, IcuModule, Platform};
use crate::probe::ProbeInputs;

/// The process-wide context.
pub fn context() -> &'static IcuContext {
	static CONTEXT: OnceLock<IcuContext> = OnceLock::new();
	CONTEXT.get_or_init(|| {
		let config = LoaderConfig::from_env().and_then(|config| IcuContext::from_config(&config, Arc::new(LibloadingLoader)));
		config.unwrap_or_else(|error| {
			warn!(%error, "ignoring ICU loader config");
			let inputs = ProbeInputs::from_env(Platform::current(), Arch::current());
			IcuContext::new(Arc::new(LibloadingLoader), inputs)
		})
	})
}

/// Binds ICU if not already bound.
pub fn init() -> Result<ActiveBinding> {
	context().init()
}

/// Releases ICU. Entry points obtained earlier must no longer be called.
pub fn cleanup() {
	context().cleanup()
}

pub fn confine_icu_versions(min: u32, max: u32) -> Result<()> {
	context().confine_icu_versions(min, max)
}

pub fn confine_icu_version(version: u32) {
	context().confine_icu_version(version)
}

pub fn set_preferred_icu4c_directory(dir: Option<PathBuf>) {
	context().set_preferred_icu4c_directory(dir)
}

/// Version string of the bound ICU, binding first if needed.
pub fn icu_version() -> Result<String> {
	context().icu_version()
}

/// Unicode version of the bound ICU, binding first if needed.
pub fn unicode_version() -> Result<String> {
	context().unicode_version()
}

pub fn entry_point(module: IcuModule, name: &str) -> Result<EntryPoint> {
	context().entry_point(module, name)
}
