//! Discovery, version selection and symbol binding for ICU4C.
//!
//! ICU4C ships as a family of shared libraries whose file names and exported
//! symbols carry the major version (`libicuuc.so.62`, `ucol_open_62`). This
//! crate finds the installed releases, picks one inside a confinement range
//! and hands out entry points of the bound release.
//!
//! Most callers go through [`wrapper`], a process-wide context configured from
//! the environment. [`IcuContext`] is the same machinery as a value, with an
//! injectable [`ModuleLoader`].
//!
//! Typed tables of entry points are declared with [`entry_table!`].

pub mod binder;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dll_map;
pub mod error;
pub mod native;
pub mod platform;
pub mod probe;
pub mod select;
pub mod table;
pub mod version;
pub mod wrapper;

#[cfg(test)]
pub(crate) mod testing;

pub use binder::{EntryPoint, ModuleLoader, NativeModule, SymbolBinder};
pub use config::LoaderConfig;
pub use context::{ActiveBinding, IcuContext, LifecycleState};
pub use dll_map::DllMap;
pub use error::{Error, Result};
pub use native::LibloadingLoader;
pub use platform::{Arch, IcuModule, Platform};
pub use probe::ProbeInputs;
pub use table::format_version;
pub use version::{IcuVersionInfo, MAX_SUPPORTED_ICU_VERSION, MIN_SUPPORTED_ICU_VERSION, VersionRange};
