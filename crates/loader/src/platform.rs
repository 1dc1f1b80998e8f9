//! Platform conventions for ICU library files.
//!
//! Every OS-specific rule (file names, search-path variable, runtime identifier
//! prefix, system library directories) lives on [`Platform`], which is chosen
//! once via [`Platform::current`]. The rest of the crate passes the value
//! around instead of branching on `cfg` at each call site.

use std::fmt;
use std::path::PathBuf;

use crate::version::IcuVersionInfo;

/// Operating system family, as far as ICU naming is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
	Windows,
	Linux,
	MacOs,
}

/// The ICU shared libraries a binding needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IcuModule {
	/// `icuuc`: common library, carries `u_getVersion` and friends.
	Common,
	/// `icuin` / `icui18n`: collation, calendars, transliteration.
	I18n,
	/// `icudt` / `icudata`: data library.
	Data,
}

impl IcuModule {
	/// Version-independent library name, as used in DllMap files.
	pub const fn logical_name(self) -> &'static str {
		match self {
			Self::Common => "icuuc",
			Self::I18n => "icuin",
			Self::Data => "icudt",
		}
	}

	/// Stem used by the ELF and Mach-O file names.
	const fn unix_stem(self) -> &'static str {
		match self {
			Self::Common => "icuuc",
			Self::I18n => "icui18n",
			Self::Data => "icudata",
		}
	}
}

impl fmt::Display for IcuModule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.logical_name())
	}
}

/// Process architecture, from the compiled target rather than the host OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
	X64,
	X86,
	Arm64,
	Arm,
}

impl Arch {
	pub const fn current() -> Self {
		if cfg!(target_arch = "aarch64") {
			Self::Arm64
		} else if cfg!(target_arch = "arm") {
			Self::Arm
		} else if cfg!(target_pointer_width = "64") {
			Self::X64
		} else {
			Self::X86
		}
	}

	pub const fn token(self) -> &'static str {
		match self {
			Self::X64 => "x64",
			Self::X86 => "x86",
			Self::Arm64 => "arm64",
			Self::Arm => "arm",
		}
	}
}

impl Platform {
	/// Platform of the running process. Unix flavours other than macOS use
	/// the Linux conventions.
	pub const fn current() -> Self {
		if cfg!(windows) {
			Self::Windows
		} else if cfg!(target_os = "macos") {
			Self::MacOs
		} else {
			Self::Linux
		}
	}

	/// Token used in DllMap `os` conditions.
	pub const fn os_token(self) -> &'static str {
		match self {
			Self::Windows => "windows",
			Self::Linux => "linux",
			Self::MacOs => "osx",
		}
	}

	/// Runtime identifier prefix for `lib/<rid><arch>` style layouts.
	pub const fn rid_prefix(self) -> &'static str {
		match self {
			Self::Windows => "win-",
			Self::Linux => "linux-",
			Self::MacOs => "osx-",
		}
	}

	/// Environment variable holding the dynamic-library search path.
	pub const fn search_path_var(self) -> &'static str {
		match self {
			Self::Windows => "PATH",
			Self::Linux => "LD_LIBRARY_PATH",
			Self::MacOs => "DYLD_LIBRARY_PATH",
		}
	}

	/// File name of `module` for ICU major version `major`.
	pub fn file_name(self, module: IcuModule, major: u32) -> String {
		match self {
			Self::Windows => format!("{}{major}.dll", module.logical_name()),
			Self::Linux => format!("lib{}.so.{major}", module.unix_stem()),
			Self::MacOs => format!("lib{}.{major}.dylib", module.unix_stem()),
		}
	}

	/// File name carrying the full dotted version, where the platform has one.
	pub fn full_file_name(self, module: IcuModule, full: &str) -> Option<String> {
		match self {
			Self::Windows => None,
			Self::Linux => Some(format!("lib{}.so.{full}", module.unix_stem())),
			Self::MacOs => Some(format!("lib{}.{full}.dylib", module.unix_stem())),
		}
	}

	/// Extracts the version from a file name of `module`.
	///
	/// Returns `None` for names that do not follow the platform pattern or
	/// whose version part is not made of digits.
	pub fn parse_file_name(self, module: IcuModule, file_name: &str) -> Option<IcuVersionInfo> {
		match self {
			Self::Windows => {
				let lower = file_name.to_ascii_lowercase();
				let digits = lower.strip_prefix(module.logical_name())?.strip_suffix(".dll")?;
				let major = parse_digits(digits)?;
				Some(IcuVersionInfo::new(major))
			}
			Self::Linux => {
				let rest = file_name.strip_prefix("lib")?.strip_prefix(module.unix_stem())?.strip_prefix(".so.")?;
				parse_dotted(rest)
			}
			Self::MacOs => {
				let rest = file_name
					.strip_prefix("lib")?
					.strip_prefix(module.unix_stem())?
					.strip_prefix('.')?
					.strip_suffix(".dylib")?;
				parse_dotted(rest)
			}
		}
	}

	/// Conventional system library directories, searched after everything else.
	pub fn system_dirs(self, arch: Arch) -> Vec<PathBuf> {
		match self {
			Self::Windows => Vec::new(),
			Self::Linux => {
				let multiarch = match arch {
					Arch::X64 => "x86_64-linux-gnu",
					Arch::X86 => "i386-linux-gnu",
					Arch::Arm64 => "aarch64-linux-gnu",
					Arch::Arm => "arm-linux-gnueabihf",
				};
				vec![
					PathBuf::from("/usr/local/lib"),
					PathBuf::from(format!("/usr/lib/{multiarch}")),
					PathBuf::from("/usr/lib64"),
					PathBuf::from("/usr/lib"),
					PathBuf::from(format!("/lib/{multiarch}")),
					PathBuf::from("/lib"),
				]
			}
			Self::MacOs => ["/opt/homebrew/opt/icu4c/lib", "/usr/local/opt/icu4c/lib", "/opt/local/lib", "/usr/local/lib"]
				.into_iter()
				.map(PathBuf::from)
				.collect(),
		}
	}
}

impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.os_token())
	}
}

fn parse_digits(s: &str) -> Option<u32> {
	if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	s.parse().ok()
}

/// Parses `NN` or `NN.minor[.patch]`, all components numeric.
fn parse_dotted(s: &str) -> Option<IcuVersionInfo> {
	let mut parts = s.split('.');
	let major = parse_digits(parts.next()?)?;
	let mut components = 1;
	for part in parts {
		parse_digits(part)?;
		components += 1;
	}
	Some(if components > 1 {
		IcuVersionInfo::with_full(major, s)
	} else {
		IcuVersionInfo::new(major)
	})
}
