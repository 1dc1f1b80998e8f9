//! Mono-style DllMap support.
//!
//! A DllMap file remaps a logical library name to a concrete file name,
//! conditioned on the host OS:
//!
//! ```xml
//! <configuration>
//!   <dllmap os="linux" dll="icuuc" target="libicuuc.so.62"/>
//!   <dllmap os="!windows,osx" dll="icuin" target="libicui18n.so.62"/>
//! </configuration>
//! ```
//!
//! The `os` attribute is a comma-separated token list (`windows`, `linux`,
//! `osx`, case-insensitive). A leading `!` negates the whole list.

use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;
use xml::reader::{EventReader, XmlEvent};

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Whether an `os` condition expression applies to `platform`.
///
/// `windows,linux` applies on either OS; `!windows,osx` applies on neither.
/// An empty expression applies everywhere; unknown tokens never match.
pub fn condition_applies(expression: &str, platform: Platform) -> bool {
	let expression = expression.trim();
	if expression.is_empty() {
		return true;
	}

	let (negated, list) = match expression.strip_prefix('!') {
		Some(rest) => (true, rest),
		None => (false, expression),
	};
	let listed = list.split(',').map(str::trim).any(|token| token.eq_ignore_ascii_case(platform.os_token()));
	listed != negated
}

/// One `<dllmap>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DllMapEntry {
	pub os: Option<String>,
	pub dll: String,
	pub target: String,
}

impl DllMapEntry {
	fn applies(&self, logical: &str, platform: Platform) -> bool {
		self.dll == logical && self.os.as_deref().is_none_or(|os| condition_applies(os, platform))
	}
}

/// Ordered mapping table read from a DllMap file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DllMap {
	entries: Vec<DllMapEntry>,
}

impl DllMap {
	/// Reads a DllMap file from disk.
	pub fn load(path: &Path) -> Result<Self> {
		let file = std::fs::File::open(path).map_err(|error| Error::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let map = Self::parse(BufReader::new(file))?;
		debug!(path = %path.display(), entries = map.entries.len(), "loaded DllMap");
		Ok(map)
	}

	/// Parses DllMap XML. `dllmap` elements are collected at any depth in
	/// document order; everything else is skipped.
	pub fn parse<R: Read>(reader: R) -> Result<Self> {
		let mut entries = Vec::new();
		for event in EventReader::new(reader) {
			let event = event.map_err(|e| Error::DllMap(e.to_string()))?;
			let XmlEvent::StartElement { name, attributes, .. } = event else {
				continue;
			};
			if name.local_name != "dllmap" {
				continue;
			}

			let mut os = None;
			let mut dll = None;
			let mut target = None;
			for attr in attributes {
				match attr.name.local_name.as_str() {
					"os" => os = Some(attr.value),
					"dll" => dll = Some(attr.value),
					"target" => target = Some(attr.value),
					_ => {}
				}
			}

			let dll = dll.ok_or_else(|| Error::DllMap("<dllmap> without a dll attribute".to_string()))?;
			let target = target.ok_or_else(|| Error::DllMap(format!("<dllmap dll=\"{dll}\"> without a target attribute")))?;
			entries.push(DllMapEntry { os, dll, target });
		}
		Ok(Self { entries })
	}

	pub fn entries(&self) -> &[DllMapEntry] {
		&self.entries
	}

	/// Target of the first entry matching `logical` whose condition applies,
	/// or `logical` itself.
	pub fn map_library_name<'a>(&'a self, logical: &'a str, platform: Platform) -> &'a str {
		self.entries
			.iter()
			.find(|entry| entry.applies(logical, platform))
			.map_or(logical, |entry| entry.target.as_str())
	}
}

/// Maps `logical` through the DllMap at `config_file` for the running platform.
pub fn map_library_name(config_file: &Path, logical: &str) -> Result<String> {
	let map = DllMap::load(config_file)?;
	Ok(map.map_library_name(logical, Platform::current()).to_string())
}
