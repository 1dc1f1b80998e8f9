//! Typed entry-point tables.

/// Declares a struct of typed ICU entry points, resolved together.
///
/// Every field names the module exporting it, the logical symbol name and the
/// function pointer type it is cast to. `resolve` binds the whole table at
/// once, so a missing export surfaces before any call is made.
///
/// ```ignore
/// icubind_loader::entry_table! {
///     pub struct BreakIterFns {
///         open: Common => "ubrk_open" as unsafe extern "C" fn(i32, *const c_char, *const u16, i32, *mut i32) -> *mut c_void,
///         close: Common => "ubrk_close" as unsafe extern "C" fn(*mut c_void),
///     }
/// }
/// ```
#[macro_export]
macro_rules! entry_table {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident {
			$(
				$(#[$field_meta:meta])*
				$field:ident: $module:ident => $symbol:literal as $ty:ty
			),* $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy)]
		$vis struct $name {
			$(
				$(#[$field_meta])*
				pub $field: $ty,
			)*
		}

		impl $name {
			/// Binds every entry against the active ICU version of `context`.
			///
			/// # Safety
			///
			/// Each declared type must match the native signature of its
			/// symbol. The table is invalidated by cleanup or a version switch.
			$vis unsafe fn resolve(context: &$crate::IcuContext) -> $crate::Result<Self> {
				Ok(Self {
					$(
						$field: {
							let entry = context.entry_point($crate::IcuModule::$module, $symbol)?;
							// SAFETY: forwarded from the caller.
							unsafe { entry.cast::<$ty>() }
						},
					)*
				})
			}
		}
	};
}

/// Formats an ICU `UVersionInfo` the way `u_versionToString` does: trailing
/// zero fields are dropped, but at least major and minor are kept.
pub fn format_version(info: [u8; 4]) -> String {
	let mut len = info.len();
	while len > 2 && info[len - 1] == 0 {
		len -= 1;
	}
	info[..len].iter().map(u8::to_string).collect::<Vec<_>>().join(".")
}
