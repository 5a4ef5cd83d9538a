#![forbid(unsafe_op_in_unsafe_fn)]

//! Host function tables.
//!
//! Every SDK entry point the bindings use is resolved once, at plugin start, into a table of
//! `extern "C"` function pointers. All calls into the host go through the installed table,
//! which is also the seam the simulated host plugs into.

mod widgets;
mod xplm;

pub use libloading::Library;
pub use widgets::{WidgetFunc, WidgetsApi};
pub use xplm::*;

use crate::error::{XplmError, XplmResult};
use std::sync::OnceLock;

/// Declares a table of host functions.
///
/// Each entry names the Rust field, the exported C symbol and the C signature. The generated
/// `load` resolves every symbol from a [`Library`]; in test builds `inert` fills the table with
/// functions that do nothing and return zero.
#[macro_export]
macro_rules! api_table {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $field:ident = $sym:literal : fn($($arg:ident : $argty:ty),* $(,)?) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name {
            $( pub $field: unsafe extern "C" fn($($argty),*) $(-> $ret)?, )*
        }

        impl $name {
            /// # Safety
            /// Every symbol in `lib` must have the declared C signature.
            pub unsafe fn load(lib: &$crate::api::Library) -> $crate::XplmResult<Self> {
                Ok(Self {
                    $(
                        $field: unsafe {
                            *lib.get::<unsafe extern "C" fn($($argty),*) $(-> $ret)?>(
                                concat!($sym, "\0").as_bytes(),
                            )
                            .map_err(|_| $crate::XplmError::MissingSymbol { symbol: $sym })?
                        },
                    )*
                })
            }

            #[cfg(any(test, feature = "test-host"))]
            pub fn inert() -> Self {
                Self {
                    $(
                        $field: {
                            #[allow(unused_variables)]
                            unsafe extern "C" fn inert($($arg: $argty),*) $(-> $ret)? {
                                unsafe { ::std::mem::zeroed() }
                            }
                            inert
                        },
                    )*
                }
            }
        }
    };
}

/// Both SDK libraries a plugin links against.
#[derive(Clone, Copy)]
pub struct HostApi {
    pub xplm: XplmApi,
    pub widgets: WidgetsApi,
}

impl HostApi {
    /// Resolves the tables from the host libraries already mapped into the process.
    pub fn load() -> XplmResult<Self> {
        let xplm_lib = open_host_library("XPLM_64.dll")?;
        let widgets_lib = open_host_library("XPWidgets_64.dll")?;
        let api = unsafe {
            Self {
                xplm: XplmApi::load(&xplm_lib)?,
                widgets: WidgetsApi::load(&widgets_lib)?,
            }
        };
        // The host keeps both libraries mapped for the plugin's whole lifetime.
        std::mem::forget(xplm_lib);
        std::mem::forget(widgets_lib);
        Ok(api)
    }
}

/// Opens a library the host has already loaded.
///
/// On Windows the SDK lives in named DLLs; elsewhere its symbols are global in the process.
#[cfg(windows)]
pub fn open_host_library(name: &str) -> XplmResult<Library> {
    libloading::os::windows::Library::open_already_loaded(name)
        .map(Library::from)
        .map_err(|e| XplmError::LibraryUnavailable(format!("{name}: {e}")))
}

#[cfg(unix)]
pub fn open_host_library(_name: &str) -> XplmResult<Library> {
    Ok(Library::from(libloading::os::unix::Library::this()))
}

static HOST_API: OnceLock<HostApi> = OnceLock::new();

/// Installs the process-wide host table. A second install is rejected.
pub fn install(api: HostApi) -> XplmResult<()> {
    HOST_API.set(api).map_err(|_| XplmError::AlreadyInstalled)
}

/// Loads the host table unless one is already installed.
pub fn ensure_loaded() -> XplmResult<()> {
    if HOST_API.get().is_some() {
        return Ok(());
    }
    match install(HostApi::load()?) {
        Ok(()) | Err(XplmError::AlreadyInstalled) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(any(test, feature = "test-host"))]
pub(crate) fn install_with(f: impl FnOnce() -> HostApi) {
    HOST_API.get_or_init(f);
}

#[inline]
pub fn try_api() -> Option<&'static HostApi> {
    HOST_API.get()
}

#[inline]
pub fn api() -> &'static HostApi {
    HOST_API.get().expect("XPLM host table not installed")
}

#[inline]
pub(crate) fn xplm() -> &'static XplmApi {
    &api().xplm
}

#[inline]
pub(crate) fn widgets() -> &'static WidgetsApi {
    &api().widgets
}
