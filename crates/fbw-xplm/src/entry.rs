//! Plugin entry points.
//!
//! The host finds a plugin through five exported C functions. [`xplugin!`](crate::xplugin)
//! generates them for a type implementing [`XPlugin`]; the functions here do the work and are
//! public only for the macro's sake.

use crate::api;
use crate::callback::guard;
use crate::error::XplmResult;
use crate::plugin::PluginId;
use crate::strings::{write_to_ptr, INFO_BUF};
use crate::utilities::debug_string;
use std::any::Any;
use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_void};

/// A plugin's lifecycle as driven by the host.
///
/// `start` runs once when the plugin is loaded, `stop` (and then drop) once when it is
/// unloaded. The host may enable and disable it any number of times in between.
pub trait XPlugin: Sized + 'static {
    const NAME: &'static str;
    /// Globally unique, conventionally a reverse domain name.
    const SIGNATURE: &'static str;
    const DESCRIPTION: &'static str = "Built with fbw-xplm";

    fn start() -> XplmResult<Self>;

    fn enable(&mut self) -> XplmResult<()> {
        Ok(())
    }

    fn disable(&mut self) {}

    fn receive_message(&mut self, _from: PluginId, _message: i32, _param: *mut c_void) {}

    fn stop(&mut self) {}
}

thread_local! {
    static PLUGIN: RefCell<Option<Box<dyn Any>>> = const { RefCell::new(None) };
}

fn with_plugin<P: XPlugin, R>(f: impl FnOnce(&mut P) -> R) -> Option<R> {
    // Taken out for the call so the plugin may re-enter the bindings freely.
    let mut boxed = PLUGIN.with(|p| p.borrow_mut().take())?;
    let out = boxed.downcast_mut::<P>().map(f);
    PLUGIN.with(|p| *p.borrow_mut() = Some(boxed));
    out
}

/// # Safety
/// Each pointer must be null or a writable host buffer of 256 bytes.
pub unsafe fn start<P: XPlugin>(name: *mut c_char, signature: *mut c_char, description: *mut c_char) -> c_int {
    if api::ensure_loaded().is_err() {
        return 0;
    }
    unsafe {
        write_to_ptr(name, INFO_BUF, P::NAME);
        write_to_ptr(signature, INFO_BUF, P::SIGNATURE);
        write_to_ptr(description, INFO_BUF, P::DESCRIPTION);
    }
    guard("XPluginStart", 0, || match P::start() {
        Ok(plugin) => {
            log::info!(target: "fbw_xplm", "{} started", P::NAME);
            PLUGIN.with(|p| *p.borrow_mut() = Some(Box::new(plugin)));
            1
        }
        Err(e) => {
            debug_string(&format!("[{}] start failed: {e}\n", P::NAME));
            0
        }
    })
}

pub fn stop<P: XPlugin>() {
    guard("XPluginStop", (), || {
        if let Some(mut boxed) = PLUGIN.with(|p| p.borrow_mut().take()) {
            if let Some(plugin) = boxed.downcast_mut::<P>() {
                plugin.stop();
            }
        }
    })
}

pub fn enable<P: XPlugin>() -> c_int {
    guard("XPluginEnable", 0, || match with_plugin::<P, _>(P::enable) {
        Some(Ok(())) => 1,
        Some(Err(e)) => {
            debug_string(&format!("[{}] enable failed: {e}\n", P::NAME));
            0
        }
        None => 0,
    })
}

pub fn disable<P: XPlugin>() {
    guard("XPluginDisable", (), || {
        with_plugin::<P, _>(P::disable);
    })
}

pub fn receive_message<P: XPlugin>(from: c_int, message: c_int, param: *mut c_void) {
    guard("XPluginReceiveMessage", (), || {
        with_plugin::<P, _>(|p| p.receive_message(PluginId(from), message, param));
    })
}

/// Exports the host entry points for a type implementing [`XPlugin`].
#[macro_export]
macro_rules! xplugin {
    ($plugin:ty) => {
        #[no_mangle]
        pub unsafe extern "C" fn XPluginStart(
            name: *mut ::std::ffi::c_char,
            signature: *mut ::std::ffi::c_char,
            description: *mut ::std::ffi::c_char,
        ) -> ::std::ffi::c_int {
            unsafe { $crate::entry::start::<$plugin>(name, signature, description) }
        }

        #[no_mangle]
        pub extern "C" fn XPluginStop() {
            $crate::entry::stop::<$plugin>()
        }

        #[no_mangle]
        pub extern "C" fn XPluginEnable() -> ::std::ffi::c_int {
            $crate::entry::enable::<$plugin>()
        }

        #[no_mangle]
        pub extern "C" fn XPluginDisable() {
            $crate::entry::disable::<$plugin>()
        }

        #[no_mangle]
        pub extern "C" fn XPluginReceiveMessage(
            from: ::std::ffi::c_int,
            message: ::std::ffi::c_int,
            param: *mut ::std::ffi::c_void,
        ) {
            $crate::entry::receive_message::<$plugin>(from, message, param)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XplmError;
    use crate::strings::from_nul_padded;
    use crate::test_host::TestHost;
    use std::cell::Cell;

    thread_local! {
        static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        static FAIL_ENABLE: Cell<bool> = const { Cell::new(false) };
    }

    fn event(s: impl Into<String>) {
        EVENTS.with(|e| e.borrow_mut().push(s.into()));
    }

    fn events() -> Vec<String> {
        EVENTS.with(|e| e.borrow_mut().drain(..).collect())
    }

    struct Probe;

    impl XPlugin for Probe {
        const NAME: &'static str = "Fly by Wireless";
        const SIGNATURE: &'static str = "hk.timtim.flybywireless";

        fn start() -> XplmResult<Self> {
            event("start");
            Ok(Self)
        }

        fn enable(&mut self) -> XplmResult<()> {
            event("enable");
            if FAIL_ENABLE.with(Cell::get) {
                return Err(XplmError::Host("no traffic source".into()));
            }
            Ok(())
        }

        fn disable(&mut self) {
            event("disable");
        }

        fn receive_message(&mut self, from: PluginId, message: i32, _param: *mut c_void) {
            event(format!("msg {} {message}", from.0));
        }

        fn stop(&mut self) {
            event("stop");
        }
    }

    struct Broken;

    impl XPlugin for Broken {
        const NAME: &'static str = "Broken";
        const SIGNATURE: &'static str = "test.broken";

        fn start() -> XplmResult<Self> {
            Err(XplmError::Unsupported("XPLM 400 required".into()))
        }
    }

    struct Panicky;

    impl XPlugin for Panicky {
        const NAME: &'static str = "Panicky";
        const SIGNATURE: &'static str = "test.panicky";

        fn start() -> XplmResult<Self> {
            panic!("start exploded")
        }
    }

    fn start_into_buffers<P: XPlugin>() -> (c_int, [String; 3]) {
        let mut bufs = [[0xffu8; INFO_BUF]; 3];
        let [n, s, d] = &mut bufs;
        let r = unsafe { start::<P>(n.as_mut_ptr().cast(), s.as_mut_ptr().cast(), d.as_mut_ptr().cast()) };
        (r, bufs.map(|b| from_nul_padded(&b)))
    }

    #[test]
    fn full_lifecycle() {
        let _host = TestHost::new();
        events();
        let (r, [name, sig, desc]) = start_into_buffers::<Probe>();
        assert_eq!(r, 1);
        assert_eq!(name, "Fly by Wireless");
        assert_eq!(sig, "hk.timtim.flybywireless");
        assert_eq!(desc, "Built with fbw-xplm");

        assert_eq!(enable::<Probe>(), 1);
        receive_message::<Probe>(0, crate::plugin::messages::PLANE_LOADED, std::ptr::null_mut());
        disable::<Probe>();
        stop::<Probe>();
        assert_eq!(events(), ["start", "enable", "msg 0 102", "disable", "stop"]);

        // Nothing left to call after stop.
        assert_eq!(enable::<Probe>(), 0);
        assert!(events().is_empty());
    }

    #[test]
    fn failed_enable_returns_zero_and_logs() {
        let host = TestHost::new();
        start_into_buffers::<Probe>();
        FAIL_ENABLE.with(|f| f.set(true));
        assert_eq!(enable::<Probe>(), 0);
        FAIL_ENABLE.with(|f| f.set(false));
        assert!(host.debug_log().contains("[Fly by Wireless] enable failed: host error: no traffic source"));
        stop::<Probe>();
    }

    #[test]
    fn failed_or_panicking_start_returns_zero() {
        let host = TestHost::new();
        let (r, [name, ..]) = start_into_buffers::<Broken>();
        assert_eq!(r, 0);
        assert_eq!(name, "Broken");
        assert!(host.debug_log().contains("[Broken] start failed: unsupported host: XPLM 400 required"));

        let (r, _) = start_into_buffers::<Panicky>();
        assert_eq!(r, 0);
        assert!(host.debug_log().contains("panic in XPluginStart: start exploded"));
    }
}
