//! Callback contexts handed to the host as opaque `refcon` pointers.
//!
//! A registered callback lives in a [`CallbackArena`] slot; the host only ever sees the slot
//! index encoded as a pointer. Slots are removed exactly when the native registration is
//! undone, so a refcon never outlives the context it names.

use slab::Slab;
use std::any::Any;
use std::cell::RefCell;
use std::ffi::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Index of a callback context, round-tripped through the host as `void *refcon`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(usize);

impl CallbackId {
    /// Offset by one so a valid id is never a null refcon.
    #[inline]
    pub fn to_refcon(self) -> *mut c_void {
        (self.0 + 1) as *mut c_void
    }

    #[inline]
    pub fn from_refcon(refcon: *mut c_void) -> Option<Self> {
        (refcon as usize).checked_sub(1).map(Self)
    }
}

pub struct CallbackArena<T: ?Sized> {
    slots: RefCell<Slab<Rc<T>>>,
}

impl<T: ?Sized> CallbackArena<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Slab::new()),
        }
    }

    #[inline]
    pub fn insert(&self, ctx: Rc<T>) -> CallbackId {
        CallbackId(self.slots.borrow_mut().insert(ctx))
    }

    #[inline]
    pub fn remove(&self, id: CallbackId) -> Option<Rc<T>> {
        self.slots.borrow_mut().try_remove(id.0)
    }

    /// Clones the context out so the arena is not borrowed while user code runs.
    #[inline]
    pub fn get(&self, id: CallbackId) -> Option<Rc<T>> {
        self.slots.borrow().get(id.0).cloned()
    }

    #[inline]
    pub fn resolve(&self, refcon: *mut c_void) -> Option<Rc<T>> {
        self.get(CallbackId::from_refcon(refcon)?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for CallbackArena<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a trampoline body, converting a panic into `default`.
///
/// Unwinding into host frames is undefined behavior, so every `extern "C"` callback body goes
/// through here. The panic message is written to the host log.
pub fn guard<R>(site: &str, default: R, f: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(payload) => {
            report_panic(site, payload.as_ref());
            default
        }
    }
}

/// Enumerator for host calls that list names synchronously; `refcon` is a `*mut Vec<String>`.
pub(crate) unsafe extern "C" fn collect_names(name: *const c_char, refcon: *mut c_void) {
    guard("name enumerator", (), || {
        let Some(names) = (unsafe { refcon.cast::<Vec<String>>().as_mut() }) else {
            return;
        };
        if let Some(name) = unsafe { crate::strings::from_ptr(name) } {
            names.push(name);
        }
    })
}

pub(crate) fn report_panic(site: &str, payload: &(dyn Any + Send)) {
    let msg = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    crate::utilities::debug_string(&format!("[fbw] panic in {site}: {msg}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn refcon_is_never_null() {
        let arena = CallbackArena::<u32>::new();
        let id = arena.insert(Rc::new(7));
        assert!(!id.to_refcon().is_null());
        assert_eq!(CallbackId::from_refcon(id.to_refcon()), Some(id));
        assert_eq!(CallbackId::from_refcon(std::ptr::null_mut()), None);
    }

    #[test]
    fn removed_contexts_no_longer_resolve() {
        let arena = CallbackArena::<str>::new();
        let id = arena.insert(Rc::from("flight loop"));
        assert_eq!(arena.resolve(id.to_refcon()).as_deref(), Some("flight loop"));

        assert!(arena.remove(id).is_some());
        assert!(arena.remove(id).is_none());
        assert!(arena.resolve(id.to_refcon()).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn arena_is_not_borrowed_during_dispatch() {
        let arena = Rc::new(CallbackArena::<dyn Fn()>::new());
        let inner = arena.clone();
        let id = arena.insert(Rc::new(move || {
            inner.insert(Rc::new(|| {}));
        }));
        let f = arena.get(id).unwrap();
        f();
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn guard_swallows_panics_and_reports_to_host_log() {
        let host = TestHost::new();
        let out = guard("test callback", -1, || -> i32 { panic!("boom") });
        assert_eq!(out, -1);
        assert!(host.debug_log().contains("panic in test callback: boom"));

        assert_eq!(guard("ok", 0, || 5), 5);
    }
}
