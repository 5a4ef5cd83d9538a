//! Opaque host handles and the handle-to-object registry.

use std::collections::HashMap;
use std::hash::Hash;

/// Declares a host handle newtype.
///
/// Handles are never null; raw values coming from the host go through `from_raw`, which maps
/// NULL to `None`. The `NonNull` payload keeps handles `!Send`/`!Sync`, matching the host's
/// single-threaded contract.
macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(::std::ptr::NonNull<::std::ffi::c_void>);

        impl $name {
            #[inline]
            pub fn from_raw(raw: *mut ::std::ffi::c_void) -> Option<Self> {
                ::std::ptr::NonNull::new(raw).map(Self)
            }

            #[inline]
            pub fn as_raw(self) -> *mut ::std::ffi::c_void {
                self.0.as_ptr()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!(stringify!($name), "({:p})"), self.0)
            }
        }
    };
}

handle!(
    /// `XPLMDataRef`
    DataRefId
);
handle!(
    /// `XPLMCommandRef`
    CommandId
);
handle!(
    /// `XPLMMenuID`
    MenuId
);
handle!(
    /// `XPWidgetID`
    WidgetId
);
handle!(
    /// `XPLMFlightLoopID`
    FlightLoopId
);
handle!(
    /// `XPLMInstanceRef`
    InstanceId
);
handle!(
    /// `XPLMObjectRef`
    ObjectId
);
handle!(
    /// `XPLMProbeRef`
    ProbeId
);

/// Maps host handles back to the Rust-side object that owns them.
///
/// Entries are added when the owner creates the handle and removed when it (or the host)
/// destroys it. Lookups on unknown handles return `None`: host teardown order may already
/// have removed the entry by the time a late callback arrives.
pub struct HandleRegistry<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash + Copy, V> HandleRegistry<K, V> {
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the previous owner if the host recycled a handle value.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    #[inline]
    pub fn remove(&mut self, key: K) -> Option<V> {
        self.entries.remove(&key)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.get(&key)
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Copy, V> Default for HandleRegistry<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;

    fn fake(n: usize) -> WidgetId {
        WidgetId::from_raw(n as *mut c_void).unwrap()
    }

    #[test]
    fn null_is_not_a_handle() {
        assert!(DataRefId::from_raw(std::ptr::null_mut()).is_none());
        assert_eq!(fake(0x40).as_raw() as usize, 0x40);
    }

    #[test]
    fn unknown_handles_are_not_found() {
        let mut reg = HandleRegistry::new();
        reg.insert(fake(0x10), "main window");
        assert_eq!(reg.get(fake(0x10)), Some(&"main window"));
        assert_eq!(reg.get(fake(0x20)), None);

        assert_eq!(reg.remove(fake(0x10)), Some("main window"));
        assert_eq!(reg.remove(fake(0x10)), None);
        assert!(reg.is_empty());
    }
}
