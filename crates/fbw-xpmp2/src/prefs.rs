//! Integer preferences XPMP2 asks the plugin for.
//!
//! The library queries them through a plain function pointer with no context argument, at
//! init and later while it runs, so the answers live in a process-wide table.

use fbw_xplm::callback::guard;
use fbw_xplm::strings::from_ptr;
use fbw_xplm::PluginConfig;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ffi::{c_char, c_int};

/// Answers by section, then key. Unknown pairs get the library's own default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntPrefs {
    values: BTreeMap<String, BTreeMap<String, i32>>,
}

static ACTIVE: Mutex<Option<IntPrefs>> = parking_lot::const_mutex(None);

impl IntPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the `[int_prefs.<section>]` tables of the plugin config.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self {
            values: config.int_prefs.clone(),
        }
    }

    pub fn with(mut self, section: &str, key: &str, value: i32) -> Self {
        self.set(section, key, value);
        self
    }

    pub fn set(&mut self, section: &str, key: &str, value: i32) {
        self.values
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
    }

    pub fn get(&self, section: &str, key: &str) -> Option<i32> {
        self.values.get(section)?.get(key).copied()
    }

    /// Adds these to the answers given to the library, replacing values for the same keys.
    pub fn install(self) {
        let mut active = ACTIVE.lock();
        let merged = active.get_or_insert_with(IntPrefs::new);
        for (section, keys) in self.values {
            merged.values.entry(section).or_default().extend(keys);
        }
    }

    pub fn uninstall() {
        ACTIVE.lock().take();
    }

    fn answer(section: &str, key: &str, default: i32) -> i32 {
        ACTIVE
            .lock()
            .as_ref()
            .and_then(|p| p.get(section, key))
            .unwrap_or(default)
    }
}

pub(crate) unsafe extern "C" fn int_prefs(section: *const c_char, key: *const c_char, default: c_int) -> c_int {
    guard("XPMP2 int prefs", default, || {
        let section = unsafe { from_ptr(section) }.unwrap_or_default();
        let Some(key) = (unsafe { from_ptr(key) }) else {
            return default;
        };
        let value = IntPrefs::answer(&section, &key, default);
        log::trace!(target: "xpmp2", "int pref {section}/{key} = {value} (default {default})");
        value
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn lookup_is_by_section_and_key() {
        let prefs = IntPrefs::new()
            .with("planes", "clamp_all_to_ground", 1)
            .with("debug", "model_matching", 0);
        assert_eq!(prefs.get("planes", "clamp_all_to_ground"), Some(1));
        assert_eq!(prefs.get("debug", "clamp_all_to_ground"), None);
        assert_eq!(prefs.get("debug", "model_matching"), Some(0));
    }

    #[test]
    fn built_from_plugin_config() {
        let cfg = PluginConfig::from_toml_str("[int_prefs.planes]\nhandle_dup_id = 1\n").unwrap();
        assert_eq!(IntPrefs::from_config(&cfg).get("planes", "handle_dup_id"), Some(1));
    }

    #[test]
    fn callback_answers_installed_values_or_default() {
        IntPrefs::new().with("prefs_test", "log_level", 0).install();
        let section = CString::new("prefs_test").unwrap();
        let known = CString::new("log_level").unwrap();
        let unknown = CString::new("model_matching").unwrap();
        unsafe {
            assert_eq!(int_prefs(section.as_ptr(), known.as_ptr(), 2), 0);
            assert_eq!(int_prefs(section.as_ptr(), unknown.as_ptr(), 7), 7);
            assert_eq!(int_prefs(section.as_ptr(), std::ptr::null(), 3), 3);
        }
    }
}
