//! Plugin registry queries, inter-plugin messages and SDK features.

use crate::api::xplm;
use crate::callback::collect_names;
use crate::error::XplmResult;
use crate::strings::{to_cstring, FixedBuf, INFO_BUF, PATH_BUF};
use std::ffi::{c_int, c_void};

/// Messages the host sends to every plugin.
pub mod messages {
    pub const PLANE_CRASHED: i32 = 101;
    pub const PLANE_LOADED: i32 = 102;
    pub const AIRPORT_LOADED: i32 = 103;
    pub const SCENERY_LOADED: i32 = 104;
    pub const AIRPLANE_COUNT_CHANGED: i32 = 105;
    pub const PLANE_UNLOADED: i32 = 106;
    pub const WILL_WRITE_PREFS: i32 = 107;
    pub const LIVERY_LOADED: i32 = 108;
    pub const ENTERED_VR: i32 = 109;
    pub const EXITING_VR: i32 = 110;
    pub const RELEASE_PLANES: i32 = 111;
}

/// Host-assigned plugin id. The simulator itself is id 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PluginId(pub i32);

impl PluginId {
    pub const XPLANE: Self = Self(0);

    #[inline]
    pub(crate) fn from_raw(raw: c_int) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }

    #[inline]
    pub fn is_enabled(self) -> bool {
        unsafe { (xplm().is_plugin_enabled)(self.0) != 0 }
    }

    /// Returns whether the plugin accepted being enabled.
    pub fn set_enabled(self, enabled: bool) -> bool {
        if enabled {
            unsafe { (xplm().enable_plugin)(self.0) != 0 }
        } else {
            unsafe { (xplm().disable_plugin)(self.0) };
            true
        }
    }

    #[inline]
    pub fn info(self) -> PluginInfo {
        info(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginInfo {
    pub id: PluginId,
    pub name: String,
    pub file_path: String,
    pub signature: String,
    pub description: String,
}

#[inline]
pub fn my_id() -> PluginId {
    PluginId(unsafe { (xplm().get_my_id)() })
}

#[inline]
pub fn count() -> usize {
    unsafe { (xplm().count_plugins)() }.max(0) as usize
}

#[inline]
pub fn nth(index: usize) -> Option<PluginId> {
    let index = c_int::try_from(index).ok()?;
    PluginId::from_raw(unsafe { (xplm().get_nth_plugin)(index) })
}

/// All loaded plugins in host order.
pub fn plugins() -> impl Iterator<Item = PluginInfo> {
    (0..count()).filter_map(nth).map(info)
}

pub fn find_by_path(path: &str) -> Option<PluginId> {
    let path = to_cstring(path).ok()?;
    PluginId::from_raw(unsafe { (xplm().find_plugin_by_path)(path.as_ptr()) })
}

pub fn find_by_signature(signature: &str) -> Option<PluginId> {
    let signature = to_cstring(signature).ok()?;
    PluginId::from_raw(unsafe { (xplm().find_plugin_by_signature)(signature.as_ptr()) })
}

pub fn info(id: PluginId) -> PluginInfo {
    let mut name = FixedBuf::<INFO_BUF>::new();
    let mut file_path = FixedBuf::<PATH_BUF>::new();
    let mut signature = FixedBuf::<INFO_BUF>::new();
    let mut description = FixedBuf::<INFO_BUF>::new();
    unsafe {
        (xplm().get_plugin_info)(
            id.0,
            name.as_mut_ptr(),
            file_path.as_mut_ptr(),
            signature.as_mut_ptr(),
            description.as_mut_ptr(),
        )
    };
    PluginInfo {
        id,
        name: name.to_string_lossy(),
        file_path: file_path.to_string_lossy(),
        signature: signature.to_string_lossy(),
        description: description.to_string_lossy(),
    }
}

/// Disables, reloads and re-enables every plugin, this one included.
#[inline]
pub fn reload_all() {
    unsafe { (xplm().reload_plugins)() }
}

/// Sends `message` to one plugin, or to all plugins when `to` is `None`.
pub fn send_message(to: Option<PluginId>, message: i32, param: *mut c_void) {
    let target = to.map_or(-1, |id| id.0);
    unsafe { (xplm().send_message_to_plugin)(target, message, param) };
}

#[inline]
pub fn broadcast(message: i32, param: *mut c_void) {
    send_message(None, message, param);
}

/// An SDK feature known to the host, such as `XPLM_USE_NATIVE_PATHS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feature {
    name: String,
}

impl Feature {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        match to_cstring(&self.name) {
            Ok(name) => unsafe { (xplm().is_feature_enabled)(name.as_ptr()) != 0 },
            Err(_) => false,
        }
    }

    pub fn set_enabled(&self, enabled: bool) -> XplmResult<()> {
        let name = to_cstring(&self.name)?;
        unsafe { (xplm().enable_feature)(name.as_ptr(), enabled as c_int) };
        Ok(())
    }
}

/// Returns the feature if the host supports it.
pub fn has_feature(name: &str) -> Option<Feature> {
    let cname = to_cstring(name).ok()?;
    (unsafe { (xplm().has_feature)(cname.as_ptr()) } != 0).then(|| Feature {
        name: name.to_owned(),
    })
}

pub fn enumerate_features() -> Vec<Feature> {
    let mut names: Vec<String> = Vec::new();
    unsafe { (xplm().enumerate_features)(Some(collect_names), (&mut names as *mut Vec<String>).cast()) };
    names.into_iter().map(|name| Feature { name }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn registry_queries() {
        let host = TestHost::new();
        host.add_plugin("TCAS Template", "FlyByWireless.TCAS", "/plugins/tcas/64/lin.xpl");

        assert_eq!(count(), 2);
        let all: Vec<_> = plugins().collect();
        assert_eq!(all[0].id, PluginId::XPLANE);
        assert_eq!(all[1].name, "TCAS Template");
        assert_eq!(all[1].file_path, "/plugins/tcas/64/lin.xpl");

        let id = find_by_signature("FlyByWireless.TCAS").unwrap();
        assert_eq!(find_by_path("/plugins/tcas/64/lin.xpl"), Some(id));
        assert_eq!(find_by_signature("nobody"), None);
        assert_eq!(nth(99), None);

        assert!(id.is_enabled());
        id.set_enabled(false);
        assert!(!id.is_enabled());
        assert!(id.set_enabled(true));
        assert_eq!(id.info().signature, "FlyByWireless.TCAS");
    }

    #[test]
    fn messages_target_one_or_all() {
        let host = TestHost::new();
        send_message(Some(PluginId(1)), 0x8000_0001u32 as i32, std::ptr::null_mut());
        broadcast(messages::PLANE_LOADED, std::ptr::null_mut());
        assert_eq!(
            host.sent_messages(),
            vec![(1, 0x8000_0001u32 as i32), (-1, messages::PLANE_LOADED)]
        );
    }

    #[test]
    fn features_enumerate_and_toggle() {
        let _host = TestHost::new();
        let names: Vec<_> = enumerate_features().into_iter().map(|f| f.name).collect();
        assert!(names.contains(&"XPLM_USE_NATIVE_PATHS".to_owned()));

        let native_paths = has_feature("XPLM_USE_NATIVE_PATHS").unwrap();
        assert!(!native_paths.is_enabled());
        native_paths.set_enabled(true).unwrap();
        assert!(native_paths.is_enabled());
        assert!(has_feature("XPLM_TIME_TRAVEL").is_none());
    }
}
