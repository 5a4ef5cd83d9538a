//! Host paths, versions, logging and other utilities.

use crate::api::{try_api, xplm};
use crate::callback::guard;
use crate::defs::VirtualKey;
use crate::error::{XplmError, XplmResult};
use crate::strings::{from_ptr, to_cstring, FixedBuf, PATH_BUF};
use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_void, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum DataFileType {
    Situation = 1,
    ReplayMovie = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LanguageCode {
    Unknown,
    English,
    French,
    German,
    Italian,
    Spanish,
    Korean,
    Russian,
    Greek,
    Japanese,
    Chinese,
}

impl LanguageCode {
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            1 => Self::English,
            2 => Self::French,
            3 => Self::German,
            4 => Self::Italian,
            5 => Self::Spanish,
            6 => Self::Korean,
            7 => Self::Russian,
            8 => Self::Greek,
            9 => Self::Japanese,
            10 => Self::Chinese,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Versions {
    /// Simulator version, e.g. 12100 for 12.1.0.
    pub xplane: i32,
    /// SDK version, e.g. 400.
    pub xplm: i32,
    pub host_id: i32,
}

/// Writes to the host's `Log.txt`. Does nothing before the host table is installed.
pub fn debug_string(text: &str) {
    let Some(api) = try_api() else {
        return;
    };
    let text = CString::new(text.replace('\0', " ")).unwrap_or_default();
    unsafe { (api.xplm.debug_string)(text.as_ptr()) };
}

pub fn speak_string(text: &str) -> XplmResult<()> {
    let text = to_cstring(text)?;
    unsafe { (xplm().speak_string)(text.as_ptr()) };
    Ok(())
}

/// Full path of the simulator folder, with a trailing separator.
pub fn system_path() -> String {
    let mut buf = FixedBuf::<PATH_BUF>::new();
    unsafe { (xplm().get_system_path)(buf.as_mut_ptr()) };
    buf.to_string_lossy()
}

/// Full path of the preferences file.
pub fn prefs_path() -> String {
    let mut buf = FixedBuf::<PATH_BUF>::new();
    unsafe { (xplm().get_prefs_path)(buf.as_mut_ptr()) };
    buf.to_string_lossy()
}

pub fn directory_separator() -> char {
    let sep = unsafe { from_ptr((xplm().get_directory_separator)()) };
    sep.and_then(|s| s.chars().next()).unwrap_or('/')
}

/// Splits a host path into its directory and file name at the last host separator.
pub fn extract_file_and_path(full_path: &str) -> (&str, &str) {
    match full_path.rfind(directory_separator()) {
        Some(i) => (&full_path[..i], &full_path[i + 1..]),
        None => ("", full_path),
    }
}

/// Regular files directly inside `dir`, sorted by name.
pub fn directory_files(dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn optional_path(path: Option<&str>) -> XplmResult<Option<CString>> {
    path.map(to_cstring).transpose()
}

pub fn load_data_file(file_type: DataFileType, path: Option<&str>) -> XplmResult<bool> {
    let path = optional_path(path)?;
    let ptr = path.as_ref().map_or(std::ptr::null(), |p| p.as_ptr());
    Ok(unsafe { (xplm().load_data_file)(file_type as c_int, ptr) } != 0)
}

pub fn save_data_file(file_type: DataFileType, path: Option<&str>) -> XplmResult<bool> {
    let path = optional_path(path)?;
    let ptr = path.as_ref().map_or(std::ptr::null(), |p| p.as_ptr());
    Ok(unsafe { (xplm().save_data_file)(file_type as c_int, ptr) } != 0)
}

pub fn versions() -> Versions {
    let (mut xplane, mut sdk, mut host_id) = (0, 0, 0);
    unsafe { (xplm().get_versions)(&mut xplane, &mut sdk, &mut host_id) };
    Versions {
        xplane,
        xplm: sdk,
        host_id,
    }
}

/// Fails with [`XplmError::Unsupported`] when the host SDK is older than `min_xplm`.
pub fn require_xplm_version(min_xplm: i32) -> XplmResult<Versions> {
    let v = versions();
    if v.xplm < min_xplm {
        return Err(XplmError::Unsupported(format!(
            "XPLM {} is older than the required {}",
            v.xplm, min_xplm
        )));
    }
    Ok(v)
}

#[inline]
pub fn language() -> LanguageCode {
    LanguageCode::from_raw(unsafe { (xplm().get_language)() })
}

/// Looks up a symbol exported by the host or another plugin.
pub fn find_symbol(name: &str) -> Option<NonNull<c_void>> {
    let name = to_cstring(name).ok()?;
    NonNull::new(unsafe { (xplm().find_symbol)(name.as_ptr()) })
}

pub fn virtual_key_description(key: VirtualKey) -> Option<String> {
    unsafe { from_ptr((xplm().get_virtual_key_description)(key as u8 as c_char)) }
}

#[inline]
pub fn reload_scenery() {
    unsafe { (xplm().reload_scenery)() }
}

thread_local! {
    static ERROR_CALLBACK: RefCell<Option<Box<dyn FnMut(&str)>>> = RefCell::new(None);
}

unsafe extern "C" fn error_trampoline(message: *const c_char) {
    let message = unsafe { from_ptr(message) }.unwrap_or_default();
    guard("error callback", (), || {
        let Some(mut callback) = ERROR_CALLBACK.with(|slot| slot.borrow_mut().take()) else {
            return;
        };
        callback(&message);
        ERROR_CALLBACK.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some(callback);
            }
        });
    })
}

/// Installs (or with `None`, removes) the callback for SDK misuse errors.
///
/// The host only reports errors while it runs in its debug mode.
pub fn set_error_callback(callback: Option<Box<dyn FnMut(&str)>>) {
    let install = callback.is_some();
    ERROR_CALLBACK.with(|slot| *slot.borrow_mut() = callback);
    unsafe { (xplm().set_error_callback)(install.then_some(error_trampoline as _)) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;
    use std::rc::Rc;

    #[test]
    fn paths_come_from_host_buffers() {
        let host = TestHost::new();
        host.set_system_path("/opt/X-Plane 12/");
        assert_eq!(system_path(), "/opt/X-Plane 12/");
        assert!(prefs_path().ends_with("X-Plane.prf"));
        assert_eq!(directory_separator(), '/');
        assert_eq!(
            extract_file_and_path("/opt/X-Plane 12/Output/situations/KSEA.sit"),
            ("/opt/X-Plane 12/Output/situations", "KSEA.sit")
        );
        assert_eq!(extract_file_and_path("KSEA.sit"), ("", "KSEA.sit"));
    }

    #[test]
    fn version_gate() {
        let host = TestHost::new();
        host.set_versions(12100, 400);
        assert_eq!(require_xplm_version(303).unwrap().xplane, 12100);

        host.set_versions(11550, 302);
        assert!(matches!(require_xplm_version(303), Err(XplmError::Unsupported(_))));
    }

    #[test]
    fn debug_string_reaches_host_log() {
        let host = TestHost::new();
        debug_string("hello\0world\n");
        assert_eq!(host.debug_log(), "hello world\n");
    }

    #[test]
    fn data_files_and_misc() {
        let host = TestHost::new();
        assert!(load_data_file(DataFileType::Situation, Some("Output/situations/KSEA.sit")).unwrap());
        assert!(!save_data_file(DataFileType::ReplayMovie, None).unwrap());
        assert!(load_data_file(DataFileType::Situation, Some("a\0b")).is_err());
        assert_eq!(language(), LanguageCode::English);
        assert!(find_symbol("XPLMNotAThing").is_none());
        assert_eq!(virtual_key_description(VirtualKey::F1).as_deref(), Some("F1"));
        speak_string("Traffic, traffic").unwrap();
        assert_eq!(host.spoken(), vec!["Traffic, traffic".to_owned()]);
        reload_scenery();
        assert_eq!(host.calls("XPLMReloadScenery"), 1);
    }

    #[test]
    fn error_callback_receives_host_errors() {
        let host = TestHost::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        set_error_callback(Some(Box::new(move |msg: &str| sink.borrow_mut().push(msg.to_owned()))));

        host.raise_error("bad dataref handle");
        assert_eq!(*seen.borrow(), vec!["bad dataref handle".to_owned()]);

        set_error_callback(None);
        host.raise_error("ignored");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn directory_listing_only_returns_files() {
        let dir = std::env::temp_dir().join(format!("fbw-xplm-dir-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("b.txt"), "b").unwrap();
        std::fs::write(dir.join("a.txt"), "a").unwrap();

        let files = directory_files(&dir).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
