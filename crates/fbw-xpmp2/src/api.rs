//! XPMP2 function table.
//!
//! Loaded and installed the same way as the XPLM tables: resolved once, then reached through
//! [`xpmp2`] for the rest of the plugin's life.

use fbw_xplm::api::{open_host_library, Library, Refcon};
use fbw_xplm::{XplmError, XplmResult};
use std::ffi::{c_char, c_int, c_long, c_uint, c_void};
use std::sync::OnceLock;

/// `XPMPIntPrefsFuncTy`
pub type IntPrefsFn = Option<unsafe extern "C" fn(section: *const c_char, key: *const c_char, default: c_int) -> c_int>;
/// `XPMPPlaneData_f`
pub type PlaneDataFn =
    Option<unsafe extern "C" fn(plane: c_uint, data_type: c_int, data: *mut c_void, refcon: Refcon) -> c_int>;
/// Completion of a deferred `XPMPMultiplayerEnable`.
pub type EnableDoneFn = Option<unsafe extern "C" fn(refcon: Refcon)>;

fbw_xplm::api_table! {
    /// `XPMP2` library exports.
    pub struct Xpmp2Api {
        multiplayer_init = "XPMPMultiplayerInit": fn(
            plugin_name: *const c_char,
            resource_dir: *const c_char,
            int_prefs: IntPrefsFn,
            default_icao: *const c_char,
            log_acronym: *const c_char,
        ) -> *const c_char;
        multiplayer_cleanup = "XPMPMultiplayerCleanup": fn();

        contrails_auto_enabled = "XPMPContrailsAutoEnabled": fn() -> bool;
        contrails_available = "XPMPContrailsAvailable": fn() -> bool;

        sound_enable = "XPMPSoundEnable": fn(enable: bool) -> bool;
        sound_is_enabled = "XPMPSoundIsEnabled": fn() -> bool;
        sound_set_master_volume = "XPMPSoundSetMasterVolume": fn(volume: f32);
        sound_mute = "XPMPSoundMute": fn(mute: bool);
        sound_add = "XPMPSoundAdd": fn(
            name: *const c_char,
            file_path: *const c_char,
            looping: bool,
            cone_dir: f32,
            cone_pitch: f32,
            cone_in_angle: f32,
            cone_out_angle: f32,
            cone_out_volume: f32,
        ) -> *const c_char;
        sound_enumerate = "XPMPSoundEnumerate": fn(prev_name: *const c_char, file_path: *mut *const c_char) -> *const c_char;

        multiplayer_enable = "XPMPMultiplayerEnable": fn(callback: EnableDoneFn, refcon: Refcon) -> *const c_char;
        multiplayer_disable = "XPMPMultiplayerDisable": fn();
        has_control_of_ai_aircraft = "XPMPHasControlOfAIAircraft": fn() -> bool;

        load_csl_package = "XPMPLoadCSLPackage": fn(folder: *const c_char) -> *const c_char;
        get_number_of_installed_models = "XPMPGetNumberOfInstalledModels": fn() -> c_int;
        get_model_info = "XPMPGetModelInfo": fn(
            index: c_int,
            model_name: *mut *const c_char,
            icao: *mut *const c_char,
            airline: *mut *const c_char,
            livery: *mut *const c_char,
        );
        model_match_quality = "XPMPModelMatchQuality": fn(icao: *const c_char, airline: *const c_char, livery: *const c_char) -> c_int;
        is_icao_valid = "XPMPIsICAOValid": fn(icao: *const c_char) -> bool;

        count_planes = "XPMPCountPlanes": fn() -> c_long;
        set_default_plane_icao = "XPMPSetDefaultPlaneICAO": fn(aircraft: *const c_char, vehicle: *const c_char);
        enable_aircraft_labels = "XPMPEnableAircraftLabels": fn(enable: bool);
        drawing_aircraft_labels = "XPMPDrawingAircraftLabels": fn() -> bool;
        set_aircraft_label_dist = "XPMPSetAircraftLabelDist": fn(dist_nm: f32, cut_off_at_visibility: bool);
        enable_map = "XPMPEnableMap": fn(enable: bool, labels: bool);

        create_plane_with_model_name = "XPMPCreatePlaneWithModelName": fn(
            model_name: *const c_char,
            icao: *const c_char,
            airline: *const c_char,
            livery: *const c_char,
            data_fn: PlaneDataFn,
            refcon: Refcon,
            mode_s_id: c_uint,
        ) -> c_uint;
        destroy_plane = "XPMPDestroyPlane": fn(plane: c_uint);
        set_plane_visibility = "XPMPSetPlaneVisibility": fn(plane: c_uint, visible: bool);
        change_plane_model = "XPMPChangePlaneModel": fn(
            plane: c_uint,
            icao: *const c_char,
            airline: *const c_char,
            livery: *const c_char,
        ) -> c_int;
        get_plane_model_name = "XPMPGetPlaneModelName": fn(plane: c_uint, buf: *mut c_char, buf_size: c_int) -> c_int;
        get_plane_model_quality = "XPMPGetPlaneModelQuality": fn(plane: c_uint) -> c_int;
    }
}

/// Opens XPMP2 as a shared library, or finds it linked into the plugin itself.
pub fn open_library() -> XplmResult<Library> {
    let name = libloading::library_filename("XPMP2");
    match unsafe { Library::new(&name) } {
        Ok(lib) => Ok(lib),
        Err(e) => {
            log::debug!(target: "xpmp2", "no shared XPMP2 ({e}), looking in the process image");
            open_host_library("XPMP2")
        }
    }
}

static XPMP2_API: OnceLock<Xpmp2Api> = OnceLock::new();

pub fn install(api: Xpmp2Api) -> XplmResult<()> {
    XPMP2_API.set(api).map_err(|_| XplmError::AlreadyInstalled)
}

/// Loads the table unless one is already installed.
pub fn ensure_loaded() -> XplmResult<()> {
    if XPMP2_API.get().is_some() {
        return Ok(());
    }
    let lib = open_library()?;
    let api = unsafe { Xpmp2Api::load(&lib)? };
    // Stays mapped until the plugin is unloaded.
    std::mem::forget(lib);
    match install(api) {
        Ok(()) | Err(XplmError::AlreadyInstalled) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(any(test, feature = "test-host"))]
pub(crate) fn install_with(f: impl FnOnce() -> Xpmp2Api) {
    XPMP2_API.get_or_init(f);
}

#[inline]
pub(crate) fn xpmp2() -> &'static Xpmp2Api {
    XPMP2_API.get().expect("XPMP2 table not installed")
}
