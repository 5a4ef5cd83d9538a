//! A simulated XPMP2 library for tests.
//!
//! [`Xpmp2TestHost::new`] installs the simulated XPLM host as well, so panics caught in
//! trampolines land in its debug log. The model is per thread, like the XPLM one.

use crate::aircraft::{data_type, PlaneInfoTexts, PlanePosition, PlaneRadar, PlaneSurfaces};
use crate::aircraft::PlaneId;
use crate::api::{self, EnableDoneFn, IntPrefsFn, PlaneDataFn, Xpmp2Api};
use fbw_xplm::api::Refcon;
use fbw_xplm::strings::from_ptr;
use fbw_xplm::test_host::TestHost;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::ffi::{c_char, c_int, c_long, c_uint, c_void, CStr, CString};

/// Arguments of the last `XPMPMultiplayerInit`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitArgs {
    pub plugin_name: String,
    pub resource_dir: String,
    pub default_icao: Option<String>,
    pub log_acronym: Option<String>,
}

/// What one pull of all four data blocks produced.
#[derive(Clone, Debug, Default)]
pub struct Pulled {
    /// Raw callback results for position, surfaces, radar and info texts.
    pub statuses: [c_int; 4],
    pub position: Option<PlanePosition>,
    pub surfaces: Option<PlaneSurfaces>,
    pub radar: Option<PlaneRadar>,
    pub info: Option<PlaneInfoTexts>,
}

struct FakeModel {
    name: CString,
    icao: String,
    airline: String,
    livery: String,
    c_icao: CString,
    c_airline: CString,
    c_livery: CString,
}

struct FakePlane {
    icao: String,
    airline: String,
    livery: String,
    model: String,
    quality: c_int,
    visible: bool,
    data_fn: PlaneDataFn,
    refcon: Refcon,
}

struct State {
    calls: HashMap<&'static str, usize>,
    fail_next: Option<String>,
    message: CString,
    init: InitArgs,
    prefs_answers: Vec<(String, String, i32)>,
    sound_enabled: bool,
    volume: f32,
    muted: bool,
    sounds: Vec<(CString, CString)>,
    ai_held: bool,
    enabled: bool,
    pending_enable: Option<(EnableDoneFn, Refcon)>,
    models: Vec<FakeModel>,
    labels: bool,
    label_dist: (f32, bool),
    map: (bool, bool),
    default_icao: (String, Option<String>),
    refuse: bool,
    planes: BTreeMap<c_uint, FakePlane>,
    destroyed: HashMap<c_uint, (PlaneDataFn, Refcon)>,
    next_id: c_uint,
}

impl State {
    fn new() -> Self {
        Self {
            calls: HashMap::new(),
            fail_next: None,
            message: CString::default(),
            init: InitArgs::default(),
            prefs_answers: Vec::new(),
            sound_enabled: false,
            volume: 1.0,
            muted: false,
            sounds: Vec::new(),
            ai_held: false,
            enabled: false,
            pending_enable: None,
            models: Vec::new(),
            labels: false,
            label_dist: (3.0, true),
            map: (true, true),
            default_icao: ("A320".to_owned(), None),
            refuse: false,
            planes: BTreeMap::new(),
            destroyed: HashMap::new(),
            next_id: 0xAB0001,
        }
    }

    /// Keeps `msg` alive until the next message and returns it the way the library does.
    fn error(&mut self, msg: &str) -> *const c_char {
        self.message = CString::new(msg).unwrap_or_default();
        self.message.as_ptr()
    }

    fn take_failure(&mut self) -> Option<*const c_char> {
        let msg = self.fail_next.take()?;
        Some(self.error(&msg))
    }

    /// Best model for the request: 0 full match, 1 type and airline, 2 type only.
    fn best_model(&self, icao: &str, airline: &str, livery: &str) -> Option<(String, c_int)> {
        self.models
            .iter()
            .filter(|m| m.icao == icao)
            .map(|m| {
                let q = match (m.airline == airline, m.livery == livery) {
                    (true, true) => 0,
                    (true, false) => 1,
                    _ => 2,
                };
                (m.name.to_string_lossy().into_owned(), q)
            })
            .min_by_key(|(_, q)| *q)
    }
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::new());
}

fn with<R>(f: impl FnOnce(&mut State) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

fn hit(symbol: &'static str) {
    with(|s| *s.calls.entry(symbol).or_default() += 1);
}

fn text(ptr: *const c_char) -> Option<String> {
    unsafe { from_ptr(ptr) }
}

const OK: &CStr = c"";

unsafe extern "C" fn multiplayer_init(
    plugin_name: *const c_char,
    resource_dir: *const c_char,
    int_prefs: IntPrefsFn,
    default_icao: *const c_char,
    log_acronym: *const c_char,
) -> *const c_char {
    hit("XPMPMultiplayerInit");
    if let Some(err) = with(State::take_failure) {
        return err;
    }
    with(|s| {
        s.init = InitArgs {
            plugin_name: text(plugin_name).unwrap_or_default(),
            resource_dir: text(resource_dir).unwrap_or_default(),
            default_icao: text(default_icao),
            log_acronym: text(log_acronym),
        };
        s.prefs_answers.clear();
    });
    if let Some(f) = int_prefs {
        for (section, key, default) in [
            (c"planes", c"clamp_all_to_ground", 1),
            (c"debug", c"log_level", 2),
            (c"debug", c"model_matching", 0),
        ] {
            let value = unsafe { f(section.as_ptr(), key.as_ptr(), default) };
            let answer = (
                section.to_string_lossy().into_owned(),
                key.to_string_lossy().into_owned(),
                value,
            );
            with(|s| s.prefs_answers.push(answer));
        }
    }
    OK.as_ptr()
}

unsafe extern "C" fn multiplayer_cleanup() {
    hit("XPMPMultiplayerCleanup");
    with(|s| s.enabled = false);
}

unsafe extern "C" fn contrails_auto_enabled() -> bool {
    true
}

unsafe extern "C" fn contrails_available() -> bool {
    false
}

unsafe extern "C" fn sound_enable(enable: bool) -> bool {
    with(|s| {
        s.sound_enabled = enable;
        s.sound_enabled
    })
}

unsafe extern "C" fn sound_is_enabled() -> bool {
    with(|s| s.sound_enabled)
}

unsafe extern "C" fn sound_set_master_volume(volume: f32) {
    with(|s| s.volume = volume);
}

unsafe extern "C" fn sound_mute(mute: bool) {
    with(|s| s.muted = mute);
}

unsafe extern "C" fn sound_add(
    name: *const c_char,
    file_path: *const c_char,
    _looping: bool,
    _cone_dir: f32,
    _cone_pitch: f32,
    _cone_in_angle: f32,
    _cone_out_angle: f32,
    _cone_out_volume: f32,
) -> *const c_char {
    hit("XPMPSoundAdd");
    let name = text(name).unwrap_or_default();
    let path = text(file_path).unwrap_or_default();
    with(|s| {
        if s.sounds.iter().any(|(n, _)| n.to_bytes() == name.as_bytes()) {
            return s.error("Sound with that name already exists");
        }
        let entry = (CString::new(name).unwrap_or_default(), CString::new(path).unwrap_or_default());
        s.sounds.push(entry);
        OK.as_ptr()
    })
}

unsafe extern "C" fn sound_enumerate(prev_name: *const c_char, file_path: *mut *const c_char) -> *const c_char {
    let prev = text(prev_name);
    with(|s| {
        let next = match prev {
            None => 0,
            Some(prev) => match s.sounds.iter().position(|(n, _)| n.to_bytes() == prev.as_bytes()) {
                Some(i) => i + 1,
                None => return std::ptr::null(),
            },
        };
        let Some((name, path)) = s.sounds.get(next) else {
            return std::ptr::null();
        };
        if !file_path.is_null() {
            unsafe { *file_path = path.as_ptr() };
        }
        name.as_ptr()
    })
}

unsafe extern "C" fn multiplayer_enable(callback: EnableDoneFn, refcon: Refcon) -> *const c_char {
    hit("XPMPMultiplayerEnable");
    with(|s| {
        if s.ai_held {
            if callback.is_some() {
                s.pending_enable = Some((callback, refcon));
            }
            return s.error("Could not acquire AI/multiplayer planes, held by another plugin");
        }
        s.enabled = true;
        OK.as_ptr()
    })
}

unsafe extern "C" fn multiplayer_disable() {
    with(|s| s.enabled = false);
}

unsafe extern "C" fn has_control_of_ai_aircraft() -> bool {
    with(|s| s.enabled)
}

unsafe extern "C" fn load_csl_package(folder: *const c_char) -> *const c_char {
    hit("XPMPLoadCSLPackage");
    let folder = text(folder).unwrap_or_default();
    with(|s| {
        if folder.starts_with("missing") {
            return s.error("CSL folder not found");
        }
        OK.as_ptr()
    })
}

unsafe extern "C" fn get_number_of_installed_models() -> c_int {
    with(|s| s.models.len() as c_int)
}

unsafe extern "C" fn get_model_info(
    index: c_int,
    model_name: *mut *const c_char,
    icao: *mut *const c_char,
    airline: *mut *const c_char,
    livery: *mut *const c_char,
) {
    with(|s| {
        let Some(m) = usize::try_from(index).ok().and_then(|i| s.models.get(i)) else {
            return;
        };
        for (out, value) in [
            (model_name, &m.name),
            (icao, &m.c_icao),
            (airline, &m.c_airline),
            (livery, &m.c_livery),
        ] {
            if !out.is_null() {
                unsafe { *out = value.as_ptr() };
            }
        }
    })
}

unsafe extern "C" fn model_match_quality(icao: *const c_char, airline: *const c_char, livery: *const c_char) -> c_int {
    let (icao, airline, livery) = (text(icao), text(airline), text(livery));
    with(|s| {
        s.best_model(
            icao.as_deref().unwrap_or_default(),
            airline.as_deref().unwrap_or_default(),
            livery.as_deref().unwrap_or_default(),
        )
        .map_or(-1, |(_, q)| q)
    })
}

unsafe extern "C" fn is_icao_valid(icao: *const c_char) -> bool {
    let Some(icao) = text(icao) else {
        return false;
    };
    (2..=4).contains(&icao.len())
        && icao.starts_with(|c: char| c.is_ascii_uppercase())
        && icao.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

unsafe extern "C" fn count_planes() -> c_long {
    with(|s| s.planes.len() as c_long)
}

unsafe extern "C" fn set_default_plane_icao(aircraft: *const c_char, vehicle: *const c_char) {
    let value = (text(aircraft).unwrap_or_default(), text(vehicle));
    with(|s| s.default_icao = value);
}

unsafe extern "C" fn enable_aircraft_labels(enable: bool) {
    with(|s| s.labels = enable);
}

unsafe extern "C" fn drawing_aircraft_labels() -> bool {
    with(|s| s.labels)
}

unsafe extern "C" fn set_aircraft_label_dist(dist_nm: f32, cut_off_at_visibility: bool) {
    with(|s| s.label_dist = (dist_nm, cut_off_at_visibility));
}

unsafe extern "C" fn enable_map(enable: bool, labels: bool) {
    with(|s| s.map = (enable, labels));
}

unsafe extern "C" fn create_plane_with_model_name(
    model_name: *const c_char,
    icao: *const c_char,
    airline: *const c_char,
    livery: *const c_char,
    data_fn: PlaneDataFn,
    refcon: Refcon,
    mode_s_id: c_uint,
) -> c_uint {
    hit("XPMPCreatePlaneWithModelName");
    let forced = text(model_name);
    let (icao, airline, livery) = (
        text(icao).unwrap_or_default(),
        text(airline).unwrap_or_default(),
        text(livery).unwrap_or_default(),
    );
    with(|s| {
        if s.refuse {
            return 0;
        }
        let id = if mode_s_id != 0 {
            mode_s_id
        } else {
            s.next_id += 1;
            s.next_id
        };
        let (model, quality) = match forced {
            Some(name) => (name, 0),
            None => s.best_model(&icao, &airline, &livery).unwrap_or_default(),
        };
        let quality = if model.is_empty() { -1 } else { quality };
        s.planes.insert(
            id,
            FakePlane {
                icao,
                airline,
                livery,
                model,
                quality,
                visible: true,
                data_fn,
                refcon,
            },
        );
        id
    })
}

unsafe extern "C" fn destroy_plane(plane: c_uint) {
    hit("XPMPDestroyPlane");
    with(|s| {
        if let Some(p) = s.planes.remove(&plane) {
            s.destroyed.insert(plane, (p.data_fn, p.refcon));
        }
    })
}

unsafe extern "C" fn set_plane_visibility(plane: c_uint, visible: bool) {
    with(|s| {
        if let Some(p) = s.planes.get_mut(&plane) {
            p.visible = visible;
        }
    })
}

unsafe extern "C" fn change_plane_model(
    plane: c_uint,
    icao: *const c_char,
    airline: *const c_char,
    livery: *const c_char,
) -> c_int {
    let (icao, airline, livery) = (text(icao), text(airline), text(livery));
    with(|s| {
        let Some(p) = s.planes.get(&plane) else {
            return -1;
        };
        let icao = icao.unwrap_or_else(|| p.icao.clone());
        let airline = airline.unwrap_or_else(|| p.airline.clone());
        let livery = livery.unwrap_or_else(|| p.livery.clone());
        let (model, quality) = s.best_model(&icao, &airline, &livery).unwrap_or((String::new(), -1));
        if let Some(p) = s.planes.get_mut(&plane) {
            (p.icao, p.airline, p.livery) = (icao, airline, livery);
            (p.model, p.quality) = (model, quality);
        }
        quality
    })
}

unsafe extern "C" fn get_plane_model_name(plane: c_uint, buf: *mut c_char, buf_size: c_int) -> c_int {
    with(|s| {
        let Some(p) = s.planes.get(&plane) else {
            return 0;
        };
        let bytes = p.model.as_bytes();
        if !buf.is_null() && buf_size > 0 {
            let n = bytes.len().min(buf_size as usize - 1);
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        bytes.len() as c_int
    })
}

unsafe extern "C" fn get_plane_model_quality(plane: c_uint) -> c_int {
    with(|s| s.planes.get(&plane).map_or(-1, |p| p.quality))
}

fn fake_xpmp2() -> Xpmp2Api {
    Xpmp2Api {
        multiplayer_init,
        multiplayer_cleanup,
        contrails_auto_enabled,
        contrails_available,
        sound_enable,
        sound_is_enabled,
        sound_set_master_volume,
        sound_mute,
        sound_add,
        sound_enumerate,
        multiplayer_enable,
        multiplayer_disable,
        has_control_of_ai_aircraft,
        load_csl_package,
        get_number_of_installed_models,
        get_model_info,
        model_match_quality,
        is_icao_valid,
        count_planes,
        set_default_plane_icao,
        enable_aircraft_labels,
        drawing_aircraft_labels,
        set_aircraft_label_dist,
        enable_map,
        create_plane_with_model_name,
        destroy_plane,
        set_plane_visibility,
        change_plane_model,
        get_plane_model_name,
        get_plane_model_quality,
    }
}

/// Pulls one block the way the library does, into a buffer of its own.
fn pull_one<T: Default>(f: PlaneDataFn, id: c_uint, ty: c_int, refcon: Refcon) -> (c_int, Option<T>) {
    let Some(f) = f else {
        return (0, None);
    };
    let mut buf = T::default();
    let status = unsafe { f(id, ty, (&mut buf as *mut T).cast::<c_void>(), refcon) };
    (status, (status == 2).then_some(buf))
}

/// Handle on the simulated XPMP2 library (and XPLM host) for the current thread.
pub struct Xpmp2TestHost {
    xplm: TestHost,
}

impl Default for Xpmp2TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Xpmp2TestHost {
    pub fn new() -> Self {
        let xplm = TestHost::new();
        api::install_with(fake_xpmp2);
        STATE.with(|s| *s.borrow_mut() = State::new());
        Self { xplm }
    }

    /// The simulated XPLM host installed alongside.
    #[inline]
    pub fn xplm(&self) -> &TestHost {
        &self.xplm
    }

    pub fn calls(&self, symbol: &str) -> usize {
        with(|s| s.calls.get(symbol).copied().unwrap_or(0))
    }

    /// The next init call fails with `msg`.
    pub fn fail_next(&self, msg: &str) {
        with(|s| s.fail_next = Some(msg.to_owned()));
    }

    pub fn init_args(&self) -> InitArgs {
        with(|s| s.init.clone())
    }

    /// `(section, key, answer)` for each preference the library asked for during init.
    pub fn prefs_answers(&self) -> Vec<(String, String, i32)> {
        with(|s| s.prefs_answers.clone())
    }

    /// `(master volume, muted)`
    pub fn sound_settings(&self) -> (f32, bool) {
        with(|s| (s.volume, s.muted))
    }

    /// Simulates another plugin holding the AI planes.
    pub fn hold_ai(&self, held: bool) {
        with(|s| s.ai_held = held);
    }

    /// The other plugin lets go; a deferred enable completes.
    pub fn release_ai(&self) {
        let pending = with(|s| {
            s.ai_held = false;
            let pending = s.pending_enable.take();
            if pending.is_some() {
                s.enabled = true;
            }
            pending
        });
        if let Some((Some(f), refcon)) = pending {
            unsafe { f(refcon) };
        }
    }

    pub fn define_model(&self, name: &str, icao: &str, airline: &str, livery: &str) {
        let c = |v: &str| CString::new(v).unwrap_or_default();
        with(|s| {
            s.models.push(FakeModel {
                name: c(name),
                icao: icao.to_owned(),
                airline: airline.to_owned(),
                livery: livery.to_owned(),
                c_icao: c(icao),
                c_airline: c(airline),
                c_livery: c(livery),
            })
        });
    }

    pub fn label_dist(&self) -> (f32, bool) {
        with(|s| s.label_dist)
    }

    pub fn map(&self) -> (bool, bool) {
        with(|s| s.map)
    }

    pub fn default_icao(&self) -> (String, Option<String>) {
        with(|s| s.default_icao.clone())
    }

    pub fn refuse_creation(&self, refuse: bool) {
        with(|s| s.refuse = refuse);
    }

    pub fn plane_count(&self) -> usize {
        with(|s| s.planes.len())
    }

    pub fn plane_visible(&self, id: PlaneId) -> bool {
        with(|s| s.planes.get(&id.0).is_some_and(|p| p.visible))
    }

    /// Asks the plane for all four data blocks, as the library does every frame.
    pub fn pull(&self, id: PlaneId) -> Pulled {
        let Some((f, refcon)) = with(|s| s.planes.get(&id.0).map(|p| (p.data_fn, p.refcon))) else {
            return Pulled::default();
        };
        let (p, position) = pull_one::<PlanePosition>(f, id.0, data_type::POSITION, refcon);
        let (su, surfaces) = pull_one::<PlaneSurfaces>(f, id.0, data_type::SURFACES, refcon);
        let (r, radar) = pull_one::<PlaneRadar>(f, id.0, data_type::RADAR, refcon);
        let (i, info) = pull_one::<PlaneInfoTexts>(f, id.0, data_type::INFO_TEXTS, refcon);
        Pulled {
            statuses: [p, su, r, i],
            position,
            surfaces,
            radar,
            info,
        }
    }

    /// Position pull with the callback and refcon of an already destroyed plane.
    pub fn stale_pull(&self, id: PlaneId) -> c_int {
        let Some((f, refcon)) = with(|s| s.destroyed.get(&id.0).copied()) else {
            return 0;
        };
        pull_one::<PlanePosition>(f, id.0, data_type::POSITION, refcon).0
    }
}
