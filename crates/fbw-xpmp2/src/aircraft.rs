//! Aircraft driven through XPMP2's legacy pull interface.
//!
//! The library asks for each data block through [`plane_data`]; a block is handed over only
//! after a setter changed it, so an idle aircraft costs one flag check per block and frame.

use crate::api::xpmp2;
use bitflags::bitflags;
use fbw_xplm::api::Refcon;
use fbw_xplm::callback::{guard, CallbackArena, CallbackId};
use fbw_xplm::strings::{from_nul_padded, to_cstring, write_truncated};
use fbw_xplm::{XplmError, XplmResult};
use std::cell::RefCell;
use std::ffi::{c_int, c_long, c_uint, c_void, CString};
use std::rc::Rc;

/// `XPMPPlaneID`, which doubles as the transponder hex code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneId(pub u32);

/// `XPMPPlanePosition_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanePosition {
    pub size: c_long,
    pub lat: f64,
    pub lon: f64,
    /// Feet above MSL.
    pub elevation: f64,
    pub pitch: f32,
    pub roll: f32,
    pub heading: f32,
    pub label: [u8; 32],
    pub offset_scale: f32,
    pub clamp_to_ground: bool,
    pub ai_prio: c_int,
    pub label_color: [f32; 4],
    pub multi_idx: c_int,
}

impl Default for PlanePosition {
    fn default() -> Self {
        Self {
            size: std::mem::size_of::<Self>() as c_long,
            lat: 0.0,
            lon: 0.0,
            elevation: 0.0,
            pitch: 0.0,
            roll: 0.0,
            heading: 0.0,
            label: [0; 32],
            offset_scale: 1.0,
            clamp_to_ground: false,
            ai_prio: 1,
            label_color: [1.0, 0.0, 1.0, 1.0],
            multi_idx: 0,
        }
    }
}

bitflags! {
    /// Light bits of `xpmp_LightStatus`; the low 16 bits are the flash time offset.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LightStatus: u32 {
        const TAXI = 1 << 16;
        const LANDING = 1 << 17;
        const BEACON = 1 << 18;
        const STROBE = 1 << 19;
        const NAV = 1 << 20;
    }
}

/// `XPMPPlaneSurfaces_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneSurfaces {
    pub size: c_long,
    pub gear_position: f32,
    pub flap_ratio: f32,
    pub spoiler_ratio: f32,
    pub speed_brake_ratio: f32,
    pub slat_ratio: f32,
    pub wing_sweep: f32,
    pub thrust: f32,
    pub yoke_pitch: f32,
    pub yoke_heading: f32,
    pub yoke_roll: f32,
    /// Raw [`LightStatus`] bits.
    pub lights: u32,
    pub tire_deflect: f32,
    pub tire_rot_degree: f32,
    pub tire_rot_rpm: f32,
    pub eng_rot_degree: f32,
    pub eng_rot_rpm: f32,
    pub prop_rot_degree: f32,
    pub prop_rot_rpm: f32,
    pub revers_ratio: f32,
    pub touch_down: bool,
}

impl Default for PlaneSurfaces {
    fn default() -> Self {
        Self {
            size: std::mem::size_of::<Self>() as c_long,
            gear_position: 0.0,
            flap_ratio: 0.0,
            spoiler_ratio: 0.0,
            speed_brake_ratio: 0.0,
            slat_ratio: 0.0,
            wing_sweep: 0.0,
            thrust: 0.0,
            yoke_pitch: 0.0,
            yoke_heading: 0.0,
            yoke_roll: 0.0,
            lights: 0,
            tire_deflect: 0.0,
            tire_rot_degree: 0.0,
            tire_rot_rpm: 0.0,
            eng_rot_degree: 0.0,
            eng_rot_rpm: 0.0,
            prop_rot_degree: 0.0,
            prop_rot_rpm: 0.0,
            revers_ratio: 0.0,
            touch_down: false,
        }
    }
}

impl PlaneSurfaces {
    #[inline]
    pub fn light_status(&self) -> LightStatus {
        LightStatus::from_bits_retain(self.lights)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum TransponderMode {
    Standby = 0,
    Mode3A = 1,
    #[default]
    ModeC = 2,
    ModeCLow = 3,
    ModeCIdent = 4,
}

/// `XPMPPlaneRadar_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneRadar {
    pub size: c_long,
    /// Squawk, e.g. `7000`.
    pub code: c_long,
    pub mode: TransponderMode,
}

impl Default for PlaneRadar {
    fn default() -> Self {
        Self {
            size: std::mem::size_of::<Self>() as c_long,
            code: 0,
            mode: TransponderMode::ModeC,
        }
    }
}

/// `XPMPInfoTexts_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneInfoTexts {
    pub size: c_long,
    pub tail_num: [u8; 10],
    pub icao_ac_type: [u8; 5],
    pub manufacturer: [u8; 40],
    pub model: [u8; 40],
    pub icao_airline: [u8; 4],
    pub airline: [u8; 40],
    pub flight_num: [u8; 10],
    pub apt_from: [u8; 5],
    pub apt_to: [u8; 5],
}

impl Default for PlaneInfoTexts {
    fn default() -> Self {
        Self {
            size: std::mem::size_of::<Self>() as c_long,
            tail_num: [0; 10],
            icao_ac_type: [0; 5],
            manufacturer: [0; 40],
            model: [0; 40],
            icao_airline: [0; 4],
            airline: [0; 40],
            flight_num: [0; 10],
            apt_from: [0; 5],
            apt_to: [0; 5],
        }
    }
}

/// Texts shown for an aircraft in labels, the map and by traffic-aware plugins.
///
/// Each field is cut to the library's fixed buffer when sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InfoTexts {
    pub tail_number: String,
    pub icao_type: String,
    pub manufacturer: String,
    pub model: String,
    pub icao_airline: String,
    pub airline: String,
    pub flight_number: String,
    pub departure: String,
    pub arrival: String,
}

impl InfoTexts {
    pub fn encode(&self) -> PlaneInfoTexts {
        let mut raw = PlaneInfoTexts::default();
        write_truncated(&mut raw.tail_num, &self.tail_number);
        write_truncated(&mut raw.icao_ac_type, &self.icao_type);
        write_truncated(&mut raw.manufacturer, &self.manufacturer);
        write_truncated(&mut raw.model, &self.model);
        write_truncated(&mut raw.icao_airline, &self.icao_airline);
        write_truncated(&mut raw.airline, &self.airline);
        write_truncated(&mut raw.flight_num, &self.flight_number);
        write_truncated(&mut raw.apt_from, &self.departure);
        write_truncated(&mut raw.apt_to, &self.arrival);
        raw
    }

    pub fn decode(raw: &PlaneInfoTexts) -> Self {
        Self {
            tail_number: from_nul_padded(&raw.tail_num),
            icao_type: from_nul_padded(&raw.icao_ac_type),
            manufacturer: from_nul_padded(&raw.manufacturer),
            model: from_nul_padded(&raw.model),
            icao_airline: from_nul_padded(&raw.icao_airline),
            airline: from_nul_padded(&raw.airline),
            flight_number: from_nul_padded(&raw.flight_num),
            departure: from_nul_padded(&raw.apt_from),
            arrival: from_nul_padded(&raw.apt_to),
        }
    }
}

/// Degrees; heading is true.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub pitch: f32,
    pub heading: f32,
    pub roll: f32,
}

/// `XPMPPlaneCallbackResult`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub(crate) enum DataStatus {
    Unavailable = 0,
    Unchanged = 1,
    NewData = 2,
}

/// `XPMPPlaneDataType`
pub(crate) mod data_type {
    use std::ffi::c_int;

    pub const POSITION: c_int = 1 << 1;
    pub const SURFACES: c_int = 1 << 2;
    pub const RADAR: c_int = 1 << 3;
    pub const INFO_TEXTS: c_int = 1 << 4;
}

struct Block<T> {
    data: T,
    status: DataStatus,
}

impl<T: Copy + Default> Block<T> {
    fn new() -> Self {
        Self {
            data: T::default(),
            status: DataStatus::Unavailable,
        }
    }

    #[inline]
    fn touch(&mut self) -> &mut T {
        self.status = DataStatus::NewData;
        &mut self.data
    }

    /// Copies the block into `dst` if it changed since the last pull.
    ///
    /// # Safety
    /// `dst` must be valid for a write of `T`.
    unsafe fn supply(&mut self, dst: *mut c_void) -> DataStatus {
        match self.status {
            DataStatus::NewData => {
                unsafe { dst.cast::<T>().write_unaligned(self.data) };
                self.status = DataStatus::Unchanged;
                DataStatus::NewData
            }
            other => other,
        }
    }
}

struct PlaneState {
    position: Block<PlanePosition>,
    surfaces: Block<PlaneSurfaces>,
    radar: Block<PlaneRadar>,
    info: Block<PlaneInfoTexts>,
}

impl PlaneState {
    fn new() -> Self {
        Self {
            position: Block::new(),
            surfaces: Block::new(),
            radar: Block::new(),
            info: Block::new(),
        }
    }
}

thread_local! {
    static PLANES: CallbackArena<RefCell<PlaneState>> = CallbackArena::new();
}

unsafe extern "C" fn plane_data(_plane: c_uint, data_type: c_int, data: *mut c_void, refcon: Refcon) -> c_int {
    guard("XPMP2 plane data", DataStatus::Unavailable as c_int, || {
        if data.is_null() {
            return DataStatus::Unavailable as c_int;
        }
        let Some(state) = PLANES.with(|p| p.resolve(refcon)) else {
            return DataStatus::Unavailable as c_int;
        };
        let Ok(mut state) = state.try_borrow_mut() else {
            return DataStatus::Unavailable as c_int;
        };
        let status = unsafe {
            match data_type {
                data_type::POSITION => state.position.supply(data),
                data_type::SURFACES => state.surfaces.supply(data),
                data_type::RADAR => state.radar.supply(data),
                data_type::INFO_TEXTS => state.info.supply(data),
                _ => DataStatus::Unavailable,
            }
        };
        status as c_int
    })
}

/// One aircraft shown by XPMP2. Destroyed on [`destroy`](Self::destroy) or drop.
pub struct LegacyAircraft {
    id: PlaneId,
    state: Rc<RefCell<PlaneState>>,
    ctx: CallbackId,
    released: bool,
}

impl LegacyAircraft {
    /// Creates an aircraft matched by ICAO type, airline and livery.
    ///
    /// `mode_s_id` of `None` lets the library pick an id; `csl_model` forces a specific CSL
    /// model by name instead of matching.
    pub fn new(
        icao_type: &str,
        icao_airline: &str,
        livery: &str,
        mode_s_id: Option<u32>,
        csl_model: Option<&str>,
    ) -> XplmResult<Self> {
        let icao_type = to_cstring(icao_type)?;
        let icao_airline = to_cstring(icao_airline)?;
        let livery = to_cstring(livery)?;
        let csl_model = csl_model.map(to_cstring).transpose()?;

        let state = Rc::new(RefCell::new(PlaneState::new()));
        let ctx = PLANES.with(|p| p.insert(state.clone()));
        let raw = unsafe {
            (xpmp2().create_plane_with_model_name)(
                csl_model.as_deref().map_or(std::ptr::null(), |s| s.as_ptr()),
                icao_type.as_ptr(),
                icao_airline.as_ptr(),
                livery.as_ptr(),
                Some(plane_data),
                ctx.to_refcon(),
                mode_s_id.unwrap_or(0),
            )
        };
        if raw == 0 {
            PLANES.with(|p| p.remove(ctx));
            return Err(XplmError::CreateFailed { what: "aircraft" });
        }
        log::debug!(target: "xpmp2", "created aircraft {raw:06X}");
        Ok(Self {
            id: PlaneId(raw),
            state,
            ctx,
            released: false,
        })
    }

    #[inline]
    pub fn id(&self) -> PlaneId {
        self.id
    }

    pub fn set_location(&self, lat: f64, lon: f64, alt_ft: f64) {
        let mut state = self.state.borrow_mut();
        let pos = state.position.touch();
        pos.lat = lat;
        pos.lon = lon;
        pos.elevation = alt_ft;
    }

    /// `(lat, lon, alt_ft)` as last set.
    pub fn location(&self) -> (f64, f64, f64) {
        let pos = self.state.borrow().position.data;
        (pos.lat, pos.lon, pos.elevation)
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        let mut state = self.state.borrow_mut();
        let pos = state.position.touch();
        pos.pitch = orientation.pitch;
        pos.heading = orientation.heading;
        pos.roll = orientation.roll;
    }

    pub fn orientation(&self) -> Orientation {
        let pos = self.state.borrow().position.data;
        Orientation {
            pitch: pos.pitch,
            heading: pos.heading,
            roll: pos.roll,
        }
    }

    pub fn set_label(&self, label: &str) {
        write_truncated(&mut self.state.borrow_mut().position.touch().label, label);
    }

    /// RGBA, each in `0.0..=1.0`.
    pub fn set_label_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().position.touch().label_color = rgba;
    }

    pub fn set_clamp_to_ground(&self, clamp: bool) {
        self.state.borrow_mut().position.touch().clamp_to_ground = clamp;
    }

    /// Lower values are more likely to get one of the simulator's AI slots.
    pub fn set_ai_priority(&self, prio: i32) {
        self.state.borrow_mut().position.touch().ai_prio = prio;
    }

    /// Index in the multiplayer datarefs, filled in by the library. Zero if none.
    pub fn multiplayer_index(&self) -> i32 {
        self.state.borrow().position.data.multi_idx
    }

    pub fn surfaces(&self) -> PlaneSurfaces {
        self.state.borrow().surfaces.data
    }

    pub fn update_surfaces(&self, f: impl FnOnce(&mut PlaneSurfaces)) {
        let mut state = self.state.borrow_mut();
        let surfaces = state.surfaces.touch();
        f(surfaces);
        surfaces.size = std::mem::size_of::<PlaneSurfaces>() as c_long;
    }

    pub fn set_lights(&self, lights: LightStatus) {
        self.update_surfaces(|s| s.lights = lights.bits());
    }

    pub fn set_radar(&self, code: i64, mode: TransponderMode) {
        let mut state = self.state.borrow_mut();
        let radar = state.radar.touch();
        radar.code = code as c_long;
        radar.mode = mode;
    }

    pub fn radar(&self) -> (i64, TransponderMode) {
        let radar = self.state.borrow().radar.data;
        (radar.code as i64, radar.mode)
    }

    pub fn set_info_texts(&self, texts: &InfoTexts) {
        *self.state.borrow_mut().info.touch() = texts.encode();
    }

    pub fn info_texts(&self) -> InfoTexts {
        InfoTexts::decode(&self.state.borrow().info.data)
    }

    pub fn set_visible(&self, visible: bool) {
        debug_assert!(!self.released);
        unsafe { (xpmp2().set_plane_visibility)(self.id.0, visible) };
    }

    /// Rematches the model. Returns the match quality; lower is better, `-1` means no model.
    pub fn change_model(&self, icao_type: Option<&str>, icao_airline: Option<&str>, livery: Option<&str>) -> XplmResult<i32> {
        let icao_type = icao_type.map(to_cstring).transpose()?;
        let icao_airline = icao_airline.map(to_cstring).transpose()?;
        let livery = livery.map(to_cstring).transpose()?;
        Ok(unsafe {
            (xpmp2().change_plane_model)(self.id.0, opt_ptr(&icao_type), opt_ptr(&icao_airline), opt_ptr(&livery))
        })
    }

    /// Name of the CSL model in use; empty before a model was matched.
    pub fn model_name(&self) -> String {
        let len = unsafe { (xpmp2().get_plane_model_name)(self.id.0, std::ptr::null_mut(), 0) };
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u8; len as usize + 1];
        unsafe { (xpmp2().get_plane_model_name)(self.id.0, buf.as_mut_ptr().cast(), buf.len() as c_int) };
        from_nul_padded(&buf)
    }

    #[inline]
    pub fn model_quality(&self) -> i32 {
        unsafe { (xpmp2().get_plane_model_quality)(self.id.0) }
    }

    #[inline]
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        unsafe { (xpmp2().destroy_plane)(self.id.0) };
        PLANES.with(|p| p.remove(self.ctx));
    }
}

impl Drop for LegacyAircraft {
    fn drop(&mut self) {
        self.release();
    }
}

#[inline]
pub(crate) fn opt_ptr(s: &Option<CString>) -> *const std::ffi::c_char {
    s.as_deref().map_or(std::ptr::null(), |s| s.as_ptr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::Xpmp2TestHost;

    #[test]
    fn exchange_structs_start_with_their_own_size() {
        assert_eq!(PlanePosition::default().size as usize, std::mem::size_of::<PlanePosition>());
        assert_eq!(PlaneSurfaces::default().size as usize, std::mem::size_of::<PlaneSurfaces>());
        assert_eq!(PlaneRadar::default().size as usize, std::mem::size_of::<PlaneRadar>());
        assert_eq!(PlaneInfoTexts::default().size as usize, std::mem::size_of::<PlaneInfoTexts>());
    }

    #[cfg(all(unix, target_pointer_width = "64"))]
    #[test]
    fn exchange_struct_sizes_match_the_library() {
        assert_eq!(std::mem::size_of::<PlanePosition>(), 112);
        assert_eq!(std::mem::size_of::<PlaneSurfaces>(), 88);
        assert_eq!(std::mem::size_of::<PlaneRadar>(), 24);
        assert_eq!(std::mem::size_of::<PlaneInfoTexts>(), 168);
    }

    #[test]
    fn position_defaults() {
        let pos = PlanePosition::default();
        assert_eq!(pos.offset_scale, 1.0);
        assert_eq!(pos.ai_prio, 1);
        assert_eq!(pos.label_color, [1.0, 0.0, 1.0, 1.0]);
        assert_eq!(PlaneRadar::default().mode, TransponderMode::ModeC);
    }

    #[test]
    fn info_texts_are_cut_to_their_buffers() {
        let texts = InfoTexts {
            tail_number: "B-HNR".into(),
            icao_type: "B77W".into(),
            icao_airline: "CPAX".into(),
            flight_number: "CX888".into(),
            departure: "VHHH".into(),
            arrival: "CYVR".into(),
            ..Default::default()
        };
        let back = InfoTexts::decode(&texts.encode());
        assert_eq!(back.tail_number, "B-HNR");
        assert_eq!(back.icao_type, "B77W");
        // 4 byte buffer keeps three characters and the NUL.
        assert_eq!(back.icao_airline, "CPA");
        assert_eq!(back.arrival, "CYVR");
    }

    #[test]
    fn blocks_are_pulled_once_per_change() {
        let host = Xpmp2TestHost::new();
        let plane = LegacyAircraft::new("A320", "DLH", "D-AIPX", Some(0x3C6444), None).unwrap();
        assert_eq!(plane.id(), PlaneId(0x3C6444));

        // Nothing set yet.
        let pulled = host.pull(plane.id());
        assert!(pulled.position.is_none());
        assert_eq!(pulled.statuses, [0, 0, 0, 0]);

        plane.set_location(47.26, 11.34, 1906.0);
        plane.set_orientation(Orientation { pitch: 2.0, heading: 260.0, roll: 0.0 });
        plane.set_lights(LightStatus::NAV | LightStatus::BEACON);
        let pulled = host.pull(plane.id());
        assert_eq!(pulled.statuses, [2, 2, 0, 0]);
        let pos = pulled.position.unwrap();
        assert_eq!((pos.lat, pos.lon, pos.elevation), (47.26, 11.34, 1906.0));
        assert_eq!(pos.heading, 260.0);
        assert_eq!(pos.size as usize, std::mem::size_of::<PlanePosition>());
        assert_eq!(
            pulled.surfaces.unwrap().light_status(),
            LightStatus::NAV | LightStatus::BEACON
        );

        // Handed over, now unchanged until the next setter.
        let pulled = host.pull(plane.id());
        assert_eq!(pulled.statuses, [1, 1, 0, 0]);
        assert!(pulled.position.is_none());

        plane.set_radar(7000, TransponderMode::ModeC);
        plane.set_info_texts(&InfoTexts {
            flight_number: "DLH9CX".into(),
            ..Default::default()
        });
        let pulled = host.pull(plane.id());
        assert_eq!(pulled.statuses, [1, 1, 2, 2]);
        assert_eq!(pulled.radar.unwrap().code, 7000);
        assert_eq!(InfoTexts::decode(&pulled.info.unwrap()).flight_number, "DLH9CX");
        assert_eq!(plane.location(), (47.26, 11.34, 1906.0));
        assert_eq!(plane.radar(), (7000, TransponderMode::ModeC));
    }

    #[test]
    fn model_queries() {
        let host = Xpmp2TestHost::new();
        host.define_model("A320 DLH", "A320", "DLH", "D-AIPX");
        let plane = LegacyAircraft::new("A320", "DLH", "D-AIZZ", None, None).unwrap();
        assert_eq!(plane.model_name(), "A320 DLH");
        assert_eq!(plane.model_quality(), 1);

        assert_eq!(plane.change_model(Some("B738"), None, None).unwrap(), -1);
        assert_eq!(plane.model_name(), "");

        plane.set_visible(false);
        assert!(!host.plane_visible(plane.id()));
    }

    #[test]
    fn forced_csl_model_is_used() {
        let _host = Xpmp2TestHost::new();
        let plane = LegacyAircraft::new("ZZZZ", "", "", None, Some("Glider")).unwrap();
        assert_eq!(plane.model_name(), "Glider");
    }

    #[test]
    fn destroyed_once_and_no_longer_answers() {
        let host = Xpmp2TestHost::new();
        let plane = LegacyAircraft::new("C172", "", "", None, None).unwrap();
        let id = plane.id();
        plane.set_location(1.0, 2.0, 3.0);
        plane.destroy();
        assert_eq!(host.calls("XPMPDestroyPlane"), 1);
        assert_eq!(host.plane_count(), 0);

        drop(LegacyAircraft::new("C172", "", "", None, None).unwrap());
        assert_eq!(host.calls("XPMPDestroyPlane"), 2);
        assert_eq!(host.stale_pull(id), 0);
    }

    #[test]
    fn refused_creation_frees_the_context() {
        let host = Xpmp2TestHost::new();
        host.refuse_creation(true);
        assert!(matches!(
            LegacyAircraft::new("A320", "", "", None, None),
            Err(XplmError::CreateFailed { what: "aircraft" })
        ));
        assert_eq!(PLANES.with(|p| p.len()), 0);
    }
}
