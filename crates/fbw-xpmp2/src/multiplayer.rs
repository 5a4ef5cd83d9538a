//! Library lifecycle and global XPMP2 settings.

use crate::aircraft::{opt_ptr, LegacyAircraft};
use crate::api::{self, xpmp2};
use crate::prefs::int_prefs;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use fbw_xplm::api::Refcon;
use fbw_xplm::callback::guard;
use fbw_xplm::strings::{from_ptr, to_cstring};
use fbw_xplm::{XplmError, XplmResult};
use std::cell::RefCell;
use std::ffi::{c_char, CString};

/// XPMP2 reports failures as a message; an empty or null one means success.
fn check(text: *const c_char) -> XplmResult<()> {
    match unsafe { from_ptr(text) } {
        Some(msg) if !msg.is_empty() => Err(XplmError::Host(msg)),
        _ => Ok(()),
    }
}

/// A CSL model known to the library.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub icao: String,
    pub airline: String,
    pub livery: String,
}

/// Directional sound parameters for [`Multiplayer::add_sound`]. `None` is omnidirectional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundCone {
    pub dir: f32,
    pub pitch: f32,
    pub in_angle: f32,
    pub out_angle: f32,
    pub out_volume: f32,
}

pub enum EnableOutcome {
    Enabled,
    /// The AI planes are held by another plugin; the library takes them once released.
    Pending(PendingEnable),
}

type EnableResult = XplmResult<()>;

thread_local! {
    static PENDING: RefCell<Option<Sender<EnableResult>>> = const { RefCell::new(None) };
}

unsafe extern "C" fn enable_done(_refcon: Refcon) {
    guard("XPMP2 multiplayer enabled", (), || {
        if let Some(tx) = PENDING.with(|p| p.borrow_mut().take()) {
            let _ = tx.send(Ok(()));
        }
    })
}

/// Outstanding [`Multiplayer::enable_multiplayer_deferred`] request.
pub struct PendingEnable {
    rx: Receiver<EnableResult>,
    reason: String,
}

impl PendingEnable {
    /// Why the planes could not be taken right away.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn try_take(&self) -> Option<EnableResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(XplmError::Cancelled)),
        }
    }

    #[inline]
    pub fn into_receiver(self) -> Receiver<EnableResult> {
        self.rx
    }
}

/// The initialized XPMP2 library. Cleaned up on [`cleanup`](Self::cleanup) or drop.
pub struct Multiplayer {
    released: bool,
}

impl Multiplayer {
    /// Initializes the library. Integer preferences are answered from the installed
    /// [`IntPrefs`](crate::IntPrefs).
    pub fn init(
        plugin_name: &str,
        resource_dir: &str,
        default_icao: Option<&str>,
        log_acronym: Option<&str>,
    ) -> XplmResult<Self> {
        api::ensure_loaded()?;
        let plugin_name = to_cstring(plugin_name)?;
        let resource_dir = to_cstring(resource_dir)?;
        let default_icao = default_icao.map(to_cstring).transpose()?;
        let log_acronym = log_acronym.map(to_cstring).transpose()?;
        check(unsafe {
            (xpmp2().multiplayer_init)(
                plugin_name.as_ptr(),
                resource_dir.as_ptr(),
                Some(int_prefs),
                opt_ptr(&default_icao),
                opt_ptr(&log_acronym),
            )
        })?;
        log::info!(target: "xpmp2", "initialized, resources in {:?}", resource_dir);
        Ok(Self { released: false })
    }

    #[inline]
    pub fn contrails_auto_enabled(&self) -> bool {
        unsafe { (xpmp2().contrails_auto_enabled)() }
    }

    #[inline]
    pub fn contrails_available(&self) -> bool {
        unsafe { (xpmp2().contrails_available)() }
    }

    #[inline]
    pub fn is_sound_enabled(&self) -> bool {
        unsafe { (xpmp2().sound_is_enabled)() }
    }

    /// Returns whether sound is enabled afterwards.
    #[inline]
    pub fn enable_sound(&self, enable: bool) -> bool {
        unsafe { (xpmp2().sound_enable)(enable) }
    }

    #[inline]
    pub fn set_master_volume(&self, volume: f32) {
        unsafe { (xpmp2().sound_set_master_volume)(volume) }
    }

    #[inline]
    pub fn mute_sound(&self, mute: bool) {
        unsafe { (xpmp2().sound_mute)(mute) }
    }

    pub fn add_sound(&self, name: &str, file_path: &str, looping: bool, cone: Option<SoundCone>) -> XplmResult<()> {
        let name = to_cstring(name)?;
        let file_path = to_cstring(file_path)?;
        let c = cone.unwrap_or(SoundCone {
            dir: f32::NAN,
            pitch: f32::NAN,
            in_angle: f32::NAN,
            out_angle: f32::NAN,
            out_volume: f32::NAN,
        });
        check(unsafe {
            (xpmp2().sound_add)(
                name.as_ptr(),
                file_path.as_ptr(),
                looping,
                c.dir,
                c.pitch,
                c.in_angle,
                c.out_angle,
                c.out_volume,
            )
        })
    }

    /// `(name, file path)` of every sound the library knows.
    pub fn sounds(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut prev: *const c_char = std::ptr::null();
        loop {
            let mut path: *const c_char = std::ptr::null();
            let name = unsafe { (xpmp2().sound_enumerate)(prev, &mut path) };
            let Some(name_str) = (unsafe { from_ptr(name) }) else {
                break;
            };
            out.push((name_str, unsafe { from_ptr(path) }.unwrap_or_default()));
            prev = name;
        }
        out
    }

    /// Takes over the AI planes now, or fails.
    pub fn enable_multiplayer(&self) -> XplmResult<()> {
        check(unsafe { (xpmp2().multiplayer_enable)(None, std::ptr::null_mut()) })
    }

    /// Takes over the AI planes, waiting for them if another plugin holds them.
    ///
    /// A newer request cancels an older pending one.
    pub fn enable_multiplayer_deferred(&self) -> XplmResult<EnableOutcome> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        if let Some(prev) = PENDING.with(|p| p.borrow_mut().replace(tx)) {
            let _ = prev.send(Err(XplmError::Cancelled));
        }
        let text = unsafe { (xpmp2().multiplayer_enable)(Some(enable_done), std::ptr::null_mut()) };
        match unsafe { from_ptr(text) } {
            Some(reason) if !reason.is_empty() => {
                log::info!(target: "xpmp2", "multiplayer deferred: {reason}");
                Ok(EnableOutcome::Pending(PendingEnable { rx, reason }))
            }
            _ => {
                PENDING.with(|p| p.borrow_mut().take());
                Ok(EnableOutcome::Enabled)
            }
        }
    }

    #[inline]
    pub fn disable_multiplayer(&self) {
        unsafe { (xpmp2().multiplayer_disable)() }
    }

    #[inline]
    pub fn has_control_of_ai_aircraft(&self) -> bool {
        unsafe { (xpmp2().has_control_of_ai_aircraft)() }
    }

    pub fn load_csl_package(&self, folder: &str) -> XplmResult<()> {
        let folder = to_cstring(folder)?;
        check(unsafe { (xpmp2().load_csl_package)(folder.as_ptr()) })
    }

    #[inline]
    pub fn installed_models(&self) -> i32 {
        unsafe { (xpmp2().get_number_of_installed_models)() }
    }

    pub fn model_info(&self, index: i32) -> Option<ModelInfo> {
        if !(0..self.installed_models()).contains(&index) {
            return None;
        }
        let mut ptrs: [*const c_char; 4] = [std::ptr::null(); 4];
        let [name, icao, airline, livery] = &mut ptrs;
        unsafe { (xpmp2().get_model_info)(index, name, icao, airline, livery) };
        let [name, icao, airline, livery] = ptrs.map(|p| unsafe { from_ptr(p) });
        Some(ModelInfo {
            name: name?,
            icao: icao.unwrap_or_default(),
            airline: airline.unwrap_or_default(),
            livery: livery.unwrap_or_default(),
        })
    }

    /// Lower is better; `-1` means no model at all.
    pub fn model_match_quality(&self, icao: Option<&str>, airline: Option<&str>, livery: Option<&str>) -> XplmResult<i32> {
        let icao = icao.map(to_cstring).transpose()?;
        let airline = airline.map(to_cstring).transpose()?;
        let livery = livery.map(to_cstring).transpose()?;
        Ok(unsafe { (xpmp2().model_match_quality)(opt_ptr(&icao), opt_ptr(&airline), opt_ptr(&livery)) })
    }

    pub fn is_icao_valid(&self, icao: &str) -> bool {
        let Ok(icao) = to_cstring(icao) else {
            return false;
        };
        unsafe { (xpmp2().is_icao_valid)(icao.as_ptr()) }
    }

    pub fn create_aircraft(
        &self,
        icao_type: &str,
        icao_airline: &str,
        livery: &str,
        mode_s_id: Option<u32>,
        csl_model: Option<&str>,
    ) -> XplmResult<LegacyAircraft> {
        LegacyAircraft::new(icao_type, icao_airline, livery, mode_s_id, csl_model)
    }

    #[inline]
    pub fn aircraft_count(&self) -> i64 {
        unsafe { (xpmp2().count_planes)() as i64 }
    }

    /// Fallback ICAO types for aircraft and, optionally, ground vehicles.
    pub fn set_default_icao(&self, aircraft: &str, vehicle: Option<&str>) -> XplmResult<()> {
        let aircraft = to_cstring(aircraft)?;
        let vehicle: Option<CString> = vehicle.map(to_cstring).transpose()?;
        unsafe { (xpmp2().set_default_plane_icao)(aircraft.as_ptr(), opt_ptr(&vehicle)) };
        Ok(())
    }

    #[inline]
    pub fn enable_aircraft_labels(&self, enable: bool) {
        unsafe { (xpmp2().enable_aircraft_labels)(enable) }
    }

    #[inline]
    pub fn drawing_aircraft_labels(&self) -> bool {
        unsafe { (xpmp2().drawing_aircraft_labels)() }
    }

    #[inline]
    pub fn set_aircraft_label_dist(&self, dist_nm: f32, cut_off_at_visibility: bool) {
        unsafe { (xpmp2().set_aircraft_label_dist)(dist_nm, cut_off_at_visibility) }
    }

    #[inline]
    pub fn enable_map(&self, map: bool, labels: bool) {
        unsafe { (xpmp2().enable_map)(map, labels) }
    }

    #[inline]
    pub fn cleanup(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        unsafe { (xpmp2().multiplayer_cleanup)() };
    }
}

impl Drop for Multiplayer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::IntPrefs;
    use crate::test_host::Xpmp2TestHost;

    fn init(host: &Xpmp2TestHost) -> Multiplayer {
        let mp = Multiplayer::init("TCAS Template", "Resources/plugins/tcas/Resources", Some("A320"), Some("TCAS")).unwrap();
        assert_eq!(host.calls("XPMPMultiplayerInit"), 1);
        mp
    }

    #[test]
    fn init_passes_setup_and_cleans_up_once() {
        let host = Xpmp2TestHost::new();
        let mp = init(&host);
        let setup = host.init_args();
        assert_eq!(setup.plugin_name, "TCAS Template");
        assert_eq!(setup.resource_dir, "Resources/plugins/tcas/Resources");
        assert_eq!(setup.default_icao.as_deref(), Some("A320"));
        assert_eq!(setup.log_acronym.as_deref(), Some("TCAS"));
        mp.cleanup();
        assert_eq!(host.calls("XPMPMultiplayerCleanup"), 1);

        drop(Multiplayer::init("x", "y", None, None).unwrap());
        assert_eq!(host.calls("XPMPMultiplayerCleanup"), 2);
        assert_eq!(host.init_args().default_icao, None);
    }

    #[test]
    fn init_error_text_becomes_host_error() {
        let host = Xpmp2TestHost::new();
        host.fail_next("Could not find resource directory");
        let err = Multiplayer::init("p", "missing", None, None).err().unwrap();
        assert!(matches!(err, XplmError::Host(ref m) if m == "Could not find resource directory"));
        assert_eq!(host.calls("XPMPMultiplayerCleanup"), 0);
    }

    #[test]
    fn library_reads_int_prefs_during_init() {
        let host = Xpmp2TestHost::new();
        IntPrefs::new().with("planes", "clamp_all_to_ground", 0).install();
        let _mp = init(&host);
        let answers = host.prefs_answers();
        assert!(answers.contains(&("planes".to_owned(), "clamp_all_to_ground".to_owned(), 0)));
        assert!(answers.contains(&("debug".to_owned(), "log_level".to_owned(), 2)));
    }

    #[test]
    fn sounds_are_added_and_enumerated() {
        let host = Xpmp2TestHost::new();
        let mp = init(&host);
        assert!(mp.enable_sound(true));
        assert!(mp.is_sound_enabled());
        mp.set_master_volume(0.5);
        mp.mute_sound(true);
        assert_eq!(host.sound_settings(), (0.5, true));

        mp.add_sound("rotor", "sounds/rotor.wav", true, None).unwrap();
        mp.add_sound(
            "horn",
            "sounds/horn.wav",
            false,
            Some(SoundCone { dir: 0.0, pitch: 0.0, in_angle: 30.0, out_angle: 90.0, out_volume: 0.2 }),
        )
        .unwrap();
        assert!(matches!(mp.add_sound("rotor", "other.wav", true, None), Err(XplmError::Host(_))));
        assert_eq!(
            mp.sounds(),
            vec![
                ("rotor".to_owned(), "sounds/rotor.wav".to_owned()),
                ("horn".to_owned(), "sounds/horn.wav".to_owned()),
            ]
        );
    }

    #[test]
    fn enabling_multiplayer() {
        let host = Xpmp2TestHost::new();
        let mp = init(&host);
        mp.enable_multiplayer().unwrap();
        assert!(mp.has_control_of_ai_aircraft());
        mp.disable_multiplayer();
        assert!(!mp.has_control_of_ai_aircraft());

        host.hold_ai(true);
        assert!(matches!(mp.enable_multiplayer(), Err(XplmError::Host(_))));
    }

    #[test]
    fn deferred_enable_completes_when_ai_is_released() {
        let host = Xpmp2TestHost::new();
        let mp = init(&host);
        assert!(matches!(mp.enable_multiplayer_deferred().unwrap(), EnableOutcome::Enabled));
        mp.disable_multiplayer();

        host.hold_ai(true);
        let EnableOutcome::Pending(first) = mp.enable_multiplayer_deferred().unwrap() else {
            panic!("expected pending");
        };
        assert!(!first.reason().is_empty());
        let EnableOutcome::Pending(second) = mp.enable_multiplayer_deferred().unwrap() else {
            panic!("expected pending");
        };
        assert!(matches!(first.try_take(), Some(Err(XplmError::Cancelled))));
        assert!(second.try_take().is_none());

        host.release_ai();
        assert!(matches!(second.try_take(), Some(Ok(()))));
        assert!(mp.has_control_of_ai_aircraft());
    }

    #[test]
    fn models_and_matching() {
        let host = Xpmp2TestHost::new();
        let mp = init(&host);
        host.define_model("B738 RYR", "B738", "RYR", "EI-DCL");
        host.define_model("A320 generic", "A320", "", "");
        mp.load_csl_package("Resources/CSL/Bluebell").unwrap();
        assert!(mp.load_csl_package("missing/CSL").is_err());

        assert_eq!(mp.installed_models(), 2);
        assert_eq!(
            mp.model_info(0),
            Some(ModelInfo {
                name: "B738 RYR".into(),
                icao: "B738".into(),
                airline: "RYR".into(),
                livery: "EI-DCL".into(),
            })
        );
        assert_eq!(mp.model_info(2), None);
        assert_eq!(mp.model_info(-1), None);

        assert_eq!(mp.model_match_quality(Some("B738"), Some("RYR"), Some("EI-DCL")).unwrap(), 0);
        assert_eq!(mp.model_match_quality(Some("B738"), None, None).unwrap(), 2);
        assert_eq!(mp.model_match_quality(Some("C172"), None, None).unwrap(), -1);

        assert!(mp.is_icao_valid("B738"));
        assert!(!mp.is_icao_valid("boeing"));
        assert!(!mp.is_icao_valid("B7\038"));
    }

    #[test]
    fn labels_map_and_counts() {
        let host = Xpmp2TestHost::new();
        let mp = init(&host);
        mp.enable_aircraft_labels(true);
        assert!(mp.drawing_aircraft_labels());
        mp.set_aircraft_label_dist(5.0, false);
        mp.enable_map(true, false);
        mp.set_default_icao("A320", Some("ZZZC")).unwrap();
        assert_eq!(host.label_dist(), (5.0, false));
        assert_eq!(host.map(), (true, false));
        assert_eq!(host.default_icao(), ("A320".to_owned(), Some("ZZZC".to_owned())));
        assert!(mp.contrails_auto_enabled());
        assert!(!mp.contrails_available());

        let a = mp.create_aircraft("A320", "", "", None, None).unwrap();
        let b = mp.create_aircraft("A320", "", "", None, None).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(mp.aircraft_count(), 2);
        drop(a);
        assert_eq!(mp.aircraft_count(), 1);
    }
}
