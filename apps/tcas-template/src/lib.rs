//! Template for a plugin that feeds its own traffic to the simulator's TCAS and AI slots.
//!
//! On enable it initializes XPMP2, takes over the AI aircraft and flies one demo aircraft in
//! a circle around the user. A "TCAS Template" entry in the Plugins menu toggles labels.

pub mod traffic;

use fbw_logging::{HostLogger, HostLoggerConfig};
use fbw_xplm::menus::{Menu, MenuItem};
use fbw_xplm::plugin::{self, messages, PluginId};
use fbw_xplm::processing::{FlightLoop, FlightLoopPhase};
use fbw_xplm::utilities::{debug_string, require_xplm_version};
use fbw_xplm::{xplugin, PluginConfig, XPlugin, XplmResult};
use fbw_xpmp2::{EnableOutcome, IntPrefs, Multiplayer, PendingEnable};
use log::{info, warn};
use std::cell::RefCell;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use traffic::{Orbit, Traffic};

/// XPLM 3.01, shipped with X-Plane 11.10.
const MIN_XPLM: i32 = 301;

/// Directory holding the plugin's files, given the path of its binary.
///
/// Binaries live either directly in it or in a per-platform subdirectory (`64`, `lin_x64`, ...).
pub fn plugin_root(binary: &Path) -> PathBuf {
    let Some(dir) = binary.parent() else {
        return PathBuf::from(".");
    };
    let platform_dir = dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == "64" || n.ends_with("_x64"));
    match dir.parent() {
        Some(parent) if platform_dir => parent.to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

/// Everything that exists while the plugin is enabled. Torn down in reverse order.
pub struct Session {
    flight_loop: FlightLoop,
    traffic: Rc<RefCell<Traffic>>,
    menu: Menu,
    plugins_menu: Menu,
    plugins_item: MenuItem,
    pending: Option<PendingEnable>,
    multiplayer: Rc<Multiplayer>,
}

impl Session {
    pub fn open(config: &PluginConfig, root: &Path) -> XplmResult<Self> {
        IntPrefs::from_config(config).install();
        let resources = root.join("Resources");
        let multiplayer = Rc::new(Multiplayer::init(
            TcasTemplate::NAME,
            &resources.to_string_lossy(),
            Some("A320"),
            Some("TCAS"),
        )?);

        let pending = match multiplayer.enable_multiplayer_deferred()? {
            EnableOutcome::Enabled => None,
            EnableOutcome::Pending(p) => {
                warn!("AI aircraft busy, waiting: {}", p.reason());
                Some(p)
            }
        };

        let aircraft = multiplayer.create_aircraft("A320", "DLH", "", None, None)?;
        let orbit = Orbit {
            radius_nm: 2.0,
            speed_kt: 220.0,
            bearing_deg: 0.0,
        };
        let traffic = Rc::new(RefCell::new(Traffic::new(aircraft, orbit, 500.0)));

        let moving = traffic.clone();
        let flight_loop = FlightLoop::new(FlightLoopPhase::AfterFlightModel, move |since_last, _, _| {
            moving.borrow_mut().update(since_last);
            -1.0
        })?;
        flight_loop.schedule(-1.0, true);

        let plugins_menu = Menu::plugins_menu().ok_or(fbw_xplm::XplmError::CreateFailed { what: "menu" })?;
        let plugins_item = plugins_menu.append_item(TcasTemplate::NAME)?;
        let labels = multiplayer.clone();
        let menu = Menu::new(
            TcasTemplate::NAME,
            Some((&plugins_menu, plugins_item)),
            Some(Box::new(move |_item: MenuItem| {
                let on = !labels.drawing_aircraft_labels();
                labels.enable_aircraft_labels(on);
                info!("aircraft labels {}", if on { "on" } else { "off" });
            })),
        )?;
        menu.append_item("Toggle aircraft labels")?;

        info!("session open, resources in {}", resources.display());
        Ok(Self {
            flight_loop,
            traffic,
            menu,
            plugins_menu,
            plugins_item,
            pending,
            multiplayer,
        })
    }

    #[inline]
    pub fn traffic(&self) -> &Rc<RefCell<Traffic>> {
        &self.traffic
    }

    #[inline]
    pub fn multiplayer(&self) -> &Multiplayer {
        &self.multiplayer
    }

    #[inline]
    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Whether the AI aircraft are ours, picking up a deferred grant if it arrived.
    pub fn has_ai(&mut self) -> bool {
        if let Some(result) = self.pending.as_ref().and_then(PendingEnable::try_take) {
            self.pending = None;
            if let Err(e) = result {
                warn!("multiplayer not enabled: {e}");
            }
        }
        self.multiplayer.has_control_of_ai_aircraft()
    }

    /// Another plugin asked for the AI aircraft.
    pub fn release_ai(&mut self) {
        self.pending = None;
        self.multiplayer.disable_multiplayer();
        info!("AI aircraft released on request");
    }

    pub fn close(self) {
        let Self {
            flight_loop,
            traffic,
            menu,
            plugins_menu,
            plugins_item,
            pending,
            multiplayer,
        } = self;
        flight_loop.destroy();
        drop(traffic);
        menu.destroy();
        plugins_menu.remove_item(plugins_item);
        drop(pending);
        multiplayer.disable_multiplayer();
        // The menu handler held the other reference and is gone with the menu.
        match Rc::try_unwrap(multiplayer) {
            Ok(mp) => mp.cleanup(),
            Err(_) => warn!("multiplayer still shared at close, cleaned up on last drop"),
        }
    }
}

pub struct TcasTemplate {
    config: PluginConfig,
    root: PathBuf,
    session: Option<Session>,
}

impl XPlugin for TcasTemplate {
    const NAME: &'static str = "TCAS Template";
    const SIGNATURE: &'static str = "hk.timtim.flybywireless.tcas";
    const DESCRIPTION: &'static str = "Template plugin feeding traffic to TCAS through XPMP2.";

    fn start() -> XplmResult<Self> {
        let binary = plugin::my_id().info().file_path;
        let root = plugin_root(Path::new(&binary));
        let config = PluginConfig::load_layered(&root)?;

        let logger = HostLoggerConfig::new(Self::NAME).with_log_config(&config.log);
        if let Err(e) = HostLogger::new(logger).init() {
            debug_string(&format!("[{}] {e}\n", Self::NAME));
        }

        let versions = require_xplm_version(MIN_XPLM)?;
        info!("started on X-Plane {} (XPLM {})", versions.xplane, versions.xplm);
        Ok(Self {
            config,
            root,
            session: None,
        })
    }

    fn enable(&mut self) -> XplmResult<()> {
        if self.session.is_none() {
            self.session = Some(Session::open(&self.config, &self.root)?);
        }
        Ok(())
    }

    fn disable(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }

    fn receive_message(&mut self, from: PluginId, message: i32, _param: *mut c_void) {
        if message == messages::RELEASE_PLANES {
            info!("plugin {} wants the AI aircraft", from.0);
            if let Some(session) = &mut self.session {
                session.release_ai();
            }
        }
    }

    fn stop(&mut self) {
        self.disable();
        info!("stopped");
    }
}

xplugin!(TcasTemplate);

#[cfg(test)]
mod tests {
    use super::*;
    use fbw_xplm::entry;
    use fbw_xplm::test_host::FakeValue;
    use fbw_xpmp2::test_host::Xpmp2TestHost;

    fn with_user_position(host: &Xpmp2TestHost) {
        let x = host.xplm();
        x.define_data("sim/flightmodel/position/latitude", FakeValue::Double(47.26), false);
        x.define_data("sim/flightmodel/position/longitude", FakeValue::Double(11.34), false);
        x.define_data("sim/flightmodel/position/elevation", FakeValue::Double(600.0), false);
    }

    #[test]
    fn plugin_root_skips_platform_directories() {
        let root = Path::new("/X-Plane/Resources/plugins/tcas");
        assert_eq!(plugin_root(&root.join("64/lin.xpl")), root);
        assert_eq!(plugin_root(&root.join("lin_x64/tcas.xpl")), root);
        assert_eq!(plugin_root(&root.join("tcas.xpl")), root);
        assert_eq!(plugin_root(Path::new("tcas.xpl")), Path::new(""));
    }

    #[test]
    fn session_flies_the_demo_aircraft() {
        let host = Xpmp2TestHost::new();
        with_user_position(&host);
        let session = Session::open(&PluginConfig::default(), Path::new("/X-Plane/Resources/plugins/tcas")).unwrap();
        assert_eq!(host.init_args().resource_dir, "/X-Plane/Resources/plugins/tcas/Resources");
        assert!(session.multiplayer().has_control_of_ai_aircraft());

        let id = session.traffic().borrow().aircraft().id();
        host.xplm().run_flight_loops(0.05);
        let pulled = host.pull(id);
        let pos = pulled.position.unwrap();
        assert!((pos.lat - 47.26).abs() < 0.05);
        assert!((pos.lon - 11.34).abs() < 0.05);
        assert!((pos.elevation - (600.0 * 3.280_84 + 500.0)).abs() < 1e-6);
        assert_eq!(pulled.radar.unwrap().code, 4321);

        session.close();
        assert_eq!(host.calls("XPMPDestroyPlane"), 1);
        assert_eq!(host.calls("XPMPMultiplayerCleanup"), 1);
        assert_eq!(host.xplm().live_flight_loops(), 0);
    }

    #[test]
    fn menu_toggles_labels() {
        let host = Xpmp2TestHost::new();
        let session = Session::open(&PluginConfig::default(), Path::new("/tmp/tcas")).unwrap();
        assert!(!session.multiplayer().drawing_aircraft_labels());
        host.xplm().click_menu_item(session.menu().id(), 0);
        assert!(session.multiplayer().drawing_aircraft_labels());
        host.xplm().click_menu_item(session.menu().id(), 0);
        assert!(!session.multiplayer().drawing_aircraft_labels());
        session.close();
    }

    #[test]
    fn waits_for_ai_and_gives_it_back() {
        let host = Xpmp2TestHost::new();
        host.hold_ai(true);
        let mut session = Session::open(&PluginConfig::default(), Path::new("/tmp/tcas")).unwrap();
        assert!(!session.has_ai());
        host.release_ai();
        assert!(session.has_ai());

        session.release_ai();
        assert!(!session.has_ai());
        session.close();
    }

    #[test]
    fn lifecycle_through_entry_points() {
        let host = Xpmp2TestHost::new();
        host.xplm().add_plugin(
            TcasTemplate::NAME,
            TcasTemplate::SIGNATURE,
            "/nonexistent/plugins/tcas/64/lin.xpl",
        );
        let mut bufs = [[0u8; 256]; 3];
        let [n, s, d] = &mut bufs;
        let started = unsafe {
            entry::start::<TcasTemplate>(n.as_mut_ptr().cast(), s.as_mut_ptr().cast(), d.as_mut_ptr().cast())
        };
        assert_eq!(started, 1);
        assert_eq!(entry::enable::<TcasTemplate>(), 1);
        assert_eq!(host.calls("XPMPMultiplayerInit"), 1);
        assert_eq!(host.init_args().resource_dir, "/nonexistent/plugins/tcas/Resources");

        entry::receive_message::<TcasTemplate>(2, messages::RELEASE_PLANES, std::ptr::null_mut());
        entry::disable::<TcasTemplate>();
        assert_eq!(host.calls("XPMPMultiplayerCleanup"), 1);
        entry::stop::<TcasTemplate>();
        assert_eq!(host.calls("XPMPMultiplayerCleanup"), 1);
    }

    #[test]
    fn refuses_old_hosts() {
        let host = Xpmp2TestHost::new();
        host.xplm().set_versions(11000, 300);
        let mut bufs = [[0u8; 256]; 3];
        let [n, s, d] = &mut bufs;
        let started = unsafe {
            entry::start::<TcasTemplate>(n.as_mut_ptr().cast(), s.as_mut_ptr().cast(), d.as_mut_ptr().cast())
        };
        assert_eq!(started, 0);
        assert!(host.xplm().debug_log().contains("XPLM 300 is older than the required 301"));
    }
}
