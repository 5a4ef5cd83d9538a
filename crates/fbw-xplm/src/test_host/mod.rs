//! A simulated host for tests.
//!
//! [`TestHost::new`] installs function tables whose entries act on a per-thread model of the
//! simulator: datarefs, commands, flight loops, menus, widgets and so on. Each test runs on
//! its own thread, so every test starts from a fresh model even though the installed table is
//! shared by the whole process.
//!
//! The fakes never hold the model borrowed while calling back into plugin code, so callbacks
//! are free to call the host again.

mod widgets;
mod xplm;

use crate::api::{
    self, CameraControlFn, CommandFn, DataChangedFn, ErrorFn, FlightLoopFn, Handle, HostApi, MenuHandlerFn,
    ObjectLoadedFn, PlanesAvailableFn, ReadByteVectorFn, ReadDoubleFn, ReadFloatFn, ReadFloatVectorFn, ReadIntFn,
    ReadIntVectorFn, Refcon, WidgetFunc, WriteByteVectorFn, WriteDoubleFn, WriteFloatFn, WriteFloatVectorFn,
    WriteIntFn, WriteIntVectorFn,
};
use crate::camera::CameraPosition;
use crate::graphics::Rect;
use crate::handle::{CommandId, FlightLoopId, MenuId, WidgetId};
use crate::instance::DrawInfo;
use crate::widgets::{MouseState, WidgetMessage};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::{c_int, CString};
use std::marker::PhantomData;

/// Value of a dataref owned by the simulated host.
#[derive(Clone, Debug, PartialEq)]
pub enum FakeValue {
    Int(i32),
    Float(f32),
    Double(f64),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Bytes(Vec<u8>),
}

impl FakeValue {
    fn types(&self) -> c_int {
        match self {
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Double(_) => 4,
            Self::Floats(_) => 8,
            Self::Ints(_) => 16,
            Self::Bytes(_) => 32,
        }
    }

    /// Value a freshly shared dataref of `types` starts with.
    fn for_types(types: c_int) -> Self {
        match types {
            t if t & 1 != 0 => Self::Int(0),
            t if t & 2 != 0 => Self::Float(0.0),
            t if t & 4 != 0 => Self::Double(0.0),
            t if t & 8 != 0 => Self::Floats(vec![0.0; 8]),
            t if t & 16 != 0 => Self::Ints(vec![0; 8]),
            _ => Self::Bytes(vec![0; 64]),
        }
    }

    fn scalar(&self) -> f64 {
        match *self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v as f64,
            Self::Double(v) => v,
            _ => 0.0,
        }
    }

    /// Stores `value` keeping the dataref's own type. Arrays are left alone.
    fn set_scalar(&mut self, value: f64) {
        match self {
            Self::Int(v) => *v = value as i32,
            Self::Float(v) => *v = value as f32,
            Self::Double(v) => *v = value,
            _ => {}
        }
    }
}

/// Host-side state of one menu item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakeMenuItem {
    pub name: String,
    pub check: i32,
    pub enabled: bool,
    pub(crate) item_ref: usize,
    pub(crate) command: Option<usize>,
}

#[derive(Clone, Copy)]
pub(crate) struct FakeAccessor {
    pub types: c_int,
    pub writable: bool,
    pub read_int: ReadIntFn,
    pub write_int: WriteIntFn,
    pub read_float: ReadFloatFn,
    pub write_float: WriteFloatFn,
    pub read_double: ReadDoubleFn,
    pub write_double: WriteDoubleFn,
    pub read_int_array: ReadIntVectorFn,
    pub write_int_array: WriteIntVectorFn,
    pub read_float_array: ReadFloatVectorFn,
    pub write_float_array: WriteFloatVectorFn,
    pub read_data: ReadByteVectorFn,
    pub write_data: WriteByteVectorFn,
    pub read_refcon: Refcon,
    pub write_refcon: Refcon,
}

pub(crate) enum DataEntry {
    Native { value: FakeValue, writable: bool },
    Accessor(FakeAccessor),
}

pub(crate) struct FakeData {
    pub name: String,
    pub entry: DataEntry,
}

pub(crate) struct FakeLoop {
    pub callback: FlightLoopFn,
    pub refcon: Refcon,
    pub interval: f32,
    pub since_last_call: f32,
}

pub(crate) struct FakeCommand {
    pub name: String,
    pub before: Vec<(CommandFn, Refcon)>,
    pub after: Vec<(CommandFn, Refcon)>,
    pub executions: usize,
}

pub(crate) struct FakePlugin {
    pub id: c_int,
    pub name: String,
    pub path: String,
    pub signature: String,
    pub enabled: bool,
}

pub(crate) struct FakeMenu {
    pub parent: Option<(usize, c_int)>,
    pub handler: MenuHandlerFn,
    pub menu_ref: Refcon,
    pub items: Vec<FakeMenuItem>,
}

pub(crate) struct FakeWidget {
    pub rect: Rect,
    pub visible: bool,
    pub descriptor: String,
    pub is_root: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub callbacks: Vec<WidgetFunc>,
    pub props: HashMap<c_int, isize>,
}

/// Model of the simulator the fakes operate on.
pub(crate) struct HostState {
    pub calls: HashMap<&'static str, usize>,
    pub log: String,
    pub refuse: bool,
    next_handle: usize,

    pub data: HashMap<usize, FakeData>,
    pub data_names: HashMap<String, usize>,
    pub shared: HashMap<String, Vec<(DataChangedFn, Refcon)>>,
    pub null_vector_probes: usize,

    pub loops: BTreeMap<usize, FakeLoop>,
    pub last_loop_struct_size: usize,
    pub elapsed: f32,
    pub cycle: c_int,

    pub commands: HashMap<usize, FakeCommand>,
    pub command_names: HashMap<String, usize>,

    pub system_path: String,
    pub versions: (c_int, c_int, c_int),
    pub spoken: Vec<String>,
    pub error_callback: ErrorFn,

    pub plugins: Vec<FakePlugin>,
    pub sent_messages: Vec<(c_int, c_int)>,
    pub features: Vec<(String, bool)>,

    pub terrain_height: f32,
    pub magnetic_variation: f32,
    pub probes: HashSet<usize>,
    pub objects: HashSet<usize>,
    pub pending_loads: Vec<(String, ObjectLoadedFn, Refcon)>,
    pub libraries: HashMap<String, Vec<String>>,

    pub instances: HashMap<usize, usize>,
    pub instance_datarefs: Vec<String>,
    pub last_instance_position: Option<(DrawInfo, Vec<f32>)>,

    pub user_aircraft: String,
    pub planes_owned: bool,
    pub hold_planes: bool,
    pub acquired_models: Vec<String>,
    pub planes_callback: Option<(PlanesAvailableFn, Refcon)>,

    pub camera: Option<(CameraControlFn, Refcon, c_int)>,
    pub camera_position: CameraPosition,

    pub plugins_menu: usize,
    pub aircraft_menu: usize,
    pub menus: HashMap<usize, FakeMenu>,

    pub graphics_state: Option<[c_int; 7]>,
    pub next_texture: c_int,
    pub drawn: Vec<String>,

    pub widgets: HashMap<usize, FakeWidget>,
    pub z_order: Vec<usize>,
    pub focus: Option<usize>,
    pub dragging: Option<(usize, c_int, c_int)>,
}

impl HostState {
    fn new() -> Self {
        let mut state = Self {
            calls: HashMap::new(),
            log: String::new(),
            refuse: false,
            next_handle: 0x1000,
            data: HashMap::new(),
            data_names: HashMap::new(),
            shared: HashMap::new(),
            null_vector_probes: 0,
            loops: BTreeMap::new(),
            last_loop_struct_size: 0,
            elapsed: 0.0,
            cycle: 0,
            commands: HashMap::new(),
            command_names: HashMap::new(),
            system_path: "/X-Plane/".to_owned(),
            versions: (12000, 400, 1),
            spoken: Vec::new(),
            error_callback: None,
            plugins: vec![FakePlugin {
                id: 0,
                name: "X-Plane".to_owned(),
                path: String::new(),
                signature: "xplane".to_owned(),
                enabled: true,
            }],
            sent_messages: Vec::new(),
            features: vec![
                ("XPLM_USE_NATIVE_PATHS".to_owned(), false),
                ("XPLM_USE_NATIVE_WIDGET_WINDOWS".to_owned(), false),
                ("XPLM_WANTS_DATAREF_NOTIFICATIONS".to_owned(), false),
            ],
            terrain_height: 0.0,
            magnetic_variation: 0.0,
            probes: HashSet::new(),
            objects: HashSet::new(),
            pending_loads: Vec::new(),
            libraries: HashMap::new(),
            instances: HashMap::new(),
            instance_datarefs: Vec::new(),
            last_instance_position: None,
            user_aircraft: String::new(),
            planes_owned: false,
            hold_planes: false,
            acquired_models: Vec::new(),
            planes_callback: None,
            camera: None,
            camera_position: CameraPosition::default(),
            plugins_menu: 0,
            aircraft_menu: 0,
            menus: HashMap::new(),
            graphics_state: None,
            next_texture: 1,
            drawn: Vec::new(),
            widgets: HashMap::new(),
            z_order: Vec::new(),
            focus: None,
            dragging: None,
        };
        state.plugins_menu = state.host_menu();
        state.aircraft_menu = state.host_menu();
        state
    }

    /// Fresh non-null handle value.
    pub fn alloc(&mut self) -> usize {
        self.next_handle += 0x10;
        self.next_handle
    }

    fn host_menu(&mut self) -> usize {
        let id = self.alloc();
        self.menus.insert(
            id,
            FakeMenu {
                parent: None,
                handler: None,
                menu_ref: std::ptr::null_mut(),
                items: Vec::new(),
            },
        );
        id
    }

    /// Creates or returns the command named `name`.
    pub fn command(&mut self, name: &str) -> usize {
        if let Some(&id) = self.command_names.get(name) {
            return id;
        }
        let id = self.alloc();
        self.commands.insert(
            id,
            FakeCommand {
                name: name.to_owned(),
                before: Vec::new(),
                after: Vec::new(),
                executions: 0,
            },
        );
        self.command_names.insert(name.to_owned(), id);
        id
    }

    pub fn add_data(&mut self, name: &str, entry: DataEntry) -> usize {
        let id = self.alloc();
        self.data.insert(
            id,
            FakeData {
                name: name.to_owned(),
                entry,
            },
        );
        self.data_names.insert(name.to_owned(), id);
        id
    }
}

thread_local! {
    static STATE: RefCell<HostState> = RefCell::new(HostState::new());
}

/// Runs `f` on the model. Must not be nested and must not call plugin code.
pub(crate) fn with<R>(f: impl FnOnce(&mut HostState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

pub(crate) fn hit(symbol: &'static str) {
    with(|s| *s.calls.entry(symbol).or_default() += 1);
}

#[inline]
pub(crate) fn key(handle: Handle) -> usize {
    handle as usize
}

#[inline]
pub(crate) fn handle(key: usize) -> Handle {
    key as Handle
}

/// Handle to the simulated host. Creating one installs the fake tables (once per process)
/// and resets this thread's model.
pub struct TestHost {
    _not_send: PhantomData<*const ()>,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    pub fn new() -> Self {
        api::install_with(|| HostApi {
            xplm: xplm::fake_xplm(),
            widgets: widgets::fake_widgets(),
        });
        STATE.with(|s| *s.borrow_mut() = HostState::new());
        Self { _not_send: PhantomData }
    }

    /// Everything written with `XPLMDebugString` so far.
    pub fn debug_log(&self) -> String {
        with(|s| s.log.clone())
    }

    /// Number of calls made to the host function exported as `symbol`.
    pub fn calls(&self, symbol: &str) -> usize {
        with(|s| s.calls.get(symbol).copied().unwrap_or(0))
    }

    /// Makes every create-style call return null.
    pub fn refuse_creation(&self, refuse: bool) {
        with(|s| s.refuse = refuse);
    }

    // data access

    pub fn define_data(&self, name: &str, value: FakeValue, writable: bool) {
        with(|s| s.add_data(name, DataEntry::Native { value, writable }));
    }

    /// Current value of a host-owned dataref.
    pub fn data_value(&self, name: &str) -> Option<FakeValue> {
        with(|s| {
            let id = s.data_names.get(name)?;
            match &s.data.get(id)?.entry {
                DataEntry::Native { value, .. } => Some(value.clone()),
                DataEntry::Accessor(_) => None,
            }
        })
    }

    /// Vector reads made with a null destination, i.e. size queries.
    pub fn null_vector_probes(&self) -> usize {
        with(|s| s.null_vector_probes)
    }

    pub fn accessor_has_write_refcon(&self, name: &str) -> bool {
        with(|s| {
            let Some(id) = s.data_names.get(name) else {
                return false;
            };
            matches!(
                s.data.get(id).map(|d| &d.entry),
                Some(DataEntry::Accessor(a)) if !a.write_refcon.is_null()
            )
        })
    }

    pub fn shared_subscribers(&self, name: &str) -> usize {
        with(|s| s.shared.get(name).map_or(0, Vec::len))
    }

    // processing

    pub fn last_flight_loop_struct_size(&self) -> usize {
        with(|s| s.last_loop_struct_size)
    }

    /// Advances the simulator by one frame of `dt` seconds, running every scheduled loop.
    pub fn run_flight_loops(&self, dt: f32) {
        let cycle = with(|s| {
            s.elapsed += dt;
            s.cycle += 1;
            for l in s.loops.values_mut() {
                l.since_last_call += dt;
            }
            s.cycle
        });
        let due: Vec<usize> = with(|s| s.loops.iter().filter(|(_, l)| l.interval != 0.0).map(|(&k, _)| k).collect());
        for k in due {
            let Some((callback, refcon, since)) = with(|s| {
                let l = s.loops.get_mut(&k)?;
                let since = std::mem::take(&mut l.since_last_call);
                Some((l.callback?, l.refcon, since))
            }) else {
                continue;
            };
            let next = unsafe { callback(since, dt, cycle, refcon) };
            with(|s| {
                if let Some(l) = s.loops.get_mut(&k) {
                    l.interval = next;
                }
            });
        }
    }

    pub fn live_flight_loops(&self) -> usize {
        with(|s| s.loops.len())
    }

    /// Interval the loop asked for last, `None` once it is destroyed.
    pub fn flight_loop_interval(&self, id: FlightLoopId) -> Option<f32> {
        with(|s| s.loops.get(&key(id.as_raw())).map(|l| l.interval))
    }

    // commands

    pub fn define_command(&self, name: &str) {
        with(|s| s.command(name));
    }

    /// Native handlers registered on `id`: before and after the simulator's own handling.
    pub fn command_registrations(&self, id: CommandId) -> (usize, usize) {
        with(|s| {
            s.commands
                .get(&key(id.as_raw()))
                .map_or((0, 0), |c| (c.before.len(), c.after.len()))
        })
    }

    /// How often the simulator itself carried the command out.
    pub fn command_executions(&self, name: &str) -> usize {
        with(|s| {
            s.command_names
                .get(name)
                .and_then(|id| s.commands.get(id))
                .map_or(0, |c| c.executions)
        })
    }

    // utilities

    pub fn set_system_path(&self, path: &str) {
        with(|s| s.system_path = path.to_owned());
    }

    pub fn set_versions(&self, xplane: i32, xplm: i32) {
        with(|s| {
            s.versions.0 = xplane;
            s.versions.1 = xplm;
        });
    }

    pub fn spoken(&self) -> Vec<String> {
        with(|s| s.spoken.clone())
    }

    /// Reports an SDK misuse error to the installed error callback, if any.
    pub fn raise_error(&self, message: &str) {
        let Some(callback) = with(|s| s.error_callback) else {
            return;
        };
        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
        unsafe { callback(message.as_ptr()) };
    }

    // plugins

    /// Registers another loaded plugin and returns its id.
    pub fn add_plugin(&self, name: &str, signature: &str, path: &str) -> i32 {
        with(|s| {
            let id = s.plugins.len() as c_int;
            s.plugins.push(FakePlugin {
                id,
                name: name.to_owned(),
                path: path.to_owned(),
                signature: signature.to_owned(),
                enabled: true,
            });
            id
        })
    }

    /// `(target, message)` pairs; the target is -1 for broadcasts.
    pub fn sent_messages(&self) -> Vec<(i32, i32)> {
        with(|s| s.sent_messages.clone())
    }

    // scenery

    pub fn set_terrain_height(&self, y: f32) {
        with(|s| s.terrain_height = y);
    }

    pub fn set_magnetic_variation(&self, degrees: f32) {
        with(|s| s.magnetic_variation = degrees);
    }

    pub fn live_objects(&self) -> usize {
        with(|s| s.objects.len())
    }

    /// Finishes every pending asynchronous object load. Paths under `missing/` fail.
    pub fn complete_object_loads(&self) {
        let pending = with(|s| std::mem::take(&mut s.pending_loads));
        for (path, callback, refcon) in pending {
            let object = with(|s| s.load_object(&path));
            if let Some(callback) = callback {
                unsafe { callback(handle(object), refcon) };
            }
        }
    }

    /// Makes `path` a library path resolving to `objects`.
    pub fn define_library(&self, path: &str, objects: &[&str]) {
        with(|s| {
            s.libraries
                .insert(path.to_owned(), objects.iter().map(|&o| o.to_owned()).collect())
        });
    }

    pub fn instance_datarefs(&self) -> Vec<String> {
        with(|s| s.instance_datarefs.clone())
    }

    pub fn last_instance_position(&self) -> Option<(DrawInfo, Vec<f32>)> {
        with(|s| s.last_instance_position.clone())
    }

    // planes

    /// Models passed with the last acquisition request.
    pub fn acquired_models(&self) -> Vec<String> {
        with(|s| s.acquired_models.clone())
    }

    /// While held, acquisition requests are queued instead of granted.
    pub fn hold_planes(&self, hold: bool) {
        with(|s| s.hold_planes = hold);
    }

    /// Another plugin released the planes: grants the queued request.
    pub fn planes_available(&self) {
        let Some((callback, refcon)) = with(|s| {
            let queued = s.planes_callback.take()?;
            s.planes_owned = true;
            Some(queued)
        }) else {
            return;
        };
        if let Some(callback) = callback {
            unsafe { callback(refcon) };
        }
    }

    // camera

    /// Runs the camera controller for one frame.
    pub fn tick_camera(&self, losing_control: bool) {
        let Some((Some(callback), refcon, _)) = with(|s| s.camera) else {
            return;
        };
        let mut pos = with(|s| s.camera_position);
        let keep = unsafe { callback(&mut pos, losing_control as c_int, refcon) };
        with(|s| {
            s.camera_position = pos;
            let still_current = s.camera.is_some_and(|(_, r, _)| r == refcon);
            if still_current && (keep == 0 || losing_control) {
                s.camera = None;
            }
        });
    }

    // menus

    pub fn menu_parent(&self, menu: MenuId) -> Option<(MenuId, i32)> {
        with(|s| {
            let (parent, index) = s.menus.get(&key(menu.as_raw()))?.parent?;
            Some((MenuId::from_raw(handle(parent))?, index))
        })
    }

    /// Appends an item the way another plugin sharing `menu` would. Returns its host index.
    pub fn add_foreign_menu_item(&self, menu: MenuId, name: &str) -> usize {
        with(|s| {
            let Some(m) = s.menus.get_mut(&key(menu.as_raw())) else {
                return usize::MAX;
            };
            m.items.push(FakeMenuItem {
                name: name.to_owned(),
                check: 0,
                enabled: true,
                item_ref: 0,
                command: None,
            });
            m.items.len() - 1
        })
    }

    pub fn menu_item(&self, menu: MenuId, index: usize) -> Option<FakeMenuItem> {
        with(|s| s.menus.get(&key(menu.as_raw()))?.items.get(index).cloned())
    }

    /// Picks item `index` the way a user would.
    pub fn click_menu_item(&self, menu: MenuId, index: usize) {
        let Some(item) = self.menu_item(menu, index) else {
            return;
        };
        match item.command {
            Some(command) => xplm::run_command_once(command),
            None => self.click_menu_item_with_ref(menu, item.item_ref),
        }
    }

    /// Calls the menu handler with an arbitrary item refcon.
    pub fn click_menu_item_with_ref(&self, menu: MenuId, item_ref: usize) {
        let Some((Some(callback), menu_ref)) =
            with(|s| s.menus.get(&key(menu.as_raw())).map(|m| (m.handler, m.menu_ref)))
        else {
            return;
        };
        unsafe { callback(menu_ref, item_ref as Refcon) };
    }

    // graphics

    /// Arguments of the last `XPLMSetGraphicsState` call, in call order.
    pub fn graphics_state(&self) -> Option<[i32; 7]> {
        with(|s| s.graphics_state)
    }

    /// Draw calls so far, one line each.
    pub fn drawn(&self) -> Vec<String> {
        with(|s| s.drawn.clone())
    }

    // widgets

    /// Destroys `id` and its children the way the host does when their window goes away.
    pub fn destroy_widget_tree(&self, id: WidgetId) {
        widgets::destroy_tree(key(id.as_raw()), true, false);
    }

    /// Presses the mouse on `id` at the global point `(x, y)`. Returns whether it was consumed.
    pub fn click_widget(&self, id: WidgetId, x: i32, y: i32) -> bool {
        let mouse = MouseState { x, y, button: 0, delta: 0 };
        let param1 = &mouse as *const MouseState as isize;
        widgets::send(key(id.as_raw()), WidgetMessage::MOUSE_DOWN.0, 0, param1, 0) != 0
    }

    /// Asks `id` which cursor to show at `(x, y)`. Returns the raw cursor status.
    pub fn adjust_cursor(&self, id: WidgetId, x: i32, y: i32) -> i32 {
        let mouse = MouseState { x, y, button: 0, delta: 0 };
        let mut cursor: c_int = 0;
        widgets::send(
            key(id.as_raw()),
            WidgetMessage::CURSOR_ADJUST.0,
            0,
            &mouse as *const MouseState as isize,
            &mut cursor as *mut c_int as isize,
        );
        cursor
    }
}

impl HostState {
    /// Loads an object, or returns 0 for paths under `missing/`.
    pub(crate) fn load_object(&mut self, path: &str) -> usize {
        if path.starts_with("missing/") {
            return 0;
        }
        let id = self.alloc();
        self.objects.insert(id);
        id
    }
}
