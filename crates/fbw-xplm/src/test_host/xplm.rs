//! Fake `XPLM` exports.

use super::{handle, hit, key, with, DataEntry, FakeAccessor, FakeLoop, FakeMenu, FakeMenuItem, FakeValue};
use crate::api::*;
use crate::camera::CameraPosition;
use crate::instance::DrawInfo;
use crate::processing::CreateFlightLoop;
use crate::scenery::ProbeInfo;
use crate::strings::{from_ptr, write_to_ptr, INFO_BUF, PATH_BUF};
use std::ffi::{c_char, c_int, c_void, CStr, CString};

pub(super) fn fake_xplm() -> XplmApi {
    XplmApi {
        find_data_ref,
        can_write_data_ref,
        is_data_ref_good,
        get_data_ref_types,
        get_datai,
        set_datai,
        get_dataf,
        set_dataf,
        get_datad,
        set_datad,
        get_datavi,
        set_datavi,
        get_datavf,
        set_datavf,
        get_datab,
        set_datab,
        register_data_accessor,
        unregister_data_accessor,
        share_data,
        unshare_data,

        create_flight_loop,
        destroy_flight_loop,
        schedule_flight_loop,
        get_elapsed_time,
        get_cycle_number,

        find_command,
        create_command,
        command_begin,
        command_end,
        command_once,
        register_command_handler,
        unregister_command_handler,
        get_system_path,
        get_prefs_path,
        get_directory_separator,
        load_data_file,
        save_data_file,
        get_versions,
        get_language,
        find_symbol,
        set_error_callback,
        debug_string,
        speak_string,
        get_virtual_key_description,
        reload_scenery,

        get_my_id,
        count_plugins,
        get_nth_plugin,
        find_plugin_by_path,
        find_plugin_by_signature,
        get_plugin_info,
        is_plugin_enabled,
        enable_plugin,
        disable_plugin,
        reload_plugins,
        send_message_to_plugin,
        has_feature,
        is_feature_enabled,
        enable_feature,
        enumerate_features,

        create_probe,
        destroy_probe,
        probe_terrain_xyz,
        get_magnetic_variation,
        deg_true_to_deg_magnetic,
        deg_magnetic_to_deg_true,
        load_object,
        load_object_async,
        unload_object,
        lookup_objects,

        create_instance,
        destroy_instance,
        instance_set_position,

        set_users_aircraft,
        place_user_at_airport,
        place_user_at_location,
        count_aircraft,
        get_nth_aircraft_model,
        acquire_planes,
        release_planes,
        set_aircraft_model,
        disable_ai_for_plane,

        control_camera,
        dont_control_camera,
        is_camera_being_controlled,
        read_camera_position,

        find_plugins_menu,
        find_aircraft_menu,
        create_menu,
        destroy_menu,
        clear_all_menu_items,
        append_menu_item,
        append_menu_item_with_command,
        append_menu_separator,
        set_menu_item_name,
        check_menu_item,
        check_menu_item_state,
        enable_menu_item,
        remove_menu_item,

        set_graphics_state,
        bind_texture_2d,
        generate_texture_numbers,
        world_to_local,
        local_to_world,
        draw_translucent_dark_box,
        draw_string,
        draw_number,
        get_font_dimensions,
        measure_string,
    }
}

unsafe fn text(ptr: *const c_char) -> String {
    unsafe { from_ptr(ptr) }.unwrap_or_default()
}

/// Reads a NULL-terminated array of C strings.
unsafe fn text_list(mut list: *mut *const c_char) -> Vec<String> {
    let mut out = Vec::new();
    if list.is_null() {
        return out;
    }
    unsafe {
        while !(*list).is_null() {
            out.push(text(*list));
            list = list.add(1);
        }
    }
    out
}

unsafe fn put<T>(dst: *mut T, value: T) {
    if let Some(dst) = unsafe { dst.as_mut() } {
        *dst = value;
    }
}

// data access

/// Copy of what a dataref handle refers to, taken so no borrow is held during callbacks.
enum Target {
    Native(FakeValue),
    Accessor(FakeAccessor),
}

fn target(dr: Handle) -> Option<Target> {
    with(|s| {
        Some(match &s.data.get(&key(dr))?.entry {
            DataEntry::Native { value, .. } => Target::Native(value.clone()),
            DataEntry::Accessor(a) => Target::Accessor(*a),
        })
    })
}

/// Applies `f` to a writable host-owned value, then tells the subscribers of shared data.
fn modify_native(dr: Handle, f: impl FnOnce(&mut FakeValue)) {
    let changed = with(|s| match s.data.get_mut(&key(dr)) {
        Some(super::FakeData {
            name,
            entry: DataEntry::Native { value, writable: true },
        }) => {
            f(value);
            Some(name.clone())
        }
        _ => None,
    });
    if let Some(name) = changed {
        notify_shared(&name);
    }
}

fn notify_shared(name: &str) {
    let subscribers = with(|s| s.shared.get(name).cloned().unwrap_or_default());
    for (notify, refcon) in subscribers {
        if let Some(notify) = notify {
            unsafe { notify(refcon) };
        }
    }
}

unsafe extern "C" fn find_data_ref(name: *const c_char) -> Handle {
    hit("XPLMFindDataRef");
    let name = unsafe { text(name) };
    with(|s| s.data_names.get(&name).map_or(std::ptr::null_mut(), |&id| handle(id)))
}

unsafe extern "C" fn can_write_data_ref(dr: Handle) -> c_int {
    hit("XPLMCanWriteDataRef");
    match target(dr) {
        Some(Target::Accessor(a)) => a.writable as c_int,
        Some(Target::Native(_)) => with(|s| {
            matches!(s.data.get(&key(dr)).map(|d| &d.entry), Some(DataEntry::Native { writable: true, .. })) as c_int
        }),
        None => 0,
    }
}

unsafe extern "C" fn is_data_ref_good(dr: Handle) -> c_int {
    hit("XPLMIsDataRefGood");
    target(dr).is_some() as c_int
}

unsafe extern "C" fn get_data_ref_types(dr: Handle) -> c_int {
    hit("XPLMGetDataRefTypes");
    match target(dr) {
        Some(Target::Native(v)) => v.types(),
        Some(Target::Accessor(a)) => a.types,
        None => 0,
    }
}

macro_rules! scalar_fakes {
    ($get:ident, $set:ident, $get_sym:literal, $set_sym:literal, $ty:ty, $read:ident, $write:ident) => {
        unsafe extern "C" fn $get(dr: Handle) -> $ty {
            hit($get_sym);
            match target(dr) {
                Some(Target::Native(v)) => v.scalar() as $ty,
                Some(Target::Accessor(a)) => a.$read.map_or(Default::default(), |f| unsafe { f(a.read_refcon) }),
                None => Default::default(),
            }
        }

        unsafe extern "C" fn $set(dr: Handle, value: $ty) {
            hit($set_sym);
            match target(dr) {
                Some(Target::Native(_)) => modify_native(dr, |v| v.set_scalar(value as f64)),
                Some(Target::Accessor(a)) if a.writable => {
                    if let Some(f) = a.$write {
                        unsafe { f(a.write_refcon, value) };
                    }
                }
                _ => {}
            }
        }
    };
}

scalar_fakes!(get_datai, set_datai, "XPLMGetDatai", "XPLMSetDatai", c_int, read_int, write_int);
scalar_fakes!(get_dataf, set_dataf, "XPLMGetDataf", "XPLMSetDataf", f32, read_float, write_float);
scalar_fakes!(get_datad, set_datad, "XPLMGetDatad", "XPLMSetDatad", f64, read_double, write_double);

trait Element: Copy {
    fn slot(value: &mut FakeValue) -> Option<&mut Vec<Self>>;
}

impl Element for c_int {
    fn slot(value: &mut FakeValue) -> Option<&mut Vec<Self>> {
        match value {
            FakeValue::Ints(v) => Some(v),
            _ => None,
        }
    }
}

impl Element for f32 {
    fn slot(value: &mut FakeValue) -> Option<&mut Vec<Self>> {
        match value {
            FakeValue::Floats(v) => Some(v),
            _ => None,
        }
    }
}

impl Element for u8 {
    fn slot(value: &mut FakeValue) -> Option<&mut Vec<Self>> {
        match value {
            FakeValue::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

/// With a null `dst` returns the element count; otherwise copies from `offset` on.
unsafe fn read_native<T: Element>(value: &mut FakeValue, dst: *mut T, offset: c_int, max: c_int) -> c_int {
    let Some(src) = T::slot(value) else {
        return 0;
    };
    if dst.is_null() {
        return src.len() as c_int;
    }
    let offset = offset.max(0) as usize;
    let n = src.len().saturating_sub(offset).min(max.max(0) as usize);
    unsafe { std::ptr::copy_nonoverlapping(src[offset..].as_ptr(), dst, n) };
    n as c_int
}

/// Writes past the end are dropped.
unsafe fn write_native<T: Element>(value: &mut FakeValue, src: *const T, offset: c_int, count: c_int) {
    let Some(dst) = T::slot(value) else {
        return;
    };
    if src.is_null() {
        return;
    }
    let offset = offset.max(0) as usize;
    let n = dst.len().saturating_sub(offset).min(count.max(0) as usize);
    unsafe { std::ptr::copy_nonoverlapping(src, dst[offset..].as_mut_ptr(), n) };
}

macro_rules! vector_fakes {
    ($get:ident, $set:ident, $get_sym:literal, $set_sym:literal, $raw:ty, $elem:ty, $read:ident, $write:ident) => {
        unsafe extern "C" fn $get(dr: Handle, values: *mut $raw, offset: c_int, max: c_int) -> c_int {
            hit($get_sym);
            if values.is_null() {
                with(|s| s.null_vector_probes += 1);
            }
            match target(dr) {
                Some(Target::Native(mut v)) => unsafe { read_native::<$elem>(&mut v, values.cast(), offset, max) },
                Some(Target::Accessor(a)) => a.$read.map_or(0, |f| unsafe { f(a.read_refcon, values, offset, max) }),
                None => 0,
            }
        }

        unsafe extern "C" fn $set(dr: Handle, values: *mut $raw, offset: c_int, count: c_int) {
            hit($set_sym);
            match target(dr) {
                Some(Target::Native(_)) => {
                    modify_native(dr, |v| unsafe { write_native::<$elem>(v, values.cast_const().cast(), offset, count) })
                }
                Some(Target::Accessor(a)) if a.writable => {
                    if let Some(f) = a.$write {
                        unsafe { f(a.write_refcon, values, offset, count) };
                    }
                }
                _ => {}
            }
        }
    };
}

vector_fakes!(get_datavi, set_datavi, "XPLMGetDatavi", "XPLMSetDatavi", c_int, c_int, read_int_array, write_int_array);
vector_fakes!(get_datavf, set_datavf, "XPLMGetDatavf", "XPLMSetDatavf", f32, f32, read_float_array, write_float_array);
vector_fakes!(get_datab, set_datab, "XPLMGetDatab", "XPLMSetDatab", c_void, u8, read_data, write_data);

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn register_data_accessor(
    name: *const c_char,
    types: c_int,
    writable: c_int,
    read_int: ReadIntFn,
    write_int: WriteIntFn,
    read_float: ReadFloatFn,
    write_float: WriteFloatFn,
    read_double: ReadDoubleFn,
    write_double: WriteDoubleFn,
    read_int_array: ReadIntVectorFn,
    write_int_array: WriteIntVectorFn,
    read_float_array: ReadFloatVectorFn,
    write_float_array: WriteFloatVectorFn,
    read_data: ReadByteVectorFn,
    write_data: WriteByteVectorFn,
    read_refcon: Refcon,
    write_refcon: Refcon,
) -> Handle {
    hit("XPLMRegisterDataAccessor");
    let name = unsafe { text(name) };
    with(|s| {
        if s.refuse {
            return std::ptr::null_mut();
        }
        let accessor = FakeAccessor {
            types,
            writable: writable != 0,
            read_int,
            write_int,
            read_float,
            write_float,
            read_double,
            write_double,
            read_int_array,
            write_int_array,
            read_float_array,
            write_float_array,
            read_data,
            write_data,
            read_refcon,
            write_refcon,
        };
        handle(s.add_data(&name, DataEntry::Accessor(accessor)))
    })
}

unsafe extern "C" fn unregister_data_accessor(dr: Handle) {
    hit("XPLMUnregisterDataAccessor");
    with(|s| {
        let Some(data) = s.data.remove(&key(dr)) else {
            return;
        };
        if s.data_names.get(&data.name) == Some(&key(dr)) {
            s.data_names.remove(&data.name);
        }
    });
}

unsafe extern "C" fn share_data(name: *const c_char, types: c_int, notify: DataChangedFn, refcon: Refcon) -> c_int {
    hit("XPLMShareData");
    let name = unsafe { text(name) };
    with(|s| {
        match s.data_names.get(&name).and_then(|id| s.data.get(id)) {
            Some(existing) => {
                let existing_types = match &existing.entry {
                    DataEntry::Native { value, .. } => value.types(),
                    DataEntry::Accessor(a) => a.types,
                };
                if existing_types != types {
                    return 0;
                }
            }
            None => {
                s.add_data(
                    &name,
                    DataEntry::Native {
                        value: FakeValue::for_types(types),
                        writable: true,
                    },
                );
            }
        }
        s.shared.entry(name).or_default().push((notify, refcon));
        1
    })
}

unsafe extern "C" fn unshare_data(name: *const c_char, _types: c_int, notify: DataChangedFn, refcon: Refcon) -> c_int {
    hit("XPLMUnshareData");
    let name = unsafe { text(name) };
    let target = notify.map(|f| f as usize);
    with(|s| {
        let Some(subscribers) = s.shared.get_mut(&name) else {
            return 0;
        };
        match subscribers
            .iter()
            .position(|&(f, r)| f.map(|f| f as usize) == target && r == refcon)
        {
            Some(i) => {
                subscribers.remove(i);
                1
            }
            None => 0,
        }
    })
}

// processing

unsafe extern "C" fn create_flight_loop(params: *mut CreateFlightLoop) -> Handle {
    hit("XPLMCreateFlightLoop");
    let Some(params) = (unsafe { params.as_ref() }) else {
        return std::ptr::null_mut();
    };
    with(|s| {
        s.last_loop_struct_size = params.struct_size as usize;
        if s.refuse {
            return std::ptr::null_mut();
        }
        let id = s.alloc();
        s.loops.insert(
            id,
            FakeLoop {
                callback: params.callback,
                refcon: params.refcon,
                interval: 0.0,
                since_last_call: 0.0,
            },
        );
        handle(id)
    })
}

unsafe extern "C" fn destroy_flight_loop(flight_loop: Handle) {
    hit("XPLMDestroyFlightLoop");
    with(|s| s.loops.remove(&key(flight_loop)));
}

unsafe extern "C" fn schedule_flight_loop(flight_loop: Handle, interval: f32, _relative_to_now: c_int) {
    hit("XPLMScheduleFlightLoop");
    with(|s| {
        if let Some(l) = s.loops.get_mut(&key(flight_loop)) {
            l.interval = interval;
        }
    });
}

unsafe extern "C" fn get_elapsed_time() -> f32 {
    hit("XPLMGetElapsedTime");
    with(|s| s.elapsed)
}

unsafe extern "C" fn get_cycle_number() -> c_int {
    hit("XPLMGetCycleNumber");
    with(|s| s.cycle)
}

// commands

unsafe extern "C" fn find_command(name: *const c_char) -> Handle {
    hit("XPLMFindCommand");
    let name = unsafe { text(name) };
    with(|s| s.command_names.get(&name).map_or(std::ptr::null_mut(), |&id| handle(id)))
}

unsafe extern "C" fn create_command(name: *const c_char, _description: *const c_char) -> Handle {
    hit("XPLMCreateCommand");
    let name = unsafe { text(name) };
    with(|s| {
        if s.refuse {
            return std::ptr::null_mut();
        }
        handle(s.command(&name))
    })
}

const BEGIN: c_int = 0;
const END: c_int = 2;

/// Runs one phase: before handlers, the simulator's own action on `Begin`, after handlers.
/// A handler returning 0 stops everything behind it.
fn run_command_phase(command: usize, phase: c_int) {
    let Some((before, after)) = with(|s| s.commands.get(&command).map(|c| (c.before.clone(), c.after.clone())))
    else {
        return;
    };
    let run = |handlers: Vec<(CommandFn, Refcon)>| {
        handlers
            .into_iter()
            .filter_map(|(f, refcon)| Some((f?, refcon)))
            .all(|(f, refcon)| unsafe { f(handle(command), phase, refcon) } != 0)
    };
    if !run(before) {
        return;
    }
    if phase == BEGIN {
        with(|s| {
            if let Some(c) = s.commands.get_mut(&command) {
                c.executions += 1;
            }
        });
    }
    run(after);
}

pub(super) fn run_command_once(command: usize) {
    run_command_phase(command, BEGIN);
    run_command_phase(command, END);
}

unsafe extern "C" fn command_begin(command: Handle) {
    hit("XPLMCommandBegin");
    run_command_phase(key(command), BEGIN);
}

unsafe extern "C" fn command_end(command: Handle) {
    hit("XPLMCommandEnd");
    run_command_phase(key(command), END);
}

unsafe extern "C" fn command_once(command: Handle) {
    hit("XPLMCommandOnce");
    run_command_once(key(command));
}

unsafe extern "C" fn register_command_handler(command: Handle, handler: CommandFn, before: c_int, refcon: Refcon) {
    hit("XPLMRegisterCommandHandler");
    with(|s| {
        if let Some(c) = s.commands.get_mut(&key(command)) {
            let list = if before != 0 { &mut c.before } else { &mut c.after };
            list.push((handler, refcon));
        }
    });
}

unsafe extern "C" fn unregister_command_handler(command: Handle, handler: CommandFn, before: c_int, refcon: Refcon) {
    hit("XPLMUnregisterCommandHandler");
    let target = handler.map(|f| f as usize);
    with(|s| {
        if let Some(c) = s.commands.get_mut(&key(command)) {
            let list = if before != 0 { &mut c.before } else { &mut c.after };
            if let Some(i) = list
                .iter()
                .position(|&(f, r)| f.map(|f| f as usize) == target && r == refcon)
            {
                list.remove(i);
            }
        }
    });
}

// utilities

unsafe extern "C" fn get_system_path(out_path: *mut c_char) {
    hit("XPLMGetSystemPath");
    let path = with(|s| s.system_path.clone());
    unsafe { write_to_ptr(out_path, PATH_BUF, &path) };
}

unsafe extern "C" fn get_prefs_path(out_path: *mut c_char) {
    hit("XPLMGetPrefsPath");
    let path = with(|s| format!("{}Output/preferences/X-Plane.prf", s.system_path));
    unsafe { write_to_ptr(out_path, PATH_BUF, &path) };
}

unsafe extern "C" fn get_directory_separator() -> *const c_char {
    hit("XPLMGetDirectorySeparator");
    c"/".as_ptr()
}

unsafe extern "C" fn load_data_file(_file_type: c_int, path: *const c_char) -> c_int {
    hit("XPLMLoadDataFile");
    !path.is_null() as c_int
}

unsafe extern "C" fn save_data_file(_file_type: c_int, path: *const c_char) -> c_int {
    hit("XPLMSaveDataFile");
    !path.is_null() as c_int
}

unsafe extern "C" fn get_versions(xplane: *mut c_int, xplm: *mut c_int, host_id: *mut c_int) {
    hit("XPLMGetVersions");
    let (x, sdk, host) = with(|s| s.versions);
    unsafe {
        put(xplane, x);
        put(xplm, sdk);
        put(host_id, host);
    }
}

unsafe extern "C" fn get_language() -> c_int {
    hit("XPLMGetLanguage");
    1
}

unsafe extern "C" fn find_symbol(_name: *const c_char) -> *mut c_void {
    hit("XPLMFindSymbol");
    std::ptr::null_mut()
}

unsafe extern "C" fn set_error_callback(callback: ErrorFn) {
    hit("XPLMSetErrorCallback");
    with(|s| s.error_callback = callback);
}

unsafe extern "C" fn debug_string(text_ptr: *const c_char) {
    hit("XPLMDebugString");
    let line = unsafe { text(text_ptr) };
    with(|s| s.log.push_str(&line));
}

unsafe extern "C" fn speak_string(text_ptr: *const c_char) {
    hit("XPLMSpeakString");
    let line = unsafe { text(text_ptr) };
    with(|s| s.spoken.push(line));
}

const FUNCTION_KEYS: [&CStr; 12] = [
    c"F1", c"F2", c"F3", c"F4", c"F5", c"F6", c"F7", c"F8", c"F9", c"F10", c"F11", c"F12",
];

unsafe extern "C" fn get_virtual_key_description(key_code: c_char) -> *const c_char {
    hit("XPLMGetVirtualKeyDescription");
    match key_code as u8 {
        k @ 0x70..=0x7b => FUNCTION_KEYS[(k - 0x70) as usize].as_ptr(),
        _ => std::ptr::null(),
    }
}

unsafe extern "C" fn reload_scenery() {
    hit("XPLMReloadScenery");
}

// plugin registry

unsafe extern "C" fn get_my_id() -> c_int {
    hit("XPLMGetMyID");
    1
}

unsafe extern "C" fn count_plugins() -> c_int {
    hit("XPLMCountPlugins");
    with(|s| s.plugins.len() as c_int)
}

unsafe extern "C" fn get_nth_plugin(index: c_int) -> c_int {
    hit("XPLMGetNthPlugin");
    with(|s| {
        usize::try_from(index)
            .ok()
            .and_then(|i| s.plugins.get(i))
            .map_or(-1, |p| p.id)
    })
}

unsafe extern "C" fn find_plugin_by_path(path: *const c_char) -> c_int {
    hit("XPLMFindPluginByPath");
    let path = unsafe { text(path) };
    with(|s| s.plugins.iter().find(|p| p.path == path).map_or(-1, |p| p.id))
}

unsafe extern "C" fn find_plugin_by_signature(signature: *const c_char) -> c_int {
    hit("XPLMFindPluginBySignature");
    let signature = unsafe { text(signature) };
    with(|s| s.plugins.iter().find(|p| p.signature == signature).map_or(-1, |p| p.id))
}

unsafe extern "C" fn get_plugin_info(
    plugin: c_int,
    out_name: *mut c_char,
    out_file_path: *mut c_char,
    out_signature: *mut c_char,
    out_description: *mut c_char,
) {
    hit("XPLMGetPluginInfo");
    let Some((name, path, signature)) = with(|s| {
        s.plugins
            .iter()
            .find(|p| p.id == plugin)
            .map(|p| (p.name.clone(), p.path.clone(), p.signature.clone()))
    }) else {
        return;
    };
    unsafe {
        write_to_ptr(out_name, INFO_BUF, &name);
        write_to_ptr(out_file_path, PATH_BUF, &path);
        write_to_ptr(out_signature, INFO_BUF, &signature);
        write_to_ptr(out_description, INFO_BUF, "");
    }
}

fn set_plugin_enabled(plugin: c_int, enabled: bool) -> bool {
    with(|s| match s.plugins.iter_mut().find(|p| p.id == plugin) {
        Some(p) => {
            p.enabled = enabled;
            true
        }
        None => false,
    })
}

unsafe extern "C" fn is_plugin_enabled(plugin: c_int) -> c_int {
    hit("XPLMIsPluginEnabled");
    with(|s| s.plugins.iter().any(|p| p.id == plugin && p.enabled) as c_int)
}

unsafe extern "C" fn enable_plugin(plugin: c_int) -> c_int {
    hit("XPLMEnablePlugin");
    set_plugin_enabled(plugin, true) as c_int
}

unsafe extern "C" fn disable_plugin(plugin: c_int) {
    hit("XPLMDisablePlugin");
    set_plugin_enabled(plugin, false);
}

unsafe extern "C" fn reload_plugins() {
    hit("XPLMReloadPlugins");
}

unsafe extern "C" fn send_message_to_plugin(plugin: c_int, message: c_int, _param: *mut c_void) {
    hit("XPLMSendMessageToPlugin");
    with(|s| s.sent_messages.push((plugin, message)));
}

unsafe extern "C" fn has_feature(feature: *const c_char) -> c_int {
    hit("XPLMHasFeature");
    let feature = unsafe { text(feature) };
    with(|s| s.features.iter().any(|(name, _)| *name == feature) as c_int)
}

unsafe extern "C" fn is_feature_enabled(feature: *const c_char) -> c_int {
    hit("XPLMIsFeatureEnabled");
    let feature = unsafe { text(feature) };
    with(|s| s.features.iter().any(|(name, on)| *name == feature && *on) as c_int)
}

unsafe extern "C" fn enable_feature(feature: *const c_char, enable: c_int) {
    hit("XPLMEnableFeature");
    let feature = unsafe { text(feature) };
    with(|s| {
        if let Some((_, on)) = s.features.iter_mut().find(|(name, _)| *name == feature) {
            *on = enable != 0;
        }
    });
}

unsafe extern "C" fn enumerate_features(enumerator: NameEnumeratorFn, refcon: Refcon) {
    hit("XPLMEnumerateFeatures");
    let Some(enumerator) = enumerator else {
        return;
    };
    let names: Vec<String> = with(|s| s.features.iter().map(|(name, _)| name.clone()).collect());
    for name in names {
        let name = CString::new(name).unwrap_or_default();
        unsafe { enumerator(name.as_ptr(), refcon) };
    }
}

// scenery

unsafe extern "C" fn create_probe(_probe_type: c_int) -> Handle {
    hit("XPLMCreateProbe");
    with(|s| {
        if s.refuse {
            return std::ptr::null_mut();
        }
        let id = s.alloc();
        s.probes.insert(id);
        handle(id)
    })
}

unsafe extern "C" fn destroy_probe(probe: Handle) {
    hit("XPLMDestroyProbe");
    with(|s| s.probes.remove(&key(probe)));
}

unsafe extern "C" fn probe_terrain_xyz(probe: Handle, x: f32, _y: f32, z: f32, info: *mut ProbeInfo) -> c_int {
    hit("XPLMProbeTerrainXYZ");
    let Some(height) = with(|s| s.probes.contains(&key(probe)).then_some(s.terrain_height)) else {
        return 1;
    };
    if let Some(info) = unsafe { info.as_mut() } {
        info.location_x = x;
        info.location_y = height;
        info.location_z = z;
        info.normal_x = 0.0;
        info.normal_y = 1.0;
        info.normal_z = 0.0;
        info.velocity_x = 0.0;
        info.velocity_y = 0.0;
        info.velocity_z = 0.0;
        info.is_wet = 0;
    }
    0
}

unsafe extern "C" fn get_magnetic_variation(_latitude: f64, _longitude: f64) -> f32 {
    hit("XPLMGetMagneticVariation");
    with(|s| s.magnetic_variation)
}

unsafe extern "C" fn deg_true_to_deg_magnetic(heading: f32) -> f32 {
    hit("XPLMDegTrueToDegMagnetic");
    heading - with(|s| s.magnetic_variation)
}

unsafe extern "C" fn deg_magnetic_to_deg_true(heading: f32) -> f32 {
    hit("XPLMDegMagneticToDegTrue");
    heading + with(|s| s.magnetic_variation)
}

unsafe extern "C" fn load_object(path: *const c_char) -> Handle {
    hit("XPLMLoadObject");
    let path = unsafe { text(path) };
    handle(with(|s| s.load_object(&path)))
}

unsafe extern "C" fn load_object_async(path: *const c_char, callback: ObjectLoadedFn, refcon: Refcon) {
    hit("XPLMLoadObjectAsync");
    let path = unsafe { text(path) };
    with(|s| s.pending_loads.push((path, callback, refcon)));
}

unsafe extern "C" fn unload_object(object: Handle) {
    hit("XPLMUnloadObject");
    with(|s| s.objects.remove(&key(object)));
}

unsafe extern "C" fn lookup_objects(
    path: *const c_char,
    _latitude: f32,
    _longitude: f32,
    enumerator: NameEnumeratorFn,
    refcon: Refcon,
) -> c_int {
    hit("XPLMLookupObjects");
    let path = unsafe { text(path) };
    let objects = with(|s| s.libraries.get(&path).cloned().unwrap_or_default());
    if let Some(enumerator) = enumerator {
        for object in &objects {
            let object = CString::new(object.as_str()).unwrap_or_default();
            unsafe { enumerator(object.as_ptr(), refcon) };
        }
    }
    objects.len() as c_int
}

// instancing

unsafe extern "C" fn create_instance(object: Handle, datarefs: *mut *const c_char) -> Handle {
    hit("XPLMCreateInstance");
    let names = unsafe { text_list(datarefs) };
    with(|s| {
        if s.refuse || !s.objects.contains(&key(object)) {
            return std::ptr::null_mut();
        }
        let id = s.alloc();
        s.instances.insert(id, names.len());
        s.instance_datarefs = names;
        handle(id)
    })
}

unsafe extern "C" fn destroy_instance(instance: Handle) {
    hit("XPLMDestroyInstance");
    with(|s| s.instances.remove(&key(instance)));
}

unsafe extern "C" fn instance_set_position(instance: Handle, position: *const DrawInfo, data: *const f32) {
    hit("XPLMInstanceSetPosition");
    let Some(count) = with(|s| s.instances.get(&key(instance)).copied()) else {
        return;
    };
    let Some(position) = (unsafe { position.as_ref() }).copied() else {
        return;
    };
    let values = if data.is_null() {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(data, count) }.to_vec()
    };
    with(|s| s.last_instance_position = Some((position, values)));
}

// planes

unsafe extern "C" fn set_users_aircraft(path: *const c_char) {
    hit("XPLMSetUsersAircraft");
    let path = unsafe { text(path) };
    with(|s| s.user_aircraft = path);
}

unsafe extern "C" fn place_user_at_airport(_code: *const c_char) {
    hit("XPLMPlaceUserAtAirport");
}

unsafe extern "C" fn place_user_at_location(
    _latitude: f64,
    _longitude: f64,
    _elevation_msl: f32,
    _heading_true: f32,
    _speed: f32,
) {
    hit("XPLMPlaceUserAtLocation");
}

unsafe extern "C" fn count_aircraft(total: *mut c_int, active: *mut c_int, controller: *mut c_int) {
    hit("XPLMCountAircraft");
    let owner = with(|s| if s.planes_owned { 1 } else { -1 });
    unsafe {
        put(total, 20);
        put(active, 1);
        put(controller, owner);
    }
}

unsafe extern "C" fn get_nth_aircraft_model(index: c_int, out_file: *mut c_char, out_path: *mut c_char) {
    hit("XPLMGetNthAircraftModel");
    let path = if index == 0 {
        with(|s| s.user_aircraft.clone())
    } else {
        String::new()
    };
    let file = path.rsplit('/').next().unwrap_or_default();
    unsafe {
        write_to_ptr(out_file, INFO_BUF, file);
        write_to_ptr(out_path, PATH_BUF, &path);
    }
}

unsafe extern "C" fn acquire_planes(aircraft: *mut *const c_char, callback: PlanesAvailableFn, refcon: Refcon) -> c_int {
    hit("XPLMAcquirePlanes");
    let models = unsafe { text_list(aircraft) };
    with(|s| {
        s.acquired_models = models;
        if s.hold_planes {
            s.planes_callback = Some((callback, refcon));
            return 0;
        }
        s.planes_owned = true;
        1
    })
}

unsafe extern "C" fn release_planes() {
    hit("XPLMReleasePlanes");
    with(|s| s.planes_owned = false);
}

unsafe extern "C" fn set_aircraft_model(_index: c_int, _path: *const c_char) {
    hit("XPLMSetAircraftModel");
}

unsafe extern "C" fn disable_ai_for_plane(_index: c_int) {
    hit("XPLMDisableAIForPlane");
}

// camera

unsafe extern "C" fn control_camera(how_long: c_int, control: CameraControlFn, refcon: Refcon) {
    hit("XPLMControlCamera");
    with(|s| s.camera = Some((control, refcon, how_long)));
}

unsafe extern "C" fn dont_control_camera() {
    hit("XPLMDontControlCamera");
    with(|s| s.camera = None);
}

unsafe extern "C" fn is_camera_being_controlled(duration: *mut c_int) -> c_int {
    hit("XPLMIsCameraBeingControlled");
    match with(|s| s.camera) {
        Some((_, _, how_long)) => {
            unsafe { put(duration, how_long) };
            1
        }
        None => 0,
    }
}

unsafe extern "C" fn read_camera_position(position: *mut CameraPosition) {
    hit("XPLMReadCameraPosition");
    let current = with(|s| s.camera_position);
    unsafe { put(position, current) };
}

// menus

unsafe extern "C" fn find_plugins_menu() -> Handle {
    hit("XPLMFindPluginsMenu");
    handle(with(|s| s.plugins_menu))
}

unsafe extern "C" fn find_aircraft_menu() -> Handle {
    hit("XPLMFindAircraftMenu");
    handle(with(|s| s.aircraft_menu))
}

unsafe extern "C" fn create_menu(
    _name: *const c_char,
    parent: Handle,
    parent_item: c_int,
    handler: MenuHandlerFn,
    menu_ref: Refcon,
) -> Handle {
    hit("XPLMCreateMenu");
    with(|s| {
        if s.refuse {
            return std::ptr::null_mut();
        }
        let id = s.alloc();
        s.menus.insert(
            id,
            FakeMenu {
                parent: (!parent.is_null()).then(|| (key(parent), parent_item)),
                handler,
                menu_ref,
                items: Vec::new(),
            },
        );
        handle(id)
    })
}

unsafe extern "C" fn destroy_menu(menu: Handle) {
    hit("XPLMDestroyMenu");
    with(|s| s.menus.remove(&key(menu)));
}

fn with_items<R: Default>(menu: Handle, f: impl FnOnce(&mut Vec<FakeMenuItem>) -> R) -> R {
    with(|s| s.menus.get_mut(&key(menu)).map(|m| f(&mut m.items)).unwrap_or_default())
}

fn with_item(menu: Handle, index: c_int, f: impl FnOnce(&mut FakeMenuItem)) {
    with_items(menu, |items| {
        if let Some(item) = usize::try_from(index).ok().and_then(|i| items.get_mut(i)) {
            f(item);
        }
    });
}

fn push_item(menu: Handle, name: String, item_ref: usize, command: Option<usize>) -> c_int {
    let pushed = with(|s| {
        let m = s.menus.get_mut(&key(menu))?;
        m.items.push(FakeMenuItem {
            name,
            check: 0,
            enabled: true,
            item_ref,
            command,
        });
        Some(m.items.len() as c_int - 1)
    });
    pushed.unwrap_or(-1)
}

unsafe extern "C" fn clear_all_menu_items(menu: Handle) {
    hit("XPLMClearAllMenuItems");
    with_items(menu, |items| items.clear());
}

unsafe extern "C" fn append_menu_item(menu: Handle, name: *const c_char, item_ref: Refcon, _deprecated: c_int) -> c_int {
    hit("XPLMAppendMenuItem");
    let name = unsafe { text(name) };
    push_item(menu, name, item_ref as usize, None)
}

unsafe extern "C" fn append_menu_item_with_command(menu: Handle, name: *const c_char, command: Handle) -> c_int {
    hit("XPLMAppendMenuItemWithCommand");
    let name = unsafe { text(name) };
    push_item(menu, name, 0, Some(key(command)))
}

unsafe extern "C" fn append_menu_separator(menu: Handle) -> c_int {
    hit("XPLMAppendMenuSeparator");
    push_item(menu, "-".to_owned(), 0, None)
}

unsafe extern "C" fn set_menu_item_name(menu: Handle, index: c_int, name: *const c_char, _deprecated: c_int) {
    hit("XPLMSetMenuItemName");
    let name = unsafe { text(name) };
    with_item(menu, index, |item| item.name = name);
}

unsafe extern "C" fn check_menu_item(menu: Handle, index: c_int, check: c_int) {
    hit("XPLMCheckMenuItem");
    with_item(menu, index, |item| item.check = check);
}

unsafe extern "C" fn check_menu_item_state(menu: Handle, index: c_int, out_check: *mut c_int) {
    hit("XPLMCheckMenuItemState");
    let mut check = 0;
    with_item(menu, index, |item| check = item.check);
    unsafe { put(out_check, check) };
}

unsafe extern "C" fn enable_menu_item(menu: Handle, index: c_int, enabled: c_int) {
    hit("XPLMEnableMenuItem");
    with_item(menu, index, |item| item.enabled = enabled != 0);
}

unsafe extern "C" fn remove_menu_item(menu: Handle, index: c_int) {
    hit("XPLMRemoveMenuItem");
    with_items(menu, |items| {
        if let Ok(i) = usize::try_from(index) {
            if i < items.len() {
                items.remove(i);
            }
        }
    });
}

// graphics

unsafe extern "C" fn set_graphics_state(
    fog: c_int,
    texture_units: c_int,
    lighting: c_int,
    alpha_testing: c_int,
    alpha_blending: c_int,
    depth_testing: c_int,
    depth_writing: c_int,
) {
    hit("XPLMSetGraphicsState");
    with(|s| {
        s.graphics_state = Some([
            fog,
            texture_units,
            lighting,
            alpha_testing,
            alpha_blending,
            depth_testing,
            depth_writing,
        ])
    });
}

unsafe extern "C" fn bind_texture_2d(_texture: c_int, _unit: c_int) {
    hit("XPLMBindTexture2d");
}

unsafe extern "C" fn generate_texture_numbers(out_ids: *mut c_int, count: c_int) {
    hit("XPLMGenerateTextureNumbers");
    if out_ids.is_null() || count <= 0 {
        return;
    }
    let ids = unsafe { std::slice::from_raw_parts_mut(out_ids, count as usize) };
    with(|s| {
        for id in ids {
            *id = s.next_texture;
            s.next_texture += 1;
        }
    });
}

// Local frame: x east, y up, z south.
unsafe extern "C" fn world_to_local(lat: f64, lon: f64, alt: f64, x: *mut f64, y: *mut f64, z: *mut f64) {
    hit("XPLMWorldToLocal");
    unsafe {
        put(x, lon);
        put(y, alt);
        put(z, -lat);
    }
}

unsafe extern "C" fn local_to_world(x: f64, y: f64, z: f64, lat: *mut f64, lon: *mut f64, alt: *mut f64) {
    hit("XPLMLocalToWorld");
    unsafe {
        put(lat, -z);
        put(lon, x);
        put(alt, y);
    }
}

unsafe extern "C" fn draw_translucent_dark_box(left: c_int, top: c_int, right: c_int, bottom: c_int) {
    hit("XPLMDrawTranslucentDarkBox");
    with(|s| s.drawn.push(format!("dark_box {left},{top},{right},{bottom}")));
}

unsafe extern "C" fn draw_string(
    _color: *mut f32,
    x: c_int,
    y: c_int,
    text_ptr: *const c_char,
    word_wrap_width: *mut c_int,
    font: c_int,
) {
    hit("XPLMDrawString");
    let line = unsafe { text(text_ptr) };
    let wrap = unsafe { word_wrap_width.as_ref() }.map_or_else(|| "-".to_owned(), |w| w.to_string());
    with(|s| s.drawn.push(format!("string {x},{y} font={font} wrap={wrap} {line}")));
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn draw_number(
    _color: *mut f32,
    x: c_int,
    y: c_int,
    value: f64,
    digits: c_int,
    decimals: c_int,
    show_sign: c_int,
    font: c_int,
) {
    hit("XPLMDrawNumber");
    let sign = if show_sign != 0 { "sign" } else { "nosign" };
    with(|s| {
        s.drawn
            .push(format!("number {x},{y} font={font} {value} {digits}.{decimals} {sign}"))
    });
}

fn char_size(font: c_int) -> (c_int, c_int) {
    match font {
        18 => (6, 10),
        _ => (8, 12),
    }
}

unsafe extern "C" fn get_font_dimensions(
    font: c_int,
    char_width: *mut c_int,
    char_height: *mut c_int,
    digits_only: *mut c_int,
) {
    hit("XPLMGetFontDimensions");
    let (w, h) = char_size(font);
    unsafe {
        put(char_width, w);
        put(char_height, h);
        put(digits_only, 0);
    }
}

unsafe extern "C" fn measure_string(font: c_int, _text: *const c_char, num_chars: c_int) -> f32 {
    hit("XPLMMeasureString");
    (char_size(font).0 * num_chars) as f32
}
