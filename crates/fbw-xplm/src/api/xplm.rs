use crate::camera::CameraPosition;
use crate::instance::DrawInfo;
use crate::processing::CreateFlightLoop;
use crate::scenery::ProbeInfo;
use std::ffi::{c_char, c_int, c_void};

pub type Handle = *mut c_void;
pub type Refcon = *mut c_void;

pub type ReadIntFn = Option<unsafe extern "C" fn(Refcon) -> c_int>;
pub type WriteIntFn = Option<unsafe extern "C" fn(Refcon, c_int)>;
pub type ReadFloatFn = Option<unsafe extern "C" fn(Refcon) -> f32>;
pub type WriteFloatFn = Option<unsafe extern "C" fn(Refcon, f32)>;
pub type ReadDoubleFn = Option<unsafe extern "C" fn(Refcon) -> f64>;
pub type WriteDoubleFn = Option<unsafe extern "C" fn(Refcon, f64)>;
pub type ReadIntVectorFn = Option<unsafe extern "C" fn(Refcon, *mut c_int, c_int, c_int) -> c_int>;
pub type WriteIntVectorFn = Option<unsafe extern "C" fn(Refcon, *mut c_int, c_int, c_int)>;
pub type ReadFloatVectorFn = Option<unsafe extern "C" fn(Refcon, *mut f32, c_int, c_int) -> c_int>;
pub type WriteFloatVectorFn = Option<unsafe extern "C" fn(Refcon, *mut f32, c_int, c_int)>;
pub type ReadByteVectorFn = Option<unsafe extern "C" fn(Refcon, *mut c_void, c_int, c_int) -> c_int>;
pub type WriteByteVectorFn = Option<unsafe extern "C" fn(Refcon, *mut c_void, c_int, c_int)>;
pub type DataChangedFn = Option<unsafe extern "C" fn(Refcon)>;

pub type FlightLoopFn = Option<unsafe extern "C" fn(f32, f32, c_int, Refcon) -> f32>;
pub type CommandFn = Option<unsafe extern "C" fn(Handle, c_int, Refcon) -> c_int>;
pub type MenuHandlerFn = Option<unsafe extern "C" fn(Refcon, Refcon)>;
pub type ObjectLoadedFn = Option<unsafe extern "C" fn(Handle, Refcon)>;
pub type NameEnumeratorFn = Option<unsafe extern "C" fn(*const c_char, Refcon)>;
pub type ErrorFn = Option<unsafe extern "C" fn(*const c_char)>;
pub type PlanesAvailableFn = Option<unsafe extern "C" fn(Refcon)>;
pub type CameraControlFn = Option<unsafe extern "C" fn(*mut CameraPosition, c_int, Refcon) -> c_int>;

crate::api_table! {
    /// `XPLM` library exports.
    pub struct XplmApi {
        // data access
        find_data_ref = "XPLMFindDataRef": fn(name: *const c_char) -> Handle;
        can_write_data_ref = "XPLMCanWriteDataRef": fn(data_ref: Handle) -> c_int;
        is_data_ref_good = "XPLMIsDataRefGood": fn(data_ref: Handle) -> c_int;
        get_data_ref_types = "XPLMGetDataRefTypes": fn(data_ref: Handle) -> c_int;
        get_datai = "XPLMGetDatai": fn(data_ref: Handle) -> c_int;
        set_datai = "XPLMSetDatai": fn(data_ref: Handle, value: c_int);
        get_dataf = "XPLMGetDataf": fn(data_ref: Handle) -> f32;
        set_dataf = "XPLMSetDataf": fn(data_ref: Handle, value: f32);
        get_datad = "XPLMGetDatad": fn(data_ref: Handle) -> f64;
        set_datad = "XPLMSetDatad": fn(data_ref: Handle, value: f64);
        get_datavi = "XPLMGetDatavi": fn(data_ref: Handle, values: *mut c_int, offset: c_int, max: c_int) -> c_int;
        set_datavi = "XPLMSetDatavi": fn(data_ref: Handle, values: *mut c_int, offset: c_int, count: c_int);
        get_datavf = "XPLMGetDatavf": fn(data_ref: Handle, values: *mut f32, offset: c_int, max: c_int) -> c_int;
        set_datavf = "XPLMSetDatavf": fn(data_ref: Handle, values: *mut f32, offset: c_int, count: c_int);
        get_datab = "XPLMGetDatab": fn(data_ref: Handle, values: *mut c_void, offset: c_int, max: c_int) -> c_int;
        set_datab = "XPLMSetDatab": fn(data_ref: Handle, values: *mut c_void, offset: c_int, count: c_int);
        register_data_accessor = "XPLMRegisterDataAccessor": fn(
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
        ) -> Handle;
        unregister_data_accessor = "XPLMUnregisterDataAccessor": fn(data_ref: Handle);
        share_data = "XPLMShareData": fn(name: *const c_char, types: c_int, notify: DataChangedFn, refcon: Refcon) -> c_int;
        unshare_data = "XPLMUnshareData": fn(name: *const c_char, types: c_int, notify: DataChangedFn, refcon: Refcon) -> c_int;

        // processing
        create_flight_loop = "XPLMCreateFlightLoop": fn(params: *mut CreateFlightLoop) -> Handle;
        destroy_flight_loop = "XPLMDestroyFlightLoop": fn(flight_loop: Handle);
        schedule_flight_loop = "XPLMScheduleFlightLoop": fn(flight_loop: Handle, interval: f32, relative_to_now: c_int);
        get_elapsed_time = "XPLMGetElapsedTime": fn() -> f32;
        get_cycle_number = "XPLMGetCycleNumber": fn() -> c_int;

        // utilities
        find_command = "XPLMFindCommand": fn(name: *const c_char) -> Handle;
        create_command = "XPLMCreateCommand": fn(name: *const c_char, description: *const c_char) -> Handle;
        command_begin = "XPLMCommandBegin": fn(command: Handle);
        command_end = "XPLMCommandEnd": fn(command: Handle);
        command_once = "XPLMCommandOnce": fn(command: Handle);
        register_command_handler = "XPLMRegisterCommandHandler": fn(command: Handle, handler: CommandFn, before: c_int, refcon: Refcon);
        unregister_command_handler = "XPLMUnregisterCommandHandler": fn(command: Handle, handler: CommandFn, before: c_int, refcon: Refcon);
        get_system_path = "XPLMGetSystemPath": fn(out_path: *mut c_char);
        get_prefs_path = "XPLMGetPrefsPath": fn(out_path: *mut c_char);
        get_directory_separator = "XPLMGetDirectorySeparator": fn() -> *const c_char;
        load_data_file = "XPLMLoadDataFile": fn(file_type: c_int, path: *const c_char) -> c_int;
        save_data_file = "XPLMSaveDataFile": fn(file_type: c_int, path: *const c_char) -> c_int;
        get_versions = "XPLMGetVersions": fn(xplane: *mut c_int, xplm: *mut c_int, host_id: *mut c_int);
        get_language = "XPLMGetLanguage": fn() -> c_int;
        find_symbol = "XPLMFindSymbol": fn(name: *const c_char) -> *mut c_void;
        set_error_callback = "XPLMSetErrorCallback": fn(callback: ErrorFn);
        debug_string = "XPLMDebugString": fn(text: *const c_char);
        speak_string = "XPLMSpeakString": fn(text: *const c_char);
        get_virtual_key_description = "XPLMGetVirtualKeyDescription": fn(key: c_char) -> *const c_char;
        reload_scenery = "XPLMReloadScenery": fn();

        // plugin registry
        get_my_id = "XPLMGetMyID": fn() -> c_int;
        count_plugins = "XPLMCountPlugins": fn() -> c_int;
        get_nth_plugin = "XPLMGetNthPlugin": fn(index: c_int) -> c_int;
        find_plugin_by_path = "XPLMFindPluginByPath": fn(path: *const c_char) -> c_int;
        find_plugin_by_signature = "XPLMFindPluginBySignature": fn(signature: *const c_char) -> c_int;
        get_plugin_info = "XPLMGetPluginInfo": fn(
            plugin: c_int,
            out_name: *mut c_char,
            out_file_path: *mut c_char,
            out_signature: *mut c_char,
            out_description: *mut c_char,
        );
        is_plugin_enabled = "XPLMIsPluginEnabled": fn(plugin: c_int) -> c_int;
        enable_plugin = "XPLMEnablePlugin": fn(plugin: c_int) -> c_int;
        disable_plugin = "XPLMDisablePlugin": fn(plugin: c_int);
        reload_plugins = "XPLMReloadPlugins": fn();
        send_message_to_plugin = "XPLMSendMessageToPlugin": fn(plugin: c_int, message: c_int, param: *mut c_void);
        has_feature = "XPLMHasFeature": fn(feature: *const c_char) -> c_int;
        is_feature_enabled = "XPLMIsFeatureEnabled": fn(feature: *const c_char) -> c_int;
        enable_feature = "XPLMEnableFeature": fn(feature: *const c_char, enable: c_int);
        enumerate_features = "XPLMEnumerateFeatures": fn(enumerator: NameEnumeratorFn, refcon: Refcon);

        // scenery
        create_probe = "XPLMCreateProbe": fn(probe_type: c_int) -> Handle;
        destroy_probe = "XPLMDestroyProbe": fn(probe: Handle);
        probe_terrain_xyz = "XPLMProbeTerrainXYZ": fn(probe: Handle, x: f32, y: f32, z: f32, info: *mut ProbeInfo) -> c_int;
        get_magnetic_variation = "XPLMGetMagneticVariation": fn(latitude: f64, longitude: f64) -> f32;
        deg_true_to_deg_magnetic = "XPLMDegTrueToDegMagnetic": fn(heading: f32) -> f32;
        deg_magnetic_to_deg_true = "XPLMDegMagneticToDegTrue": fn(heading: f32) -> f32;
        load_object = "XPLMLoadObject": fn(path: *const c_char) -> Handle;
        load_object_async = "XPLMLoadObjectAsync": fn(path: *const c_char, callback: ObjectLoadedFn, refcon: Refcon);
        unload_object = "XPLMUnloadObject": fn(object: Handle);
        lookup_objects = "XPLMLookupObjects": fn(
            path: *const c_char,
            latitude: f32,
            longitude: f32,
            enumerator: NameEnumeratorFn,
            refcon: Refcon,
        ) -> c_int;

        // instancing
        create_instance = "XPLMCreateInstance": fn(object: Handle, datarefs: *mut *const c_char) -> Handle;
        destroy_instance = "XPLMDestroyInstance": fn(instance: Handle);
        instance_set_position = "XPLMInstanceSetPosition": fn(instance: Handle, position: *const DrawInfo, data: *const f32);

        // planes
        set_users_aircraft = "XPLMSetUsersAircraft": fn(path: *const c_char);
        place_user_at_airport = "XPLMPlaceUserAtAirport": fn(code: *const c_char);
        place_user_at_location = "XPLMPlaceUserAtLocation": fn(
            latitude: f64,
            longitude: f64,
            elevation_msl: f32,
            heading_true: f32,
            speed: f32,
        );
        count_aircraft = "XPLMCountAircraft": fn(total: *mut c_int, active: *mut c_int, controller: *mut c_int);
        get_nth_aircraft_model = "XPLMGetNthAircraftModel": fn(index: c_int, out_file: *mut c_char, out_path: *mut c_char);
        acquire_planes = "XPLMAcquirePlanes": fn(aircraft: *mut *const c_char, callback: PlanesAvailableFn, refcon: Refcon) -> c_int;
        release_planes = "XPLMReleasePlanes": fn();
        set_aircraft_model = "XPLMSetAircraftModel": fn(index: c_int, path: *const c_char);
        disable_ai_for_plane = "XPLMDisableAIForPlane": fn(index: c_int);

        // camera
        control_camera = "XPLMControlCamera": fn(how_long: c_int, control: CameraControlFn, refcon: Refcon);
        dont_control_camera = "XPLMDontControlCamera": fn();
        is_camera_being_controlled = "XPLMIsCameraBeingControlled": fn(duration: *mut c_int) -> c_int;
        read_camera_position = "XPLMReadCameraPosition": fn(position: *mut CameraPosition);

        // menus
        find_plugins_menu = "XPLMFindPluginsMenu": fn() -> Handle;
        find_aircraft_menu = "XPLMFindAircraftMenu": fn() -> Handle;
        create_menu = "XPLMCreateMenu": fn(
            name: *const c_char,
            parent: Handle,
            parent_item: c_int,
            handler: MenuHandlerFn,
            menu_ref: Refcon,
        ) -> Handle;
        destroy_menu = "XPLMDestroyMenu": fn(menu: Handle);
        clear_all_menu_items = "XPLMClearAllMenuItems": fn(menu: Handle);
        append_menu_item = "XPLMAppendMenuItem": fn(menu: Handle, name: *const c_char, item_ref: Refcon, deprecated: c_int) -> c_int;
        append_menu_item_with_command = "XPLMAppendMenuItemWithCommand": fn(menu: Handle, name: *const c_char, command: Handle) -> c_int;
        append_menu_separator = "XPLMAppendMenuSeparator": fn(menu: Handle) -> c_int;
        set_menu_item_name = "XPLMSetMenuItemName": fn(menu: Handle, index: c_int, name: *const c_char, deprecated: c_int);
        check_menu_item = "XPLMCheckMenuItem": fn(menu: Handle, index: c_int, check: c_int);
        check_menu_item_state = "XPLMCheckMenuItemState": fn(menu: Handle, index: c_int, out_check: *mut c_int);
        enable_menu_item = "XPLMEnableMenuItem": fn(menu: Handle, index: c_int, enabled: c_int);
        remove_menu_item = "XPLMRemoveMenuItem": fn(menu: Handle, index: c_int);

        // graphics
        set_graphics_state = "XPLMSetGraphicsState": fn(
            fog: c_int,
            texture_units: c_int,
            lighting: c_int,
            alpha_testing: c_int,
            alpha_blending: c_int,
            depth_testing: c_int,
            depth_writing: c_int,
        );
        bind_texture_2d = "XPLMBindTexture2d": fn(texture: c_int, unit: c_int);
        generate_texture_numbers = "XPLMGenerateTextureNumbers": fn(out_ids: *mut c_int, count: c_int);
        world_to_local = "XPLMWorldToLocal": fn(lat: f64, lon: f64, alt: f64, x: *mut f64, y: *mut f64, z: *mut f64);
        local_to_world = "XPLMLocalToWorld": fn(x: f64, y: f64, z: f64, lat: *mut f64, lon: *mut f64, alt: *mut f64);
        draw_translucent_dark_box = "XPLMDrawTranslucentDarkBox": fn(left: c_int, top: c_int, right: c_int, bottom: c_int);
        draw_string = "XPLMDrawString": fn(
            color: *mut f32,
            x: c_int,
            y: c_int,
            text: *const c_char,
            word_wrap_width: *mut c_int,
            font: c_int,
        );
        draw_number = "XPLMDrawNumber": fn(
            color: *mut f32,
            x: c_int,
            y: c_int,
            value: f64,
            digits: c_int,
            decimals: c_int,
            show_sign: c_int,
            font: c_int,
        );
        get_font_dimensions = "XPLMGetFontDimensions": fn(font: c_int, char_width: *mut c_int, char_height: *mut c_int, digits_only: *mut c_int);
        measure_string = "XPLMMeasureString": fn(font: c_int, text: *const c_char, num_chars: c_int) -> f32;
    }
}
