use super::Handle;
use std::ffi::{c_char, c_int};

/// `XPWidgetFunc_t`: message, widget, param1, param2.
pub type WidgetFunc = Option<unsafe extern "C" fn(c_int, Handle, isize, isize) -> c_int>;

crate::api_table! {
    /// `XPWidgets` library exports (widgets, widget utilities, UI graphics).
    pub struct WidgetsApi {
        create_widget = "XPCreateWidget": fn(
            left: c_int,
            top: c_int,
            right: c_int,
            bottom: c_int,
            visible: c_int,
            descriptor: *const c_char,
            is_root: c_int,
            container: Handle,
            class: c_int,
        ) -> Handle;
        create_custom_widget = "XPCreateCustomWidget": fn(
            left: c_int,
            top: c_int,
            right: c_int,
            bottom: c_int,
            visible: c_int,
            descriptor: *const c_char,
            is_root: c_int,
            container: Handle,
            callback: WidgetFunc,
        ) -> Handle;
        destroy_widget = "XPDestroyWidget": fn(widget: Handle, destroy_children: c_int);
        send_message_to_widget = "XPSendMessageToWidget": fn(widget: Handle, message: c_int, mode: c_int, param1: isize, param2: isize) -> c_int;
        place_widget_within = "XPPlaceWidgetWithin": fn(sub_widget: Handle, container: Handle);
        count_child_widgets = "XPCountChildWidgets": fn(widget: Handle) -> c_int;
        get_nth_child_widget = "XPGetNthChildWidget": fn(widget: Handle, index: c_int) -> Handle;
        get_parent_widget = "XPGetParentWidget": fn(widget: Handle) -> Handle;
        show_widget = "XPShowWidget": fn(widget: Handle);
        hide_widget = "XPHideWidget": fn(widget: Handle);
        is_widget_visible = "XPIsWidgetVisible": fn(widget: Handle) -> c_int;
        find_root_widget = "XPFindRootWidget": fn(widget: Handle) -> Handle;
        bring_root_widget_to_front = "XPBringRootWidgetToFront": fn(widget: Handle);
        is_widget_in_front = "XPIsWidgetInFront": fn(widget: Handle) -> c_int;
        get_widget_geometry = "XPGetWidgetGeometry": fn(widget: Handle, left: *mut c_int, top: *mut c_int, right: *mut c_int, bottom: *mut c_int);
        set_widget_geometry = "XPSetWidgetGeometry": fn(widget: Handle, left: c_int, top: c_int, right: c_int, bottom: c_int);
        get_widget_for_location = "XPGetWidgetForLocation": fn(
            container: Handle,
            x: c_int,
            y: c_int,
            recursive: c_int,
            visible_only: c_int,
        ) -> Handle;
        get_widget_exposed_geometry = "XPGetWidgetExposedGeometry": fn(widget: Handle, left: *mut c_int, top: *mut c_int, right: *mut c_int, bottom: *mut c_int);
        set_widget_descriptor = "XPSetWidgetDescriptor": fn(widget: Handle, descriptor: *const c_char);
        get_widget_descriptor = "XPGetWidgetDescriptor": fn(widget: Handle, out_descriptor: *mut c_char, max_len: c_int) -> c_int;
        set_widget_property = "XPSetWidgetProperty": fn(widget: Handle, property: c_int, value: isize);
        get_widget_property = "XPGetWidgetProperty": fn(widget: Handle, property: c_int, exists: *mut c_int) -> isize;
        set_keyboard_focus = "XPSetKeyboardFocus": fn(widget: Handle) -> Handle;
        lose_keyboard_focus = "XPLoseKeyboardFocus": fn(widget: Handle);
        get_widget_with_focus = "XPGetWidgetWithFocus": fn() -> Handle;
        add_widget_callback = "XPAddWidgetCallback": fn(widget: Handle, callback: WidgetFunc);

        // widget utilities
        select_if_needed = "XPUSelectIfNeeded": fn(message: c_int, widget: Handle, param1: isize, param2: isize, eat_click: c_int) -> c_int;
        defocus_keyboard = "XPUDefocusKeyboard": fn(message: c_int, widget: Handle, param1: isize, param2: isize, eat_click: c_int) -> c_int;
        drag_widget = "XPUDragWidget": fn(
            message: c_int,
            widget: Handle,
            param1: isize,
            param2: isize,
            left: c_int,
            top: c_int,
            right: c_int,
            bottom: c_int,
        ) -> c_int;
        fixed_layout = "XPUFixedLayout": fn(message: c_int, widget: Handle, param1: isize, param2: isize) -> c_int;
        move_widget_by = "XPUMoveWidgetBy": fn(widget: Handle, dx: c_int, dy: c_int);

        // UI graphics
        draw_window = "XPDrawWindow": fn(x1: c_int, y1: c_int, x2: c_int, y2: c_int, style: c_int);
        get_window_default_dimensions = "XPGetWindowDefaultDimensions": fn(style: c_int, width: *mut c_int, height: *mut c_int);
        draw_element = "XPDrawElement": fn(x1: c_int, y1: c_int, x2: c_int, y2: c_int, style: c_int, lit: c_int);
        get_element_default_dimensions = "XPGetElementDefaultDimensions": fn(style: c_int, width: *mut c_int, height: *mut c_int, can_be_lit: *mut c_int);
        draw_track = "XPDrawTrack": fn(
            x1: c_int,
            y1: c_int,
            x2: c_int,
            y2: c_int,
            min: c_int,
            max: c_int,
            value: c_int,
            style: c_int,
            lit: c_int,
        );
        get_track_default_dimensions = "XPGetTrackDefaultDimensions": fn(style: c_int, width: *mut c_int, can_be_lit: *mut c_int);
        get_track_metrics = "XPGetTrackMetrics": fn(
            x1: c_int,
            y1: c_int,
            x2: c_int,
            y2: c_int,
            min: c_int,
            max: c_int,
            value: c_int,
            style: c_int,
            is_vertical: *mut c_int,
            down_button_size: *mut c_int,
            down_page_size: *mut c_int,
            thumb_size: *mut c_int,
            up_page_size: *mut c_int,
            up_button_size: *mut c_int,
        );
    }
}
