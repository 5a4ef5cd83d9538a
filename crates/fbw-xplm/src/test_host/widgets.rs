//! Fake `XPWidgets` exports: the widget tree, widget utilities and UI artwork.

use super::{handle, hit, key, with, FakeWidget, HostState};
use crate::api::{Handle, WidgetFunc, WidgetsApi};
use crate::graphics::Rect;
use crate::strings::from_ptr;
use crate::widgets::{MouseState, WidgetGeometryChange, WidgetMessage};
use std::collections::HashMap;
use std::ffi::{c_char, c_int};

pub(super) fn fake_widgets() -> WidgetsApi {
    WidgetsApi {
        create_widget,
        create_custom_widget,
        destroy_widget,
        send_message_to_widget,
        place_widget_within,
        count_child_widgets,
        get_nth_child_widget,
        get_parent_widget,
        show_widget,
        hide_widget,
        is_widget_visible,
        find_root_widget,
        bring_root_widget_to_front,
        is_widget_in_front,
        get_widget_geometry,
        set_widget_geometry,
        get_widget_for_location,
        get_widget_exposed_geometry,
        set_widget_descriptor,
        get_widget_descriptor,
        set_widget_property,
        get_widget_property,
        set_keyboard_focus,
        lose_keyboard_focus,
        get_widget_with_focus,
        add_widget_callback,

        select_if_needed,
        defocus_keyboard,
        drag_widget,
        fixed_layout,
        move_widget_by,

        draw_window,
        get_window_default_dimensions,
        draw_element,
        get_element_default_dimensions,
        draw_track,
        get_track_default_dimensions,
        get_track_metrics,
    }
}

unsafe fn put(dst: *mut c_int, value: c_int) {
    if let Some(dst) = unsafe { dst.as_mut() } {
        *dst = value;
    }
}

unsafe fn put_rect(r: Rect, left: *mut c_int, top: *mut c_int, right: *mut c_int, bottom: *mut c_int) {
    unsafe {
        put(left, r.left);
        put(top, r.top);
        put(right, r.right);
        put(bottom, r.bottom);
    }
}

const NULL: Handle = std::ptr::null_mut();

fn opt(h: Option<usize>) -> Handle {
    h.map_or(NULL, handle)
}

impl HostState {
    fn parent_of(&self, w: usize) -> Option<usize> {
        self.widgets.get(&w)?.parent
    }

    /// Topmost ancestor (or `w` itself) if it is a root widget.
    fn root_of(&self, mut w: usize) -> Option<usize> {
        while let Some(parent) = self.parent_of(w) {
            w = parent;
        }
        self.widgets.get(&w).filter(|fw| fw.is_root).map(|_| w)
    }

    fn detach(&mut self, w: usize) {
        let Some(parent) = self.widgets.get_mut(&w).and_then(|fw| fw.parent.take()) else {
            return;
        };
        if let Some(p) = self.widgets.get_mut(&parent) {
            p.children.retain(|&c| c != w);
        }
    }

    fn attach(&mut self, w: usize, container: usize) {
        if !self.widgets.contains_key(&container) {
            return;
        }
        if let Some(fw) = self.widgets.get_mut(&w) {
            fw.parent = Some(container);
        }
        if let Some(p) = self.widgets.get_mut(&container) {
            p.children.push(w);
        }
    }

    fn visible(&self, mut w: usize) -> bool {
        loop {
            match self.widgets.get(&w) {
                Some(fw) if fw.visible => match fw.parent {
                    Some(parent) => w = parent,
                    None => return true,
                },
                _ => return false,
            }
        }
    }

    fn in_front(&self, w: usize) -> bool {
        self.root_of(w).is_some_and(|root| self.z_order.last() == Some(&root))
    }

    fn bring_to_front(&mut self, w: usize) {
        if let Some(root) = self.root_of(w) {
            self.z_order.retain(|&r| r != root);
            self.z_order.push(root);
        }
    }

    fn move_tree(&mut self, w: usize, dx: c_int, dy: c_int) {
        let Some(fw) = self.widgets.get_mut(&w) else {
            return;
        };
        fw.rect = fw.rect.offset(dx, dy);
        for child in fw.children.clone() {
            self.move_tree(child, dx, dy);
        }
    }

    fn hit_test(&self, w: usize, x: c_int, y: c_int, visible_only: bool) -> bool {
        self.widgets
            .get(&w)
            .is_some_and(|fw| fw.rect.contains(x, y) && (!visible_only || fw.visible))
    }

    fn locate(&self, w: usize, x: c_int, y: c_int, recursive: bool, visible_only: bool) -> Option<usize> {
        if !self.hit_test(w, x, y, visible_only) {
            return None;
        }
        let children = &self.widgets.get(&w)?.children;
        match children.iter().rev().find(|&&c| self.hit_test(c, x, y, visible_only)) {
            Some(&child) if recursive => self.locate(child, x, y, true, visible_only),
            Some(&child) => Some(child),
            None => Some(w),
        }
    }

    fn create(&mut self, rect: Rect, visible: bool, descriptor: String, is_root: bool, container: Handle) -> usize {
        let id = self.alloc();
        self.widgets.insert(
            id,
            FakeWidget {
                rect,
                visible,
                descriptor,
                is_root,
                parent: None,
                children: Vec::new(),
                callbacks: Vec::new(),
                props: HashMap::new(),
            },
        );
        if !container.is_null() {
            self.attach(id, key(container));
        }
        if is_root {
            self.z_order.push(id);
        }
        id
    }

    fn remove_widget(&mut self, w: usize) {
        self.detach(w);
        let Some(fw) = self.widgets.remove(&w) else {
            return;
        };
        for child in fw.children {
            if let Some(c) = self.widgets.get_mut(&child) {
                c.parent = None;
            }
        }
        self.z_order.retain(|&r| r != w);
        if self.focus == Some(w) {
            self.focus = None;
        }
        if self.dragging.is_some_and(|(d, _, _)| d == w) {
            self.dragging = None;
        }
    }
}

/// Calls the widget's callbacks, newest first, until one handles the message.
fn direct(w: usize, message: c_int, param1: isize, param2: isize, all: bool) -> c_int {
    let Some(callbacks) = with(|s| s.widgets.get(&w).map(|fw| fw.callbacks.clone())) else {
        return 0;
    };
    let mut handled = 0;
    for callback in callbacks.into_iter().rev().flatten() {
        if unsafe { callback(message, handle(w), param1, param2) } != 0 {
            handled = 1;
            if !all {
                break;
            }
        }
    }
    handled
}

/// Delivers a message according to its dispatch mode.
pub(super) fn send(w: usize, message: c_int, mode: c_int, param1: isize, param2: isize) -> c_int {
    match mode {
        1 => {
            let mut current = Some(w);
            while let Some(target) = current {
                if direct(target, message, param1, param2, false) != 0 {
                    return 1;
                }
                current = with(|s| s.parent_of(target));
            }
            0
        }
        2 => {
            let mut handled = direct(w, message, param1, param2, false);
            let children = with(|s| s.widgets.get(&w).map(|fw| fw.children.clone()).unwrap_or_default());
            for child in children {
                handled |= send(child, message, 2, param1, param2);
            }
            handled
        }
        3 => direct(w, message, param1, param2, true),
        _ => direct(w, message, param1, param2, false),
    }
}

/// Destroys `w`, its children first when `with_children` is set. `as_child` is reported to
/// the widget as the recursive flag of its Destroy message.
pub(super) fn destroy_tree(w: usize, with_children: bool, as_child: bool) {
    if with_children {
        let children = with(|s| s.widgets.get(&w).map(|fw| fw.children.clone()).unwrap_or_default());
        for child in children {
            destroy_tree(child, true, true);
        }
    }
    direct(w, WidgetMessage::DESTROY.0, as_child as isize, 0, true);
    with(|s| s.remove_widget(w));
}

unsafe fn descriptor_text(ptr: *const c_char) -> String {
    unsafe { from_ptr(ptr) }.unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn create_widget(
    left: c_int,
    top: c_int,
    right: c_int,
    bottom: c_int,
    visible: c_int,
    descriptor: *const c_char,
    is_root: c_int,
    container: Handle,
    _class: c_int,
) -> Handle {
    hit("XPCreateWidget");
    let descriptor = unsafe { descriptor_text(descriptor) };
    with(|s| {
        if s.refuse {
            return NULL;
        }
        let rect = Rect::new(left, top, right, bottom);
        handle(s.create(rect, visible != 0, descriptor, is_root != 0, container))
    })
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn create_custom_widget(
    left: c_int,
    top: c_int,
    right: c_int,
    bottom: c_int,
    visible: c_int,
    descriptor: *const c_char,
    is_root: c_int,
    container: Handle,
    callback: WidgetFunc,
) -> Handle {
    hit("XPCreateCustomWidget");
    let descriptor = unsafe { descriptor_text(descriptor) };
    let created = with(|s| {
        if s.refuse {
            return None;
        }
        let rect = Rect::new(left, top, right, bottom);
        let id = s.create(rect, visible != 0, descriptor, is_root != 0, container);
        if let Some(fw) = s.widgets.get_mut(&id) {
            fw.callbacks.push(callback);
        }
        Some(id)
    });
    let Some(id) = created else {
        return NULL;
    };
    direct(id, WidgetMessage::CREATE.0, 0, 0, false);
    handle(id)
}

unsafe extern "C" fn destroy_widget(widget: Handle, destroy_children: c_int) {
    hit("XPDestroyWidget");
    destroy_tree(key(widget), destroy_children != 0, false);
}

unsafe extern "C" fn send_message_to_widget(
    widget: Handle,
    message: c_int,
    mode: c_int,
    param1: isize,
    param2: isize,
) -> c_int {
    hit("XPSendMessageToWidget");
    send(key(widget), message, mode, param1, param2)
}

unsafe extern "C" fn place_widget_within(sub_widget: Handle, container: Handle) {
    hit("XPPlaceWidgetWithin");
    with(|s| {
        s.detach(key(sub_widget));
        if !container.is_null() {
            s.attach(key(sub_widget), key(container));
        }
    });
}

unsafe extern "C" fn count_child_widgets(widget: Handle) -> c_int {
    hit("XPCountChildWidgets");
    with(|s| s.widgets.get(&key(widget)).map_or(0, |fw| fw.children.len() as c_int))
}

unsafe extern "C" fn get_nth_child_widget(widget: Handle, index: c_int) -> Handle {
    hit("XPGetNthChildWidget");
    with(|s| {
        let children = &s.widgets.get(&key(widget))?.children;
        usize::try_from(index).ok().and_then(|i| children.get(i)).copied()
    })
    .map_or(NULL, handle)
}

unsafe extern "C" fn get_parent_widget(widget: Handle) -> Handle {
    hit("XPGetParentWidget");
    opt(with(|s| s.parent_of(key(widget))))
}

fn set_visible(widget: Handle, visible: bool) {
    with(|s| {
        if let Some(fw) = s.widgets.get_mut(&key(widget)) {
            fw.visible = visible;
        }
    });
}

unsafe extern "C" fn show_widget(widget: Handle) {
    hit("XPShowWidget");
    set_visible(widget, true);
}

unsafe extern "C" fn hide_widget(widget: Handle) {
    hit("XPHideWidget");
    set_visible(widget, false);
}

unsafe extern "C" fn is_widget_visible(widget: Handle) -> c_int {
    hit("XPIsWidgetVisible");
    with(|s| s.visible(key(widget)) as c_int)
}

unsafe extern "C" fn find_root_widget(widget: Handle) -> Handle {
    hit("XPFindRootWidget");
    opt(with(|s| s.root_of(key(widget))))
}

unsafe extern "C" fn bring_root_widget_to_front(widget: Handle) {
    hit("XPBringRootWidgetToFront");
    with(|s| s.bring_to_front(key(widget)));
}

unsafe extern "C" fn is_widget_in_front(widget: Handle) -> c_int {
    hit("XPIsWidgetInFront");
    with(|s| s.in_front(key(widget)) as c_int)
}

unsafe extern "C" fn get_widget_geometry(
    widget: Handle,
    left: *mut c_int,
    top: *mut c_int,
    right: *mut c_int,
    bottom: *mut c_int,
) {
    hit("XPGetWidgetGeometry");
    let Some(rect) = with(|s| s.widgets.get(&key(widget)).map(|fw| fw.rect)) else {
        return;
    };
    unsafe { put_rect(rect, left, top, right, bottom) };
}

/// Moves only the widget itself; its callbacks get a Reshape message.
unsafe extern "C" fn set_widget_geometry(widget: Handle, left: c_int, top: c_int, right: c_int, bottom: c_int) {
    hit("XPSetWidgetGeometry");
    let w = key(widget);
    let rect = Rect::new(left, top, right, bottom);
    let Some(old) = with(|s| {
        let fw = s.widgets.get_mut(&w)?;
        Some(std::mem::replace(&mut fw.rect, rect))
    }) else {
        return;
    };
    let change = WidgetGeometryChange {
        dx: rect.left - old.left,
        dy: rect.bottom - old.bottom,
        dwidth: rect.width() - old.width(),
        dheight: rect.height() - old.height(),
    };
    direct(
        w,
        WidgetMessage::RESHAPE.0,
        widget as isize,
        &change as *const WidgetGeometryChange as isize,
        false,
    );
}

unsafe extern "C" fn get_widget_for_location(
    container: Handle,
    x: c_int,
    y: c_int,
    recursive: c_int,
    visible_only: c_int,
) -> Handle {
    hit("XPGetWidgetForLocation");
    opt(with(|s| s.locate(key(container), x, y, recursive != 0, visible_only != 0)))
}

unsafe extern "C" fn get_widget_exposed_geometry(
    widget: Handle,
    left: *mut c_int,
    top: *mut c_int,
    right: *mut c_int,
    bottom: *mut c_int,
) {
    hit("XPGetWidgetExposedGeometry");
    let exposed = with(|s| {
        let mut r = s.widgets.get(&key(widget))?.rect;
        let mut current = s.parent_of(key(widget));
        while let Some(p) = current {
            let pr = s.widgets.get(&p)?.rect;
            r = Rect::new(
                r.left.max(pr.left),
                r.top.min(pr.top),
                r.right.min(pr.right),
                r.bottom.max(pr.bottom),
            );
            current = s.parent_of(p);
        }
        Some(r)
    });
    if let Some(r) = exposed {
        unsafe { put_rect(r, left, top, right, bottom) };
    }
}

unsafe extern "C" fn set_widget_descriptor(widget: Handle, descriptor: *const c_char) {
    hit("XPSetWidgetDescriptor");
    let descriptor = unsafe { descriptor_text(descriptor) };
    with(|s| {
        if let Some(fw) = s.widgets.get_mut(&key(widget)) {
            fw.descriptor = descriptor;
        }
    });
}

/// Copies at most `max_len` bytes without a terminator; returns the full length.
unsafe extern "C" fn get_widget_descriptor(widget: Handle, out_descriptor: *mut c_char, max_len: c_int) -> c_int {
    hit("XPGetWidgetDescriptor");
    let Some(descriptor) = with(|s| s.widgets.get(&key(widget)).map(|fw| fw.descriptor.clone())) else {
        return 0;
    };
    if !out_descriptor.is_null() && max_len > 0 {
        let n = descriptor.len().min(max_len as usize);
        unsafe { std::ptr::copy_nonoverlapping(descriptor.as_ptr(), out_descriptor.cast::<u8>(), n) };
    }
    descriptor.len() as c_int
}

unsafe extern "C" fn set_widget_property(widget: Handle, property: c_int, value: isize) {
    hit("XPSetWidgetProperty");
    with(|s| {
        if let Some(fw) = s.widgets.get_mut(&key(widget)) {
            fw.props.insert(property, value);
        }
    });
}

unsafe extern "C" fn get_widget_property(widget: Handle, property: c_int, exists: *mut c_int) -> isize {
    hit("XPGetWidgetProperty");
    let value = with(|s| s.widgets.get(&key(widget))?.props.get(&property).copied());
    unsafe { put(exists, value.is_some() as c_int) };
    value.unwrap_or(0)
}

unsafe extern "C" fn set_keyboard_focus(widget: Handle) -> Handle {
    hit("XPSetKeyboardFocus");
    let w = key(widget);
    opt(with(|s| {
        s.focus = s.widgets.contains_key(&w).then_some(w);
        s.focus
    }))
}

unsafe extern "C" fn lose_keyboard_focus(widget: Handle) {
    hit("XPLoseKeyboardFocus");
    with(|s| {
        if s.focus == Some(key(widget)) {
            s.focus = None;
        }
    });
}

unsafe extern "C" fn get_widget_with_focus() -> Handle {
    hit("XPGetWidgetWithFocus");
    opt(with(|s| s.focus))
}

unsafe extern "C" fn add_widget_callback(widget: Handle, callback: WidgetFunc) {
    hit("XPAddWidgetCallback");
    with(|s| {
        if let Some(fw) = s.widgets.get_mut(&key(widget)) {
            fw.callbacks.push(callback);
        }
    });
}

// widget utilities

unsafe fn mouse(param1: isize) -> Option<MouseState> {
    unsafe { (param1 as *const MouseState).as_ref() }.copied()
}

unsafe extern "C" fn select_if_needed(message: c_int, widget: Handle, _p1: isize, _p2: isize, eat_click: c_int) -> c_int {
    hit("XPUSelectIfNeeded");
    if message != WidgetMessage::MOUSE_DOWN.0 {
        return 0;
    }
    with(|s| {
        if s.in_front(key(widget)) {
            return 0;
        }
        s.bring_to_front(key(widget));
        eat_click
    })
}

unsafe extern "C" fn defocus_keyboard(message: c_int, _widget: Handle, _p1: isize, _p2: isize, eat_click: c_int) -> c_int {
    hit("XPUDefocusKeyboard");
    if message != WidgetMessage::MOUSE_DOWN.0 {
        return 0;
    }
    with(|s| s.focus = None);
    eat_click
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn drag_widget(
    message: c_int,
    widget: Handle,
    param1: isize,
    _param2: isize,
    left: c_int,
    top: c_int,
    right: c_int,
    bottom: c_int,
) -> c_int {
    hit("XPUDragWidget");
    let Some(m) = (unsafe { mouse(param1) }) else {
        return 0;
    };
    let w = key(widget);
    with(|s| match WidgetMessage(message) {
        WidgetMessage::MOUSE_DOWN if Rect::new(left, top, right, bottom).contains(m.x, m.y) => {
            s.dragging = Some((w, m.x, m.y));
            1
        }
        WidgetMessage::MOUSE_DRAG => match s.dragging {
            Some((d, x, y)) if d == w => {
                s.move_tree(w, m.x - x, m.y - y);
                s.dragging = Some((w, m.x, m.y));
                1
            }
            _ => 0,
        },
        WidgetMessage::MOUSE_UP if s.dragging.is_some_and(|(d, _, _)| d == w) => {
            s.dragging = None;
            1
        }
        _ => 0,
    })
}

/// Children follow the widget's top-left corner on reshape.
unsafe extern "C" fn fixed_layout(message: c_int, widget: Handle, _param1: isize, param2: isize) -> c_int {
    hit("XPUFixedLayout");
    if message != WidgetMessage::RESHAPE.0 {
        return 0;
    }
    let Some(change) = (unsafe { (param2 as *const WidgetGeometryChange).as_ref() }).copied() else {
        return 0;
    };
    let dy = change.dy + change.dheight;
    with(|s| {
        let children = s.widgets.get(&key(widget)).map(|fw| fw.children.clone()).unwrap_or_default();
        for child in children {
            s.move_tree(child, change.dx, dy);
        }
    });
    1
}

unsafe extern "C" fn move_widget_by(widget: Handle, dx: c_int, dy: c_int) {
    hit("XPUMoveWidgetBy");
    with(|s| s.move_tree(key(widget), dx, dy));
}

// UI graphics

unsafe extern "C" fn draw_window(x1: c_int, y1: c_int, x2: c_int, y2: c_int, style: c_int) {
    hit("XPDrawWindow");
    with(|s| s.drawn.push(format!("window {x1},{y1},{x2},{y2} style={style}")));
}

unsafe extern "C" fn get_window_default_dimensions(_style: c_int, width: *mut c_int, height: *mut c_int) {
    hit("XPGetWindowDefaultDimensions");
    unsafe {
        put(width, 200);
        put(height, 100);
    }
}

unsafe extern "C" fn draw_element(x1: c_int, y1: c_int, x2: c_int, y2: c_int, style: c_int, lit: c_int) {
    hit("XPDrawElement");
    with(|s| s.drawn.push(format!("element {x1},{y1},{x2},{y2} style={style} lit={lit}")));
}

unsafe extern "C" fn get_element_default_dimensions(
    style: c_int,
    width: *mut c_int,
    height: *mut c_int,
    can_be_lit: *mut c_int,
) {
    hit("XPGetElementDefaultDimensions");
    // check box, close box and push button artwork have lit variants
    let lit = matches!(style, 9 | 14 | 16);
    unsafe {
        put(width, 16);
        put(height, 16);
        put(can_be_lit, lit as c_int);
    }
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn draw_track(
    x1: c_int,
    y1: c_int,
    x2: c_int,
    y2: c_int,
    min: c_int,
    max: c_int,
    value: c_int,
    style: c_int,
    lit: c_int,
) {
    hit("XPDrawTrack");
    with(|s| {
        s.drawn
            .push(format!("track {x1},{y1},{x2},{y2} {min}..{max}={value} style={style} lit={lit}"))
    });
}

unsafe extern "C" fn get_track_default_dimensions(_style: c_int, width: *mut c_int, can_be_lit: *mut c_int) {
    hit("XPGetTrackDefaultDimensions");
    unsafe {
        put(width, 16);
        put(can_be_lit, 0);
    }
}

const TRACK_BUTTON: c_int = 16;
const TRACK_THUMB: c_int = 16;

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn get_track_metrics(
    x1: c_int,
    y1: c_int,
    x2: c_int,
    y2: c_int,
    min: c_int,
    max: c_int,
    value: c_int,
    _style: c_int,
    is_vertical: *mut c_int,
    down_button_size: *mut c_int,
    down_page_size: *mut c_int,
    thumb_size: *mut c_int,
    up_page_size: *mut c_int,
    up_button_size: *mut c_int,
) {
    hit("XPGetTrackMetrics");
    let rect = Rect::new(x1, y1, x2, y2);
    let vertical = rect.height() > rect.width();
    let length = if vertical { rect.height() } else { rect.width() };
    let pages = (length - 2 * TRACK_BUTTON - TRACK_THUMB).max(0);
    let down_page = if max > min {
        (pages as i64 * (value.clamp(min, max) - min) as i64 / (max - min) as i64) as c_int
    } else {
        0
    };
    unsafe {
        put(is_vertical, vertical as c_int);
        put(down_button_size, TRACK_BUTTON);
        put(down_page_size, down_page);
        put(thumb_size, TRACK_THUMB);
        put(up_page_size, pages - down_page);
        put(up_button_size, TRACK_BUTTON);
    }
}
