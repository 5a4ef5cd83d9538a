//! Widgets: the host's retained-mode UI toolkit.
//!
//! Every widget this plugin creates is entered in a registry keyed by its host handle. The
//! single widget trampoline resolves the target through the registry, applies the built-in
//! behaviours enabled on it and then hands the decoded message to the widget's handler.
//! Handles the registry does not know about are answered with "not handled".

mod standard;
mod types;

pub use standard::*;
pub use types::*;

pub use crate::graphics::Rect;

use crate::api::{widgets, Handle};
use crate::callback::guard;
use crate::error::{XplmError, XplmResult};
use crate::handle::{HandleRegistry, WidgetId};
use crate::strings::{from_nul_padded, to_cstring};
use std::cell::{Cell, RefCell};
use std::ffi::c_int;
use std::ops::Deref;
use std::rc::Rc;

/// Handler for decoded widget messages. Returns `true` when the message was consumed.
pub type WidgetHandler = Box<dyn FnMut(WidgetRef, &mut WidgetEvent) -> bool>;

/// Stock behaviours provided by the widget utility library, applied before the handler runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Behaviours {
    /// Bring the window to front on click; the value says whether the click is consumed.
    pub select_if_needed: Option<bool>,
    /// Drop keyboard focus on click; the value says whether the click is consumed.
    pub defocus_keyboard: Option<bool>,
    /// Region, in global coordinates, that drags the widget.
    pub drag_region: Option<Rect>,
    /// Keep children at a fixed offset when the widget is reshaped.
    pub fixed_layout: bool,
}

struct WidgetCore {
    handler: RefCell<Option<WidgetHandler>>,
    behaviours: Cell<Behaviours>,
    alive: Cell<bool>,
}

impl WidgetCore {
    fn new(handler: Option<WidgetHandler>) -> Rc<Self> {
        Rc::new(Self {
            handler: RefCell::new(handler),
            behaviours: Cell::new(Behaviours::default()),
            alive: Cell::new(true),
        })
    }

    /// A handler already running for this widget (a nested message) is not re-entered.
    fn call(&self, w: WidgetRef, event: &mut WidgetEvent) -> bool {
        let Ok(mut handler) = self.handler.try_borrow_mut() else {
            return false;
        };
        handler.as_mut().is_some_and(|f| f(w, event))
    }
}

thread_local! {
    static WIDGETS: RefCell<HandleRegistry<WidgetId, Rc<WidgetCore>>> = RefCell::new(HandleRegistry::new());
    // Custom widgets get their Create message before the host returns their handle.
    static CREATING: RefCell<Option<Rc<WidgetCore>>> = const { RefCell::new(None) };
}

pub(crate) fn live_widgets() -> usize {
    WIDGETS.with(|r| r.borrow().len())
}

fn lookup(id: WidgetId) -> Option<Rc<WidgetCore>> {
    if let Some(core) = WIDGETS.with(|r| r.borrow().get(id).cloned()) {
        return Some(core);
    }
    let core = CREATING.with(|c| c.borrow_mut().take())?;
    WIDGETS.with(|r| r.borrow_mut().insert(id, core.clone()));
    Some(core)
}

fn forget(id: WidgetId, core: &Rc<WidgetCore>) {
    core.alive.set(false);
    WIDGETS.with(|r| {
        let mut r = r.borrow_mut();
        if r.get(id).is_some_and(|c| Rc::ptr_eq(c, core)) {
            r.remove(id);
        }
    });
}

unsafe extern "C" fn widget_trampoline(message: c_int, widget: Handle, param1: isize, param2: isize) -> c_int {
    guard("widget callback", 0, || {
        let Some(id) = WidgetId::from_raw(widget) else {
            return 0;
        };
        let Some(core) = lookup(id) else {
            return 0;
        };
        let message = WidgetMessage(message);
        let handled = dispatch(&core, WidgetRef(id), message, param1, param2);
        if message == WidgetMessage::DESTROY {
            log::trace!(target: "fbw_xplm", "host destroyed {id:?}");
            forget(id, &core);
        }
        handled as c_int
    })
}

fn dispatch(core: &WidgetCore, w: WidgetRef, message: WidgetMessage, param1: isize, param2: isize) -> bool {
    let b = core.behaviours.get();
    let api = widgets();
    let raw = w.0.as_raw();
    let drag = || {
        b.drag_region.is_some_and(|r| unsafe {
            (api.drag_widget)(message.0, raw, param1, param2, r.left, r.top, r.right, r.bottom) != 0
        })
    };
    match message {
        WidgetMessage::MOUSE_DOWN => {
            if let Some(eat) = b.select_if_needed {
                if unsafe { (api.select_if_needed)(message.0, raw, param1, param2, eat as c_int) } != 0 {
                    return true;
                }
            }
            if let Some(eat) = b.defocus_keyboard {
                if unsafe { (api.defocus_keyboard)(message.0, raw, param1, param2, eat as c_int) } != 0 {
                    return true;
                }
            }
            if drag() {
                return true;
            }
        }
        WidgetMessage::MOUSE_DRAG | WidgetMessage::MOUSE_UP => {
            if drag() {
                return true;
            }
        }
        WidgetMessage::RESHAPE if b.fixed_layout => {
            return unsafe { (api.fixed_layout)(message.0, raw, param1, param2) } != 0;
        }
        _ => {}
    }
    let mut event = unsafe { WidgetEvent::decode(message, param1, param2) };
    let handled = core.call(w, &mut event);
    unsafe { event.write_back(param1, param2) };
    handled
}

/// Non-owning reference to any widget, including ones other plugins or the host created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetRef(WidgetId);

fn widget_ref(raw: Handle) -> Option<WidgetRef> {
    WidgetId::from_raw(raw).map(WidgetRef)
}

fn raw_of(w: Option<WidgetRef>) -> Handle {
    w.map_or(std::ptr::null_mut(), |w| w.0.as_raw())
}

/// The widget that has keyboard focus, if it is a widget at all.
pub fn with_focus() -> Option<WidgetRef> {
    widget_ref(unsafe { (widgets().get_widget_with_focus)() })
}

impl WidgetRef {
    #[inline]
    pub fn from_id(id: WidgetId) -> Self {
        Self(id)
    }

    #[inline]
    pub fn id(self) -> WidgetId {
        self.0
    }

    #[inline]
    fn raw(self) -> Handle {
        self.0.as_raw()
    }

    /// Whether this plugin created the widget and it has not been destroyed.
    pub fn is_managed(self) -> bool {
        WIDGETS.with(|r| r.borrow().contains(self.0))
    }

    pub fn send_message(self, message: WidgetMessage, mode: DispatchMode, param1: isize, param2: isize) -> bool {
        unsafe { (widgets().send_message_to_widget)(self.raw(), message.0, mode as c_int, param1, param2) != 0 }
    }

    /// Moves the widget into `container`, or out of any container with `None`.
    pub fn place_within(self, container: Option<WidgetRef>) {
        unsafe { (widgets().place_widget_within)(self.raw(), raw_of(container)) };
    }

    pub fn child_count(self) -> usize {
        let n = unsafe { (widgets().count_child_widgets)(self.raw()) };
        n.max(0) as usize
    }

    pub fn nth_child(self, index: usize) -> Option<WidgetRef> {
        widget_ref(unsafe { (widgets().get_nth_child_widget)(self.raw(), index as c_int) })
    }

    pub fn children(self) -> Vec<WidgetRef> {
        (0..self.child_count()).filter_map(|i| self.nth_child(i)).collect()
    }

    pub fn parent(self) -> Option<WidgetRef> {
        widget_ref(unsafe { (widgets().get_parent_widget)(self.raw()) })
    }

    #[inline]
    pub fn show(self) {
        unsafe { (widgets().show_widget)(self.raw()) };
    }

    #[inline]
    pub fn hide(self) {
        unsafe { (widgets().hide_widget)(self.raw()) };
    }

    /// Visible and all its parents visible.
    #[inline]
    pub fn is_visible(self) -> bool {
        unsafe { (widgets().is_widget_visible)(self.raw()) != 0 }
    }

    pub fn root(self) -> Option<WidgetRef> {
        widget_ref(unsafe { (widgets().find_root_widget)(self.raw()) })
    }

    #[inline]
    pub fn bring_root_to_front(self) {
        unsafe { (widgets().bring_root_widget_to_front)(self.raw()) };
    }

    #[inline]
    pub fn is_in_front(self) -> bool {
        unsafe { (widgets().is_widget_in_front)(self.raw()) != 0 }
    }

    pub fn geometry(self) -> Rect {
        let mut r = Rect::default();
        unsafe { (widgets().get_widget_geometry)(self.raw(), &mut r.left, &mut r.top, &mut r.right, &mut r.bottom) };
        r
    }

    #[inline]
    pub fn set_geometry(self, r: Rect) {
        unsafe { (widgets().set_widget_geometry)(self.raw(), r.left, r.top, r.right, r.bottom) };
    }

    /// Deepest child (or self) under the global point `(x, y)`.
    pub fn widget_for_location(self, x: i32, y: i32, recursive: bool, visible_only: bool) -> Option<WidgetRef> {
        widget_ref(unsafe {
            (widgets().get_widget_for_location)(self.raw(), x, y, recursive as c_int, visible_only as c_int)
        })
    }

    /// Part of the widget not clipped by its parents.
    pub fn exposed_geometry(self) -> Rect {
        let mut r = Rect::default();
        unsafe {
            (widgets().get_widget_exposed_geometry)(self.raw(), &mut r.left, &mut r.top, &mut r.right, &mut r.bottom)
        };
        r
    }

    pub fn descriptor(self) -> String {
        let api = widgets();
        let len = unsafe { (api.get_widget_descriptor)(self.raw(), std::ptr::null_mut(), 0) };
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u8; len as usize + 1];
        unsafe { (api.get_widget_descriptor)(self.raw(), buf.as_mut_ptr().cast(), len) };
        from_nul_padded(&buf)
    }

    pub fn set_descriptor(self, descriptor: &str) -> XplmResult<()> {
        let descriptor = to_cstring(descriptor)?;
        unsafe { (widgets().set_widget_descriptor)(self.raw(), descriptor.as_ptr()) };
        Ok(())
    }

    /// `None` if the property was never set on this widget.
    pub fn property(self, property: i32) -> Option<isize> {
        let mut exists = 0;
        let value = unsafe { (widgets().get_widget_property)(self.raw(), property, &mut exists) };
        (exists != 0).then_some(value)
    }

    #[inline]
    pub fn set_property(self, property: i32, value: isize) {
        unsafe { (widgets().set_widget_property)(self.raw(), property, value) };
    }

    #[inline]
    pub(crate) fn int_property(self, property: i32) -> i32 {
        self.property(property).unwrap_or(0) as i32
    }

    #[inline]
    pub(crate) fn flag(self, property: i32) -> bool {
        self.property(property).is_some_and(|v| v != 0)
    }

    #[inline]
    pub(crate) fn set_flag(self, property: i32, on: bool) {
        self.set_property(property, on as isize);
    }

    #[inline]
    pub fn hilited(self) -> bool {
        self.flag(props::HILITED)
    }

    #[inline]
    pub fn set_hilited(self, on: bool) {
        self.set_flag(props::HILITED, on);
    }

    #[inline]
    pub fn clip(self) -> bool {
        self.flag(props::CLIP)
    }

    #[inline]
    pub fn set_clip(self, on: bool) {
        self.set_flag(props::CLIP, on);
    }

    #[inline]
    pub fn enabled(self) -> bool {
        self.flag(props::ENABLED)
    }

    #[inline]
    pub fn set_enabled(self, on: bool) {
        self.set_flag(props::ENABLED, on);
    }

    /// Returns the widget that actually took focus (a parent may refuse on the child's behalf).
    pub fn set_keyboard_focus(self) -> Option<WidgetRef> {
        widget_ref(unsafe { (widgets().set_keyboard_focus)(self.raw()) })
    }

    #[inline]
    pub fn lose_keyboard_focus(self) {
        unsafe { (widgets().lose_keyboard_focus)(self.raw()) };
    }

    /// Moves the widget and all its children.
    #[inline]
    pub fn move_by(self, dx: i32, dy: i32) {
        unsafe { (widgets().move_widget_by)(self.raw(), dx, dy) };
    }
}

/// A widget created by this plugin. Destroyed on [`destroy`](Self::destroy) or drop unless
/// the host already destroyed it.
pub struct Widget {
    w: WidgetRef,
    core: Rc<WidgetCore>,
    released: bool,
}

impl Deref for Widget {
    type Target = WidgetRef;

    #[inline]
    fn deref(&self) -> &WidgetRef {
        &self.w
    }
}

impl Widget {
    /// A widget whose behaviour is entirely defined by `handler`.
    ///
    /// Without `container` the widget is a root (a window).
    pub fn custom(
        rect: Rect,
        visible: bool,
        descriptor: &str,
        container: Option<WidgetRef>,
        handler: impl FnMut(WidgetRef, &mut WidgetEvent) -> bool + 'static,
    ) -> XplmResult<Self> {
        let descriptor = to_cstring(descriptor)?;
        let core = WidgetCore::new(Some(Box::new(handler)));
        let prev = CREATING.with(|c| c.replace(Some(core.clone())));
        let raw = unsafe {
            (widgets().create_custom_widget)(
                rect.left,
                rect.top,
                rect.right,
                rect.bottom,
                visible as c_int,
                descriptor.as_ptr(),
                container.is_none() as c_int,
                raw_of(container),
                Some(widget_trampoline),
            )
        };
        CREATING.with(|c| c.replace(prev));
        Self::adopt(raw, core)
    }

    /// A widget of one of the built-in classes. See the typed wrappers such as [`Button`].
    pub fn standard(
        class: WidgetClass,
        rect: Rect,
        visible: bool,
        descriptor: &str,
        container: Option<WidgetRef>,
    ) -> XplmResult<Self> {
        let descriptor = to_cstring(descriptor)?;
        let raw = unsafe {
            (widgets().create_widget)(
                rect.left,
                rect.top,
                rect.right,
                rect.bottom,
                visible as c_int,
                descriptor.as_ptr(),
                container.is_none() as c_int,
                raw_of(container),
                class as c_int,
            )
        };
        let widget = Self::adopt(raw, WidgetCore::new(None))?;
        unsafe { (widgets().add_widget_callback)(raw, Some(widget_trampoline)) };
        Ok(widget)
    }

    fn adopt(raw: Handle, core: Rc<WidgetCore>) -> XplmResult<Self> {
        let id = WidgetId::from_raw(raw).ok_or_else(|| XplmError::create_failed("widget"))?;
        WIDGETS.with(|r| r.borrow_mut().insert(id, core.clone()));
        Ok(Self {
            w: WidgetRef(id),
            core,
            released: false,
        })
    }

    /// Replaces the message handler. Ignored while the current handler is running.
    pub fn set_handler(&self, handler: impl FnMut(WidgetRef, &mut WidgetEvent) -> bool + 'static) {
        if let Ok(mut slot) = self.core.handler.try_borrow_mut() {
            *slot = Some(Box::new(handler));
        }
    }

    #[inline]
    pub fn behaviours(&self) -> Behaviours {
        self.core.behaviours.get()
    }

    #[inline]
    pub fn set_behaviours(&self, behaviours: Behaviours) {
        self.core.behaviours.set(behaviours);
    }

    pub fn set_drag_region(&self, region: Option<Rect>) {
        let mut b = self.behaviours();
        b.drag_region = region;
        self.set_behaviours(b);
    }

    /// `false` once the host destroyed the widget (for example together with its parent).
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.core.alive.get()
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
        if !self.core.alive.get() {
            return;
        }
        unsafe { (widgets().destroy_widget)(self.w.raw(), 0) };
        forget(self.w.0, &self.core);
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;
    use crate::text::FontId;

    type Log = Rc<RefCell<Vec<WidgetEvent>>>;

    fn recorder(consume: bool) -> (Log, impl FnMut(WidgetRef, &mut WidgetEvent) -> bool) {
        let log: Log = Rc::default();
        let sink = log.clone();
        (log, move |_, ev: &mut WidgetEvent| {
            sink.borrow_mut().push(*ev);
            consume
        })
    }

    const WINDOW: Rect = Rect::new(100, 400, 400, 100);

    #[test]
    fn custom_widget_sees_its_own_creation() {
        let _host = TestHost::new();
        let before = live_widgets();
        let (log, handler) = recorder(false);
        let w = Widget::custom(WINDOW, true, "TCAS", None, handler).unwrap();
        assert_eq!(log.borrow()[0], WidgetEvent::Create { subclass: false });
        assert!(w.is_managed());
        assert_eq!(live_widgets(), before + 1);
        assert_eq!(w.descriptor(), "TCAS");
        assert_eq!(w.geometry(), WINDOW);
    }

    #[test]
    fn messages_are_decoded_and_consumption_reported() {
        let _host = TestHost::new();
        let (log, handler) = recorder(true);
        let w = Widget::custom(WINDOW, true, "", None, handler).unwrap();
        assert!(w.send_message(WidgetMessage::PAINT, DispatchMode::Direct, 0, 0));
        assert!(w.send_message(WidgetMessage(10_042), DispatchMode::Direct, 7, 8));
        let log = log.borrow();
        assert_eq!(log[1], WidgetEvent::Paint);
        assert_eq!(
            log[2],
            WidgetEvent::Other {
                message: WidgetMessage(10_042),
                param1: 7,
                param2: 8
            }
        );
    }

    #[test]
    fn release_destroys_exactly_once() {
        let host = TestHost::new();
        let before = live_widgets();
        let (log, handler) = recorder(false);
        let w = Widget::custom(WINDOW, true, "", None, handler).unwrap();
        let id = w.id();
        w.destroy();
        assert_eq!(host.calls("XPDestroyWidget"), 1);
        assert_eq!(live_widgets(), before);
        assert!(log.borrow().contains(&WidgetEvent::Destroy { recursive: false }));
        assert!(!WidgetRef::from_id(id).is_managed());
    }

    #[test]
    fn host_side_destroy_is_not_repeated() {
        let host = TestHost::new();
        let window = Widget::custom(WINDOW, true, "", None, |_, _| false).unwrap();
        let child = Widget::custom(Rect::new(110, 390, 200, 300), true, "", Some(*window), |_, _| false).unwrap();

        host.destroy_widget_tree(window.id());
        assert!(!window.is_alive());
        assert!(!child.is_alive());
        drop(child);
        drop(window);
        assert_eq!(host.calls("XPDestroyWidget"), 0);
    }

    #[test]
    fn unknown_widgets_are_not_handled() {
        let _host = TestHost::new();
        let stray = 0x5150usize as Handle;
        let r = unsafe { widget_trampoline(WidgetMessage::PAINT.0, stray, 0, 0) };
        assert_eq!(r, 0);
    }

    #[test]
    fn tree_queries() {
        let _host = TestHost::new();
        let window = MainWindow::new(WINDOW, true, "Traffic", None).unwrap();
        let list = SubWindow::new(Rect::new(110, 390, 390, 110), true, "", Some(**window)).unwrap();
        let caption = Caption::new(Rect::new(120, 380, 200, 360), true, "TA ONLY", Some(**list)).unwrap();

        assert_eq!(window.child_count(), 1);
        assert_eq!(window.children(), vec![**list]);
        assert_eq!(caption.parent(), Some(**list));
        assert_eq!(caption.root(), Some(**window));
        assert_eq!(window.widget_for_location(150, 370, true, true), Some(**caption));
        assert_eq!(window.widget_for_location(150, 370, false, true), Some(**list));
        assert_eq!(window.widget_for_location(0, 0, true, true), None);

        caption.place_within(None);
        assert_eq!(caption.parent(), None);
        assert_eq!(list.child_count(), 0);
        caption.place_within(Some(**list));

        window.hide();
        assert!(!caption.is_visible());
        window.show();
        assert!(caption.is_visible());

        window.move_by(10, -10);
        assert_eq!(caption.geometry(), Rect::new(130, 370, 210, 350));
        assert_eq!(list.exposed_geometry(), Rect::new(120, 380, 400, 100));

        let other = MainWindow::new(Rect::new(0, 50, 50, 0), true, "", None).unwrap();
        assert!(other.is_in_front());
        caption.bring_root_to_front();
        assert!(window.is_in_front());
        assert!(!other.is_in_front());
    }

    #[test]
    fn properties_and_descriptor() {
        let _host = TestHost::new();
        let button = Button::new(Rect::new(0, 20, 80, 0), true, "RESET", None).unwrap();
        assert_eq!(button.property(props::USER_START), None);
        button.set_property(props::USER_START, -5);
        assert_eq!(button.property(props::USER_START), Some(-5));

        button.set_behavior(ButtonBehavior::CheckBox);
        button.set_state(true);
        assert_eq!(button.behavior(), Some(ButtonBehavior::CheckBox));
        assert!(button.state());
        button.set_hilited(true);
        button.set_enabled(false);
        button.set_clip(true);
        assert!(button.hilited() && button.clip() && !button.enabled());

        button.set_descriptor("RESET ALL").unwrap();
        assert_eq!(button.descriptor(), "RESET ALL");
        assert!(button.set_descriptor("a\0b").is_err());

        let field = TextField::new(Rect::new(0, 20, 80, 0), true, "1200", None).unwrap();
        field.set_selection(1, 3);
        field.set_max_characters(4);
        field.set_font(FontId::Proportional);
        assert_eq!(field.selection(), (1, 3));
        assert_eq!(field.max_characters(), 4);
        assert_eq!(field.font(), Some(FontId::Proportional));
        assert_eq!(field.style(), None);

        let bar = ScrollBar::new(Rect::new(0, 200, 16, 0), true, "", None).unwrap();
        bar.set_range(0, 100);
        bar.set_slider_position(40);
        assert_eq!((bar.range(), bar.slider_position()), ((0, 100), 40));
    }

    #[test]
    fn standard_widget_events_reach_the_handler() {
        let _host = TestHost::new();
        let button = Button::new(Rect::new(0, 20, 80, 0), true, "OK", None).unwrap();
        let (log, handler) = recorder(true);
        button.set_handler(handler);
        let raw = button.id().as_raw() as isize;
        assert!(button.send_message(WidgetMessage::PUSH_BUTTON_PRESSED, DispatchMode::UpChain, raw, 0));
        assert!(button.send_message(WidgetMessage::BUTTON_STATE_CHANGED, DispatchMode::UpChain, raw, 1));
        assert_eq!(
            *log.borrow(),
            vec![WidgetEvent::PushButtonPressed, WidgetEvent::ButtonStateChanged { state: true }]
        );
    }

    #[test]
    fn drag_region_consumes_clicks_inside_it() {
        let host = TestHost::new();
        let (log, handler) = recorder(false);
        let w = Widget::custom(WINDOW, true, "", None, handler).unwrap();
        w.set_drag_region(Some(Rect::new(100, 400, 400, 380)));
        log.borrow_mut().clear();

        assert!(host.click_widget(w.id(), 150, 390));
        assert!(!host.click_widget(w.id(), 150, 200));
        assert_eq!(host.calls("XPUDragWidget"), 2);
        assert!(matches!(log.borrow().as_slice(), [WidgetEvent::MouseDown(m)] if (m.x, m.y) == (150, 200)));
    }

    #[test]
    fn select_and_fixed_layout_behaviours() {
        let host = TestHost::new();
        let window = MainWindow::new(WINDOW, true, "", None).unwrap();
        let other = MainWindow::new(Rect::new(0, 50, 50, 0), true, "", None).unwrap();
        window.set_behaviours(Behaviours {
            select_if_needed: Some(true),
            ..Default::default()
        });
        assert!(host.click_widget(window.id(), 150, 150));
        assert!(window.is_in_front());
        assert!(!other.is_in_front());

        window.set_fixed_layout(true);
        window.set_geometry(Rect::new(100, 500, 500, 100));
        assert_eq!(host.calls("XPUFixedLayout"), 1);
    }

    #[test]
    fn keyboard_focus_and_cursor_adjust() {
        let host = TestHost::new();
        let field = TextField::new(Rect::new(0, 20, 80, 0), true, "", None).unwrap();
        assert_eq!(field.set_keyboard_focus(), Some(**field));
        assert_eq!(with_focus(), Some(**field));
        field.lose_keyboard_focus();
        assert_eq!(with_focus(), None);

        field.set_handler(|_, ev| match ev {
            WidgetEvent::CursorAdjust { cursor, .. } => {
                *cursor = CursorStatus::Hidden;
                true
            }
            _ => false,
        });
        assert_eq!(host.adjust_cursor(field.id(), 10, 10), 1);
    }

    #[test]
    fn panicking_handler_is_contained() {
        let host = TestHost::new();
        let w = Widget::custom(WINDOW, true, "", None, |_, ev| {
            if *ev == WidgetEvent::Draw {
                panic!("draw failed");
            }
            false
        })
        .unwrap();
        assert!(!w.send_message(WidgetMessage::DRAW, DispatchMode::Direct, 0, 0));
        assert!(host.debug_log().contains("panic in widget callback: draw failed"));
        assert!(w.is_managed());
    }
}
