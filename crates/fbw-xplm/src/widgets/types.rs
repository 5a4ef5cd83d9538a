//! Message codes, property ids and the structs passed through widget message parameters.

use crate::defs::{KeyFlags, VirtualKey};
use crate::handle::WidgetId;
use std::ffi::c_int;

/// `XPMouseState_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: c_int,
    pub y: c_int,
    pub button: c_int,
    pub delta: c_int,
}

/// `XPKeyState_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub key: u8,
    pub flags: c_int,
    pub vkey: u8,
}

impl KeyState {
    #[inline]
    pub fn flags(&self) -> KeyFlags {
        KeyFlags::from_bits_retain(self.flags)
    }

    #[inline]
    pub fn virtual_key(&self) -> Option<VirtualKey> {
        VirtualKey::from_raw(self.vkey)
    }
}

/// `XPWidgetGeometryChange_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WidgetGeometryChange {
    pub dx: c_int,
    pub dy: c_int,
    pub dwidth: c_int,
    pub dheight: c_int,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum DispatchMode {
    Direct = 0,
    UpChain = 1,
    Recursive = 2,
    DirectAllCallbacks = 3,
    Once = 4,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum CursorStatus {
    #[default]
    Default = 0,
    Hidden = 1,
    Arrow = 2,
    Custom = 3,
}

impl CursorStatus {
    #[inline]
    pub(crate) fn from_raw(raw: c_int) -> Self {
        match raw {
            1 => Self::Hidden,
            2 => Self::Arrow,
            3 => Self::Custom,
            _ => Self::Default,
        }
    }
}

/// Built-in widget classes of the standard widget library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum WidgetClass {
    MainWindow = 1,
    SubWindow = 2,
    Button = 3,
    TextField = 4,
    ScrollBar = 5,
    Caption = 6,
    GeneralGraphics = 7,
    Progress = 8,
}

/// Widget message code. Codes from [`USER_START`](Self::USER_START) up belong to plugins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct WidgetMessage(pub i32);

impl WidgetMessage {
    pub const NONE: Self = Self(0);
    pub const CREATE: Self = Self(1);
    pub const DESTROY: Self = Self(2);
    pub const PAINT: Self = Self(3);
    pub const DRAW: Self = Self(4);
    pub const KEY_PRESS: Self = Self(5);
    pub const KEY_TAKE_FOCUS: Self = Self(6);
    pub const KEY_LOSE_FOCUS: Self = Self(7);
    pub const MOUSE_DOWN: Self = Self(8);
    pub const MOUSE_DRAG: Self = Self(9);
    pub const MOUSE_UP: Self = Self(10);
    pub const RESHAPE: Self = Self(11);
    pub const EXPOSED_CHANGED: Self = Self(12);
    pub const ACCEPT_CHILD: Self = Self(13);
    pub const LOSE_CHILD: Self = Self(14);
    pub const ACCEPT_PARENT: Self = Self(15);
    pub const SHOWN: Self = Self(16);
    pub const HIDDEN: Self = Self(17);
    pub const DESCRIPTOR_CHANGED: Self = Self(18);
    pub const PROPERTY_CHANGED: Self = Self(19);
    pub const MOUSE_WHEEL: Self = Self(20);
    pub const CURSOR_ADJUST: Self = Self(21);
    pub const CLOSE_BUTTON_PUSHED: Self = Self(1200);
    pub const PUSH_BUTTON_PRESSED: Self = Self(1300);
    pub const BUTTON_STATE_CHANGED: Self = Self(1301);
    pub const TEXT_FIELD_CHANGED: Self = Self(1400);
    pub const SCROLL_BAR_SLIDER_POSITION_CHANGED: Self = Self(1500);
    pub const USER_START: Self = Self(10000);
}

/// Widget property ids.
pub mod props {
    pub const REFCON: i32 = 0;
    pub const DRAGGING: i32 = 1;
    pub const DRAG_X_OFF: i32 = 2;
    pub const DRAG_Y_OFF: i32 = 3;
    pub const HILITED: i32 = 4;
    pub const OBJECT: i32 = 5;
    pub const CLIP: i32 = 6;
    pub const ENABLED: i32 = 7;

    pub const MAIN_WINDOW_TYPE: i32 = 1100;
    pub const MAIN_WINDOW_HAS_CLOSE_BOXES: i32 = 1200;
    pub const SUB_WINDOW_TYPE: i32 = 1200;
    pub const BUTTON_TYPE: i32 = 1300;
    pub const BUTTON_BEHAVIOR: i32 = 1301;
    pub const BUTTON_STATE: i32 = 1302;
    pub const EDIT_FIELD_SEL_START: i32 = 1400;
    pub const EDIT_FIELD_SEL_END: i32 = 1401;
    pub const EDIT_FIELD_SEL_DRAG_START: i32 = 1402;
    pub const TEXT_FIELD_TYPE: i32 = 1403;
    pub const PASSWORD_MODE: i32 = 1404;
    pub const MAX_CHARACTERS: i32 = 1405;
    pub const SCROLL_POSITION: i32 = 1406;
    pub const FONT: i32 = 1407;
    pub const SCROLL_BAR_SLIDER_POSITION: i32 = 1500;
    pub const SCROLL_BAR_MIN: i32 = 1501;
    pub const SCROLL_BAR_MAX: i32 = 1502;
    pub const SCROLL_BAR_PAGE_AMOUNT: i32 = 1503;
    pub const SCROLL_BAR_TYPE: i32 = 1504;
    pub const CAPTION_LIT: i32 = 1600;
    pub const GENERAL_GRAPHICS_TYPE: i32 = 1700;
    pub const PROGRESS_POSITION: i32 = 1800;
    pub const PROGRESS_MIN: i32 = 1801;
    pub const PROGRESS_MAX: i32 = 1802;

    pub const USER_START: i32 = 10000;
}

/// A widget message decoded from its raw parameters.
///
/// Key presses and cursor adjustments may be modified by the handler; the change is written
/// back to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WidgetEvent {
    /// `subclass` is set when the widget was created by a subclass of the receiving class.
    Create { subclass: bool },
    Destroy { recursive: bool },
    Paint,
    Draw,
    KeyPress(KeyState),
    KeyTakeFocus { from_child: bool },
    KeyLoseFocus { taken_by_other: bool },
    MouseDown(MouseState),
    MouseDrag(MouseState),
    MouseUp(MouseState),
    Reshape { origin: Option<WidgetId>, change: WidgetGeometryChange },
    ExposedChanged,
    AcceptChild(Option<WidgetId>),
    LoseChild(Option<WidgetId>),
    AcceptParent(Option<WidgetId>),
    Shown(Option<WidgetId>),
    Hidden(Option<WidgetId>),
    DescriptorChanged,
    PropertyChanged { property: i32, value: isize },
    MouseWheel(MouseState),
    CursorAdjust { mouse: MouseState, cursor: CursorStatus },
    CloseButtonPushed,
    PushButtonPressed,
    ButtonStateChanged { state: bool },
    TextFieldChanged,
    ScrollBarSliderPositionChanged { position: isize },
    Other { message: WidgetMessage, param1: isize, param2: isize },
}

fn widget_param(p: isize) -> Option<WidgetId> {
    WidgetId::from_raw(p as *mut std::ffi::c_void)
}

/// # Safety
/// Pointer parameters must be valid for the message, as the host guarantees.
unsafe fn read<T: Copy>(p: isize) -> Option<T> {
    unsafe { (p as *const T).as_ref() }.copied()
}

impl WidgetEvent {
    /// # Safety
    /// `param1`/`param2` must be the parameters the host sent with `message`.
    pub unsafe fn decode(message: WidgetMessage, param1: isize, param2: isize) -> Self {
        let other = Self::Other {
            message,
            param1,
            param2,
        };
        let mouse = |ctor: fn(MouseState) -> Self| unsafe { read::<MouseState>(param1) }.map(ctor);
        let decoded = match message {
            WidgetMessage::CREATE => Some(Self::Create { subclass: param1 != 0 }),
            WidgetMessage::DESTROY => Some(Self::Destroy { recursive: param1 != 0 }),
            WidgetMessage::PAINT => Some(Self::Paint),
            WidgetMessage::DRAW => Some(Self::Draw),
            WidgetMessage::KEY_PRESS => unsafe { read::<KeyState>(param1) }.map(Self::KeyPress),
            WidgetMessage::KEY_TAKE_FOCUS => Some(Self::KeyTakeFocus { from_child: param1 != 0 }),
            WidgetMessage::KEY_LOSE_FOCUS => Some(Self::KeyLoseFocus { taken_by_other: param1 != 0 }),
            WidgetMessage::MOUSE_DOWN => mouse(Self::MouseDown),
            WidgetMessage::MOUSE_DRAG => mouse(Self::MouseDrag),
            WidgetMessage::MOUSE_UP => mouse(Self::MouseUp),
            WidgetMessage::RESHAPE => unsafe { read::<WidgetGeometryChange>(param2) }.map(|change| Self::Reshape {
                origin: widget_param(param1),
                change,
            }),
            WidgetMessage::EXPOSED_CHANGED => Some(Self::ExposedChanged),
            WidgetMessage::ACCEPT_CHILD => Some(Self::AcceptChild(widget_param(param1))),
            WidgetMessage::LOSE_CHILD => Some(Self::LoseChild(widget_param(param1))),
            WidgetMessage::ACCEPT_PARENT => Some(Self::AcceptParent(widget_param(param1))),
            WidgetMessage::SHOWN => Some(Self::Shown(widget_param(param1))),
            WidgetMessage::HIDDEN => Some(Self::Hidden(widget_param(param1))),
            WidgetMessage::DESCRIPTOR_CHANGED => Some(Self::DescriptorChanged),
            WidgetMessage::PROPERTY_CHANGED => Some(Self::PropertyChanged {
                property: param1 as i32,
                value: param2,
            }),
            WidgetMessage::MOUSE_WHEEL => mouse(Self::MouseWheel),
            WidgetMessage::CURSOR_ADJUST => unsafe { read::<MouseState>(param1) }.map(|mouse| Self::CursorAdjust {
                mouse,
                cursor: unsafe { read::<c_int>(param2) }
                    .map(CursorStatus::from_raw)
                    .unwrap_or_default(),
            }),
            WidgetMessage::CLOSE_BUTTON_PUSHED => Some(Self::CloseButtonPushed),
            WidgetMessage::PUSH_BUTTON_PRESSED => Some(Self::PushButtonPressed),
            WidgetMessage::BUTTON_STATE_CHANGED => Some(Self::ButtonStateChanged { state: param2 != 0 }),
            WidgetMessage::TEXT_FIELD_CHANGED => Some(Self::TextFieldChanged),
            WidgetMessage::SCROLL_BAR_SLIDER_POSITION_CHANGED => {
                Some(Self::ScrollBarSliderPositionChanged { position: param2 })
            }
            _ => None,
        };
        decoded.unwrap_or(other)
    }

    /// Copies handler changes back into the host's parameter block.
    ///
    /// # Safety
    /// Same as [`decode`](Self::decode).
    pub(crate) unsafe fn write_back(&self, param1: isize, param2: isize) {
        match *self {
            Self::KeyPress(key) => {
                if let Some(dst) = unsafe { (param1 as *mut KeyState).as_mut() } {
                    *dst = key;
                }
            }
            Self::CursorAdjust { cursor, .. } => {
                if let Some(dst) = unsafe { (param2 as *mut c_int).as_mut() } {
                    *dst = cursor as c_int;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_struct_layouts() {
        assert_eq!(std::mem::size_of::<MouseState>(), 16);
        assert_eq!(std::mem::size_of::<KeyState>(), 12);
        assert_eq!(std::mem::size_of::<WidgetGeometryChange>(), 16);
    }

    #[test]
    fn decodes_pointer_parameters() {
        let mouse = MouseState { x: 5, y: 7, button: 0, delta: 0 };
        let ev = unsafe { WidgetEvent::decode(WidgetMessage::MOUSE_DOWN, &mouse as *const _ as isize, 0) };
        assert_eq!(ev, WidgetEvent::MouseDown(mouse));

        // A missing parameter block cannot be decoded and is passed through raw.
        let ev = unsafe { WidgetEvent::decode(WidgetMessage::MOUSE_UP, 0, 0) };
        assert!(matches!(ev, WidgetEvent::Other { message: WidgetMessage::MOUSE_UP, .. }));

        let ev = unsafe { WidgetEvent::decode(WidgetMessage(10_001), 1, 2) };
        assert_eq!(
            ev,
            WidgetEvent::Other {
                message: WidgetMessage(10_001),
                param1: 1,
                param2: 2
            }
        );
    }

    #[test]
    fn cursor_choice_is_written_back() {
        let mouse = MouseState::default();
        let mut cursor: c_int = 0;
        let (p1, p2) = (&mouse as *const _ as isize, &mut cursor as *mut _ as isize);
        let mut ev = unsafe { WidgetEvent::decode(WidgetMessage::CURSOR_ADJUST, p1, p2) };
        if let WidgetEvent::CursorAdjust { cursor, .. } = &mut ev {
            *cursor = CursorStatus::Arrow;
        }
        unsafe { ev.write_back(p1, p2) };
        assert_eq!(cursor, 2);
    }

    #[test]
    fn key_state_accessors() {
        let key = KeyState {
            key: b'a',
            flags: (KeyFlags::SHIFT | KeyFlags::DOWN).bits(),
            vkey: 0x41,
        };
        assert!(key.flags().contains(KeyFlags::SHIFT));
        assert_eq!(key.virtual_key(), Some(VirtualKey::A));
    }
}
