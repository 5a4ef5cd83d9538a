//! Typed wrappers for the built-in widget classes.

use super::{props, Widget, WidgetClass, WidgetRef};
use crate::error::XplmResult;
use crate::graphics::Rect;
use crate::text::FontId;
use std::ops::Deref;

macro_rules! style_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident = $value:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $value),*
        }

        impl $name {
            #[inline]
            pub fn from_raw(raw: isize) -> Option<Self> {
                match raw {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

macro_rules! standard_widget {
    ($(#[$meta:meta])* $name:ident => $class:ident) => {
        $(#[$meta])*
        pub struct $name(Widget);

        impl $name {
            pub fn new(rect: Rect, visible: bool, descriptor: &str, container: Option<WidgetRef>) -> XplmResult<Self> {
                Widget::standard(WidgetClass::$class, rect, visible, descriptor, container).map(Self)
            }

            #[inline]
            pub fn into_widget(self) -> Widget {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Widget;

            #[inline]
            fn deref(&self) -> &Widget {
                &self.0
            }
        }
    };
}

style_enum! {
    pub enum MainWindowStyle {
        MainWindow = 0,
        Translucent = 1,
    }
}

style_enum! {
    pub enum SubWindowStyle {
        SubWindow = 0,
        Screen = 2,
        ListView = 3,
    }
}

style_enum! {
    pub enum ButtonStyle {
        PushButton = 0,
        RadioButton = 1,
        WindowCloseBox = 3,
        LittleDownArrow = 5,
        LittleUpArrow = 6,
    }
}

style_enum! {
    pub enum ButtonBehavior {
        PushButton = 0,
        CheckBox = 1,
        RadioButton = 2,
    }
}

style_enum! {
    pub enum TextFieldStyle {
        EntryField = 0,
        Transparent = 3,
        Translucent = 4,
    }
}

style_enum! {
    pub enum ScrollBarStyle {
        ScrollBar = 0,
        Slider = 1,
    }
}

style_enum! {
    pub enum GeneralGraphicsStyle {
        Ship = 4,
        IlsGlideScope = 5,
        MarkerLeft = 6,
        Airport = 7,
        Ndb = 8,
        Vor = 9,
        RadioTower = 10,
        AircraftCarrier = 11,
        Fire = 12,
        MarkerRight = 13,
        CustomObject = 14,
        CoolingTower = 15,
        SmokeStack = 16,
        Building = 17,
        PowerLine = 18,
        VorWithCompassRose = 19,
        OilPlatform = 21,
        OilPlatformSmall = 22,
        WayPoint = 23,
    }
}

standard_widget!(
    /// Top-level window with optional close boxes.
    MainWindow => MainWindow
);
standard_widget!(SubWindow => SubWindow);
standard_widget!(
    /// Push button, check box or radio button depending on [`ButtonBehavior`].
    Button => Button
);
standard_widget!(TextField => TextField);
standard_widget!(
    /// Scroll bar or slider.
    ScrollBar => ScrollBar
);
standard_widget!(Caption => Caption);
standard_widget!(GeneralGraphics => GeneralGraphics);
standard_widget!(Progress => Progress);

impl MainWindow {
    pub fn style(&self) -> Option<MainWindowStyle> {
        MainWindowStyle::from_raw(self.property(props::MAIN_WINDOW_TYPE)?)
    }

    pub fn set_style(&self, style: MainWindowStyle) {
        self.set_property(props::MAIN_WINDOW_TYPE, style as isize);
    }

    pub fn has_close_boxes(&self) -> bool {
        self.flag(props::MAIN_WINDOW_HAS_CLOSE_BOXES)
    }

    pub fn set_has_close_boxes(&self, on: bool) {
        self.set_flag(props::MAIN_WINDOW_HAS_CLOSE_BOXES, on);
    }

    /// Keeps children at their offsets when the window is resized.
    pub fn set_fixed_layout(&self, on: bool) {
        let mut b = self.behaviours();
        b.fixed_layout = on;
        self.set_behaviours(b);
    }
}

impl SubWindow {
    pub fn style(&self) -> Option<SubWindowStyle> {
        SubWindowStyle::from_raw(self.property(props::SUB_WINDOW_TYPE)?)
    }

    pub fn set_style(&self, style: SubWindowStyle) {
        self.set_property(props::SUB_WINDOW_TYPE, style as isize);
    }
}

impl Button {
    pub fn style(&self) -> Option<ButtonStyle> {
        ButtonStyle::from_raw(self.property(props::BUTTON_TYPE)?)
    }

    pub fn set_style(&self, style: ButtonStyle) {
        self.set_property(props::BUTTON_TYPE, style as isize);
    }

    pub fn behavior(&self) -> Option<ButtonBehavior> {
        ButtonBehavior::from_raw(self.property(props::BUTTON_BEHAVIOR)?)
    }

    pub fn set_behavior(&self, behavior: ButtonBehavior) {
        self.set_property(props::BUTTON_BEHAVIOR, behavior as isize);
    }

    /// Checked state of check boxes and radio buttons.
    pub fn state(&self) -> bool {
        self.flag(props::BUTTON_STATE)
    }

    pub fn set_state(&self, on: bool) {
        self.set_flag(props::BUTTON_STATE, on);
    }
}

impl TextField {
    /// Selection as byte offsets `(start, end)`.
    pub fn selection(&self) -> (i32, i32) {
        (
            self.int_property(props::EDIT_FIELD_SEL_START),
            self.int_property(props::EDIT_FIELD_SEL_END),
        )
    }

    pub fn set_selection(&self, start: i32, end: i32) {
        self.set_property(props::EDIT_FIELD_SEL_START, start as isize);
        self.set_property(props::EDIT_FIELD_SEL_END, end as isize);
    }

    pub fn selection_drag_start(&self) -> i32 {
        self.int_property(props::EDIT_FIELD_SEL_DRAG_START)
    }

    pub fn set_selection_drag_start(&self, at: i32) {
        self.set_property(props::EDIT_FIELD_SEL_DRAG_START, at as isize);
    }

    pub fn style(&self) -> Option<TextFieldStyle> {
        TextFieldStyle::from_raw(self.property(props::TEXT_FIELD_TYPE)?)
    }

    pub fn set_style(&self, style: TextFieldStyle) {
        self.set_property(props::TEXT_FIELD_TYPE, style as isize);
    }

    pub fn password_mode(&self) -> bool {
        self.flag(props::PASSWORD_MODE)
    }

    pub fn set_password_mode(&self, on: bool) {
        self.set_flag(props::PASSWORD_MODE, on);
    }

    pub fn max_characters(&self) -> i32 {
        self.int_property(props::MAX_CHARACTERS)
    }

    pub fn set_max_characters(&self, n: i32) {
        self.set_property(props::MAX_CHARACTERS, n as isize);
    }

    pub fn scroll_position(&self) -> i32 {
        self.int_property(props::SCROLL_POSITION)
    }

    pub fn set_scroll_position(&self, at: i32) {
        self.set_property(props::SCROLL_POSITION, at as isize);
    }

    pub fn font(&self) -> Option<FontId> {
        match self.property(props::FONT)? {
            0 => Some(FontId::Basic),
            18 => Some(FontId::Proportional),
            _ => None,
        }
    }

    pub fn set_font(&self, font: FontId) {
        self.set_property(props::FONT, font as isize);
    }
}

impl ScrollBar {
    pub fn slider_position(&self) -> i32 {
        self.int_property(props::SCROLL_BAR_SLIDER_POSITION)
    }

    pub fn set_slider_position(&self, at: i32) {
        self.set_property(props::SCROLL_BAR_SLIDER_POSITION, at as isize);
    }

    pub fn range(&self) -> (i32, i32) {
        (
            self.int_property(props::SCROLL_BAR_MIN),
            self.int_property(props::SCROLL_BAR_MAX),
        )
    }

    pub fn set_range(&self, min: i32, max: i32) {
        self.set_property(props::SCROLL_BAR_MIN, min as isize);
        self.set_property(props::SCROLL_BAR_MAX, max as isize);
    }

    pub fn page_amount(&self) -> i32 {
        self.int_property(props::SCROLL_BAR_PAGE_AMOUNT)
    }

    pub fn set_page_amount(&self, n: i32) {
        self.set_property(props::SCROLL_BAR_PAGE_AMOUNT, n as isize);
    }

    pub fn style(&self) -> Option<ScrollBarStyle> {
        ScrollBarStyle::from_raw(self.property(props::SCROLL_BAR_TYPE)?)
    }

    pub fn set_style(&self, style: ScrollBarStyle) {
        self.set_property(props::SCROLL_BAR_TYPE, style as isize);
    }
}

impl Caption {
    pub fn lit(&self) -> bool {
        self.flag(props::CAPTION_LIT)
    }

    pub fn set_lit(&self, on: bool) {
        self.set_flag(props::CAPTION_LIT, on);
    }
}

impl GeneralGraphics {
    pub fn style(&self) -> Option<GeneralGraphicsStyle> {
        GeneralGraphicsStyle::from_raw(self.property(props::GENERAL_GRAPHICS_TYPE)?)
    }

    pub fn set_style(&self, style: GeneralGraphicsStyle) {
        self.set_property(props::GENERAL_GRAPHICS_TYPE, style as isize);
    }
}

impl Progress {
    pub fn position(&self) -> i32 {
        self.int_property(props::PROGRESS_POSITION)
    }

    pub fn set_position(&self, at: i32) {
        self.set_property(props::PROGRESS_POSITION, at as isize);
    }

    pub fn range(&self) -> (i32, i32) {
        (self.int_property(props::PROGRESS_MIN), self.int_property(props::PROGRESS_MAX))
    }

    pub fn set_range(&self, min: i32, max: i32) {
        self.set_property(props::PROGRESS_MIN, min as isize);
        self.set_property(props::PROGRESS_MAX, max as isize);
    }
}
