//! Drawing of the simulator's own window and control artwork.

use crate::api::widgets;
use crate::graphics::{Rect, Size};
use std::ffi::c_int;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum WindowStyle {
    Help = 0,
    MainWindow = 1,
    SubWindow = 2,
    Screen = 3,
    ListView = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ElementStyle {
    TextField = 6,
    CheckBox = 9,
    CheckBoxLit = 10,
    WindowCloseBox = 14,
    WindowCloseBoxPressed = 15,
    PushButton = 16,
    PushButtonLit = 17,
    OilPlatform = 24,
    OilPlatformSmall = 25,
    Ship = 26,
    IlsGlideScope = 27,
    MarkerLeft = 28,
    Airport = 29,
    Waypoint = 30,
    Ndb = 31,
    Vor = 32,
    RadioTower = 33,
    AircraftCarrier = 34,
    Fire = 35,
    MarkerRight = 36,
    CustomObject = 37,
    CoolingTower = 38,
    SmokeStack = 39,
    Building = 40,
    PowerLine = 41,
    CopyButtons = 45,
    CopyButtonsWithEditingGrid = 46,
    EditingGrid = 47,
    VorWithCompassRose = 49,
    Zoomer = 51,
    TextFieldMiddle = 52,
    LittleDownArrow = 53,
    LittleUpArrow = 54,
    WindowDragBar = 61,
    WindowDragBarSmooth = 62,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum TrackStyle {
    ScrollBar = 0,
    Slider = 1,
    Progress = 2,
}

/// Button and page regions of a drawn track, in boxels along its axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackMetrics {
    pub is_vertical: bool,
    pub down_button_size: i32,
    pub down_page_size: i32,
    pub thumb_size: i32,
    pub up_page_size: i32,
    pub up_button_size: i32,
}

/// Value range and position of a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackValue {
    pub min: i32,
    pub max: i32,
    pub value: i32,
}

#[inline]
pub fn draw_window(rect: Rect, style: WindowStyle) {
    unsafe { (widgets().draw_window)(rect.left, rect.top, rect.right, rect.bottom, style as c_int) };
}

pub fn window_default_dimensions(style: WindowStyle) -> Size {
    let mut size = Size::default();
    unsafe { (widgets().get_window_default_dimensions)(style as c_int, &mut size.width, &mut size.height) };
    size
}

#[inline]
pub fn draw_element(rect: Rect, style: ElementStyle, lit: bool) {
    unsafe {
        (widgets().draw_element)(rect.left, rect.top, rect.right, rect.bottom, style as c_int, lit as c_int)
    };
}

/// Default size of an element and whether it has a lit variant.
pub fn element_default_dimensions(style: ElementStyle) -> (Size, bool) {
    let mut size = Size::default();
    let mut can_be_lit = 0;
    unsafe {
        (widgets().get_element_default_dimensions)(style as c_int, &mut size.width, &mut size.height, &mut can_be_lit)
    };
    (size, can_be_lit != 0)
}

pub fn draw_track(rect: Rect, track: TrackValue, style: TrackStyle, lit: bool) {
    unsafe {
        (widgets().draw_track)(
            rect.left,
            rect.top,
            rect.right,
            rect.bottom,
            track.min,
            track.max,
            track.value,
            style as c_int,
            lit as c_int,
        )
    };
}

/// Default thickness of a track and whether it has a lit variant.
pub fn track_default_dimensions(style: TrackStyle) -> (i32, bool) {
    let (mut width, mut can_be_lit) = (0, 0);
    unsafe { (widgets().get_track_default_dimensions)(style as c_int, &mut width, &mut can_be_lit) };
    (width, can_be_lit != 0)
}

pub fn track_metrics(rect: Rect, track: TrackValue, style: TrackStyle) -> TrackMetrics {
    let mut m = TrackMetrics::default();
    let mut vertical = 0;
    unsafe {
        (widgets().get_track_metrics)(
            rect.left,
            rect.top,
            rect.right,
            rect.bottom,
            track.min,
            track.max,
            track.value,
            style as c_int,
            &mut vertical,
            &mut m.down_button_size,
            &mut m.down_page_size,
            &mut m.thumb_size,
            &mut m.up_page_size,
            &mut m.up_button_size,
        )
    };
    m.is_vertical = vertical != 0;
    m
}
