//! Camera control.

use crate::api::{xplm, Refcon};
use crate::callback::{guard, CallbackArena, CallbackId};
use std::cell::{Cell, RefCell};
use std::ffi::c_int;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum CameraControlDuration {
    Uncontrolled = 0,
    UntilViewChanges = 1,
    Forever = 2,
}

impl CameraControlDuration {
    #[inline]
    fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(Self::Uncontrolled),
            1 => Some(Self::UntilViewChanges),
            2 => Some(Self::Forever),
            _ => None,
        }
    }
}

/// `XPLMCameraPosition_t`: local coordinates, degrees, and zoom factor.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pitch: f32,
    pub heading: f32,
    pub roll: f32,
    pub zoom: f32,
}

type Controller = RefCell<Box<dyn FnMut(Option<&mut CameraPosition>, bool) -> bool>>;

thread_local! {
    static CONTROLLERS: CallbackArena<Controller> = CallbackArena::new();
    static CURRENT: Cell<Option<CallbackId>> = const { Cell::new(None) };
}

pub(crate) fn live_controllers() -> usize {
    CONTROLLERS.with(|a| a.len())
}

unsafe extern "C" fn control_trampoline(
    position: *mut CameraPosition,
    is_losing_control: c_int,
    refcon: Refcon,
) -> c_int {
    let keep = guard("camera control", 0, || {
        let Some(ctx) = CONTROLLERS.with(|a| a.resolve(refcon)) else {
            return 0;
        };
        let Ok(mut handler) = ctx.try_borrow_mut() else {
            return 0;
        };
        let position = unsafe { position.as_mut() };
        handler(position, is_losing_control != 0) as c_int
    });
    // The host unregisters the controller on either of these.
    if keep == 0 || is_losing_control != 0 {
        release_if_current(refcon);
    }
    keep
}

fn release_if_current(refcon: Refcon) {
    let Some(id) = CallbackId::from_refcon(refcon) else {
        return;
    };
    if CURRENT.with(|c| c.get()) == Some(id) {
        CURRENT.with(|c| c.set(None));
        CONTROLLERS.with(|a| a.remove(id));
    }
}

/// Takes the camera. `handler` gets the position to fill (absent when the host is taking
/// control back) and whether control is being lost; it returns `false` to give control up.
///
/// A previous controller registered through this function is replaced.
pub fn control(
    duration: CameraControlDuration,
    handler: impl FnMut(Option<&mut CameraPosition>, bool) -> bool + 'static,
) {
    let ctx: Rc<Controller> = Rc::new(RefCell::new(Box::new(handler)));
    let id = CONTROLLERS.with(|a| a.insert(ctx));
    unsafe { (xplm().control_camera)(duration as c_int, Some(control_trampoline), id.to_refcon()) };
    // The host may have called the old controller while switching, so it is freed only now.
    if let Some(prev) = CURRENT.with(|c| c.replace(Some(id))) {
        CONTROLLERS.with(|a| a.remove(prev));
    }
}

pub fn dont_control() {
    unsafe { (xplm().dont_control_camera)() };
    if let Some(prev) = CURRENT.with(|c| c.take()) {
        CONTROLLERS.with(|a| a.remove(prev));
    }
}

/// `None` when nobody controls the camera.
pub fn is_being_controlled() -> Option<CameraControlDuration> {
    let mut duration = 0;
    let controlled = unsafe { (xplm().is_camera_being_controlled)(&mut duration) };
    if controlled == 0 {
        return None;
    }
    CameraControlDuration::from_raw(duration)
}

pub fn position() -> CameraPosition {
    let mut pos = CameraPosition::default();
    unsafe { (xplm().read_camera_position)(&mut pos) };
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn layout_matches_host_struct() {
        assert_eq!(std::mem::size_of::<CameraPosition>(), 28);
    }

    #[test]
    fn controller_writes_the_camera_each_frame() {
        let host = TestHost::new();
        let before = live_controllers();
        let mut heading = 0.0;
        control(CameraControlDuration::Forever, move |pos, losing| {
            if let Some(pos) = pos {
                heading += 10.0;
                pos.heading = heading;
                pos.zoom = 1.0;
            }
            !losing
        });
        assert_eq!(is_being_controlled(), Some(CameraControlDuration::Forever));

        host.tick_camera(false);
        host.tick_camera(false);
        assert_eq!(position().heading, 20.0);

        dont_control();
        assert_eq!(is_being_controlled(), None);
        assert_eq!(live_controllers(), before);
    }

    #[test]
    fn new_controller_replaces_the_old_context() {
        let host = TestHost::new();
        let before = live_controllers();
        control(CameraControlDuration::UntilViewChanges, |_, _| true);
        control(CameraControlDuration::UntilViewChanges, |pos, _| {
            if let Some(pos) = pos {
                pos.y = 1000.0;
            }
            true
        });
        assert_eq!(live_controllers(), before + 1);
        host.tick_camera(false);
        assert_eq!(position().y, 1000.0);
        dont_control();
        assert_eq!(live_controllers(), before);
    }

    #[test]
    fn surrendering_controller_ends_control() {
        let host = TestHost::new();
        let before = live_controllers();
        control(CameraControlDuration::Forever, |_, _| false);
        host.tick_camera(false);
        assert_eq!(is_being_controlled(), None);
        assert_eq!(live_controllers(), before);

        control(CameraControlDuration::Forever, |_, _| panic!("bad camera"));
        host.tick_camera(false);
        assert_eq!(is_being_controlled(), None);
        assert!(host.debug_log().contains("panic in camera control"));
        assert_eq!(live_controllers(), before);
        dont_control();
    }

    #[test]
    fn host_reclaiming_the_camera_frees_the_controller() {
        let host = TestHost::new();
        let before = live_controllers();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        control(CameraControlDuration::UntilViewChanges, move |_, _| {
            seen.set(seen.get() + 1);
            true
        });
        host.tick_camera(true);
        assert_eq!(calls.get(), 1);
        assert_eq!(is_being_controlled(), None);
        assert_eq!(live_controllers(), before);

        host.tick_camera(false);
        assert_eq!(calls.get(), 1);
        dont_control();
        assert_eq!(live_controllers(), before);
    }
}
